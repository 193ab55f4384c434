pub mod app;
pub mod config;
pub mod context;
pub mod free_play;
pub mod ipc;
pub mod melody;
pub mod memory_store;
pub mod pause;
pub mod recognition;
pub mod scheduler;
pub mod session_clock;

pub use app::*;
pub use config::*;
pub use context::*;
pub use free_play::*;
pub use ipc::*;
pub use melody::*;
pub use memory_store::*;
pub use pause::*;
pub use recognition::*;
pub use scheduler::*;
pub use session_clock::*;
