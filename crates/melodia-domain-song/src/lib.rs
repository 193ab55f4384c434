pub mod catalog;
pub mod keyboard;
pub mod model;

pub use catalog::*;
pub use keyboard::*;
pub use model::*;
