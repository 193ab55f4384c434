pub mod achievements;
pub mod feedback;
pub mod hint;
pub mod points;

pub use achievements::*;
pub use feedback::*;
pub use hint::*;
pub use points::*;
