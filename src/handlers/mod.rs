pub mod diagnostics;
pub mod health;
pub mod upload;

pub use diagnostics::*;
pub use health::*;
pub use upload::*;
