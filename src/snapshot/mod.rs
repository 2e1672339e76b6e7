pub mod types;
pub mod builder;

pub use types::*;
pub use builder::*;
