// crates/core/src/lib.rs
pub mod result;
pub mod types;

pub use result::*;
pub use types::*;
