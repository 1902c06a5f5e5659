// crates/nlu/src/lib.rs
pub mod interpret;
pub mod parse;
pub mod validate;

pub use interpret::{booking_reply, Interpreter};
pub use parse::extract_json_object;
pub use validate::RequestValidator;
