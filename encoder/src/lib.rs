//! CQBF back end: renders an [`ir::Problem`] as CQBF text and reads it back.

mod error;
mod reader;
mod writer;

pub use error::CqbfError;
pub use reader::read_cqbf;
pub use writer::{to_cqbf_string, write_cqbf};
