//! Front end for QPRO quantified circuits.
//!
//! [`parse_qpro`] reads a circuit into an [`ir::Problem`]; [`read_interest`]
//! loads the variables that should come out as free variables.

mod cursor;
mod error;
mod interest;
mod qpro;

pub use cursor::LineCursor;
pub use error::ParseError;
pub use interest::{read_interest, Interest};
pub use qpro::{parse_qpro, ParseOptions, DEFAULT_MAX_DEPTH};
