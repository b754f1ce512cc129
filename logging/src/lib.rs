mod logging;

pub use crate::logging::Logger;
