pub mod har;
pub mod reader;

pub use har::{HarEntry, HarRequest};
pub use reader::{LogReader, WRAPPER_FIELDS};
