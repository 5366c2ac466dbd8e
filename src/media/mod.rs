//! Work items and their input formats.

pub mod item;
pub mod parser;

pub use item::{ContentType, WorkItem};
pub use parser::{load_work_items, parse_work_items, ParsedInput};
