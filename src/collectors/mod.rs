/// Access-log tail collector
pub mod tail;

pub use tail::{decode_line, TailCollector};
