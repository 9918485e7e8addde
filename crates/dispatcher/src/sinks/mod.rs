//! Sink implementations

mod csv;
mod log;

pub use self::csv::{CSV_HEADER, CsvSink};
pub use self::log::LogSink;
