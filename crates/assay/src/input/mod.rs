//! Input parsing and data source handling.

mod parser;
mod source;

pub use parser::{CsvMode, InputFormat, Parser, ParserConfig, parse_json_bytes};
pub use source::{Cell, DataTable, SourceMetadata, parse_number};
