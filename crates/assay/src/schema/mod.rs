//! Schema types describing analyzed columns.

mod column;
mod types;

pub use column::{ColumnProfile, ParameterMatch, Statistics};
pub(crate) use column::round_to;
pub use types::{ColumnType, ValueRange};
