//! Tabular ingestion: line tokenizing, field normalizing, row building and
//! whole-dataset parsing.

mod normalizer;
mod parser;
mod record;
mod tokenizer;

pub use normalizer::normalize_field;
pub use parser::{DatasetParser, ParseReport, RejectedRow, parse_dataset};
pub use record::{PLACEHOLDER_OPTION, REQUIRED_COLUMNS, RowRejection, build_record};
pub use tokenizer::tokenize_line;

/// Character that opens and closes a quoted field.
pub const QUOTE: char = '"';

/// Default field separator of the source table.
pub const DEFAULT_SEPARATOR: char = ',';
