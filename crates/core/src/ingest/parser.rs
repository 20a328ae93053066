use tracing::{debug, info};

use super::{DEFAULT_SEPARATOR, RowRejection, build_record, normalize_field, tokenize_line};
use crate::model::QuestionRecord;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// A source row that did not become a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub row: u64,
    pub reason: RowRejection,
}

/// Accepted records in row order, plus every row the builder turned down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub records: Vec<QuestionRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Turns the full text of a question table into question records.
///
/// The first line is always the header. Blank lines are skipped and ids are
/// the line positions, so they keep gaps left by skipped or rejected rows.
#[derive(Debug, Clone, Copy)]
pub struct DatasetParser {
    separator: char,
}

impl Default for DatasetParser {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl DatasetParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Parse `text`, silently dropping rows that cannot become a question.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<QuestionRecord> {
        self.parse_with_report(text).records
    }

    /// Parse `text` and keep the reason for every dropped row.
    #[must_use]
    pub fn parse_with_report(&self, text: &str) -> ParseReport {
        let text = text.trim_start_matches(BYTE_ORDER_MARK).trim();
        let mut report = ParseReport::default();

        for (position, line) in text.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let row = position as u64;
            let fields: Vec<String> = tokenize_line(line, self.separator)
                .iter()
                .map(|token| normalize_field(token))
                .collect();

            match build_record(&fields, row) {
                Ok(record) => report.records.push(record),
                Err(reason) => {
                    debug!(row, %reason, "skipping question row");
                    report.rejected.push(RejectedRow { row, reason });
                }
            }
        }

        info!(
            accepted = report.records.len(),
            rejected = report.rejected.len(),
            "parsed question table"
        );
        report
    }
}

/// Parse a comma-separated question table with the default settings.
#[must_use]
pub fn parse_dataset(text: &str) -> Vec<QuestionRecord> {
    DatasetParser::default().parse(text)
}
