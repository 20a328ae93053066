use thiserror::Error;

use crate::model::{QuestionId, QuestionRecord};

/// Option value that stands for "no such option".
pub const PLACEHOLDER_OPTION: &str = "none";

/// Question text, four option slots and the correct index.
pub const REQUIRED_COLUMNS: usize = 6;

const OPTION_SLOTS: usize = 4;
const CORRECT_INDEX_COLUMN: usize = 5;
const CATEGORY_COLUMN: usize = 6;
const EXPLANATION_COLUMN: usize = 7;

/// Why a source row did not produce a question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RowRejection {
    #[error("expected at least 6 columns, found {found}")]
    TooFewColumns { found: usize },

    #[error("only {valid} usable options, need at least 2")]
    TooFewOptions { valid: usize },

    #[error("correct answer index {raw:?} is not a number")]
    UnparseableIndex { raw: String },

    #[error("correct answer index {index} does not point at an option slot")]
    IndexOutOfRange { index: i64 },

    #[error("correct answer slot {index} is empty")]
    EmptyAnswer { index: usize },

    #[error("correct answer slot {index} is a placeholder")]
    PlaceholderAnswer { index: usize },
}

fn is_placeholder(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(PLACEHOLDER_OPTION)
}

fn is_usable_option(value: &str) -> bool {
    !value.trim().is_empty() && !is_placeholder(value)
}

/// Leading-integer parse: optional sign, then digits, anything after is ignored.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let value = rest[..digits_len].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

fn optional_column(fields: &[String], column: usize) -> Option<&str> {
    fields
        .get(column)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Build a question from the normalized fields of source row `row`.
///
/// The correct index points into the four raw option slots, while the stored
/// options are the usable subset of those slots. A correct index that lands on
/// a blank or placeholder slot therefore rejects the row.
///
/// # Errors
///
/// Returns `RowRejection` describing the first rule the row breaks.
pub fn build_record(fields: &[String], row: u64) -> Result<QuestionRecord, RowRejection> {
    if fields.len() < REQUIRED_COLUMNS {
        return Err(RowRejection::TooFewColumns {
            found: fields.len(),
        });
    }

    let raw_options = &fields[1..=OPTION_SLOTS];
    let valid_options: Vec<String> = raw_options
        .iter()
        .filter(|option| is_usable_option(option))
        .cloned()
        .collect();
    if valid_options.len() < 2 {
        return Err(RowRejection::TooFewOptions {
            valid: valid_options.len(),
        });
    }

    let raw_index = &fields[CORRECT_INDEX_COLUMN];
    let index = parse_leading_int(raw_index).ok_or_else(|| RowRejection::UnparseableIndex {
        raw: raw_index.clone(),
    })?;
    let slot = usize::try_from(index)
        .ok()
        .filter(|slot| *slot < OPTION_SLOTS)
        .ok_or(RowRejection::IndexOutOfRange { index })?;

    let correct_answer = &raw_options[slot];
    if correct_answer.trim().is_empty() {
        return Err(RowRejection::EmptyAnswer { index: slot });
    }
    if is_placeholder(correct_answer) {
        return Err(RowRejection::PlaceholderAnswer { index: slot });
    }

    let mut record = QuestionRecord::new(
        QuestionId::new(row),
        fields[0].clone(),
        valid_options,
        correct_answer.clone(),
    );
    if let Some(category) = optional_column(fields, CATEGORY_COLUMN) {
        record = record.with_category(category);
    }
    if let Some(explanation) = optional_column(fields, EXPLANATION_COLUMN) {
        record = record.with_explanation(explanation);
    }
    Ok(record)
}
