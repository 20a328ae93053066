//! Read-only views over the question bank: text search plus a known/unknown filter.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use quiz_core::model::{QuestionId, QuestionRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowseFilter {
    #[default]
    All,
    Known,
    Unknown,
}

impl BrowseFilter {
    fn admits(self, known: bool) -> bool {
        match self {
            BrowseFilter::All => true,
            BrowseFilter::Known => known,
            BrowseFilter::Unknown => !known,
        }
    }
}

impl fmt::Display for BrowseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrowseFilter::All => "all",
            BrowseFilter::Known => "known",
            BrowseFilter::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterError(String);

impl fmt::Display for ParseFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter {:?} (expected all, known or unknown)", self.0)
    }
}

impl std::error::Error for ParseFilterError {}

impl FromStr for BrowseFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "known" | "marked" => Ok(Self::Known),
            "unknown" | "unmarked" => Ok(Self::Unknown),
            _ => Err(ParseFilterError(s.to_string())),
        }
    }
}

/// One question as shown in the browser list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseEntry<'a> {
    /// Position in the full question list, usable as a quiz start index.
    pub position: usize,
    pub question: &'a QuestionRecord,
    pub known: bool,
}

/// Number of questions each filter would show under the current search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowseCounts {
    pub all: usize,
    pub known: usize,
    pub unknown: usize,
}

/// Case-insensitive substring match on the question text. Blank search matches everything.
#[must_use]
pub fn matches_search(question: &QuestionRecord, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    needle.is_empty() || question.text().to_lowercase().contains(&needle)
}

#[must_use]
pub fn browse<'a>(
    questions: &'a [QuestionRecord],
    known: &HashSet<QuestionId>,
    search: &str,
    filter: BrowseFilter,
) -> Vec<BrowseEntry<'a>> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, question)| matches_search(question, search))
        .map(|(position, question)| BrowseEntry {
            position,
            question,
            known: known.contains(&question.id()),
        })
        .filter(|entry| filter.admits(entry.known))
        .collect()
}

#[must_use]
pub fn browse_counts(
    questions: &[QuestionRecord],
    known: &HashSet<QuestionId>,
    search: &str,
) -> BrowseCounts {
    let mut counts = BrowseCounts::default();
    for question in questions.iter().filter(|q| matches_search(q, search)) {
        counts.all += 1;
        if known.contains(&question.id()) {
            counts.known += 1;
        } else {
            counts.unknown += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64, text: &str) -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(id),
            text,
            vec!["A".into(), "B".into()],
            "A",
        )
    }

    fn bank() -> Vec<QuestionRecord> {
        vec![
            question(1, "Capital of France?"),
            question(2, "Largest ocean?"),
            question(4, "Capital of Italy?"),
        ]
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let q = question(1, "Capital of France?");
        assert!(matches_search(&q, "  CAPITAL "));
        assert!(matches_search(&q, ""));
        assert!(!matches_search(&q, "ocean"));
    }

    #[test]
    fn browse_combines_search_and_filter() {
        let questions = bank();
        let known = HashSet::from([QuestionId::new(4)]);

        let all = browse(&questions, &known, "capital", BrowseFilter::All);
        let positions: Vec<usize> = all.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 2]);
        assert!(all[1].known);

        let known_only = browse(&questions, &known, "capital", BrowseFilter::Known);
        assert_eq!(known_only.len(), 1);
        assert_eq!(known_only[0].question.id(), QuestionId::new(4));

        let unknown = browse(&questions, &known, "", BrowseFilter::Unknown);
        let ids: Vec<u64> = unknown.iter().map(|e| e.question.id().value()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn counts_follow_search() {
        let questions = bank();
        let known = HashSet::from([QuestionId::new(1), QuestionId::new(2)]);

        assert_eq!(
            browse_counts(&questions, &known, ""),
            BrowseCounts {
                all: 3,
                known: 2,
                unknown: 1
            }
        );
        assert_eq!(
            browse_counts(&questions, &known, "capital"),
            BrowseCounts {
                all: 2,
                known: 1,
                unknown: 1
            }
        );
    }

    #[test]
    fn filter_parses_from_str() {
        assert_eq!("Known".parse::<BrowseFilter>(), Ok(BrowseFilter::Known));
        assert_eq!("unmarked".parse::<BrowseFilter>(), Ok(BrowseFilter::Unknown));
        assert_eq!("all".parse::<BrowseFilter>(), Ok(BrowseFilter::All));
        assert!("some".parse::<BrowseFilter>().is_err());
        assert_eq!(BrowseFilter::Unknown.to_string(), "unknown");
    }
}
