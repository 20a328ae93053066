use std::collections::{BTreeMap, HashSet};

use crate::model::QuestionRecord;

/// Shape of a loaded question bank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub total_questions: usize,
    /// Rounded to two decimals; zero for an empty bank.
    pub average_options_count: f64,
    pub questions_with_categories: usize,
    pub questions_with_explanations: usize,
}

#[must_use]
pub fn dataset_stats(questions: &[QuestionRecord]) -> DatasetStats {
    let total_questions = questions.len();
    let average_options_count = if total_questions == 0 {
        0.0
    } else {
        let options: usize = questions.iter().map(|q| q.options().len()).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = options as f64 / total_questions as f64;
        (average * 100.0).round() / 100.0
    };

    DatasetStats {
        total_questions,
        average_options_count,
        questions_with_categories: questions.iter().filter(|q| q.category().is_some()).count(),
        questions_with_explanations: questions
            .iter()
            .filter(|q| q.explanation().is_some())
            .count(),
    }
}

/// How often each option position holds the correct answer.
///
/// Records whose answer is missing from their options are left out.
#[must_use]
pub fn correct_answer_distribution(questions: &[QuestionRecord]) -> BTreeMap<usize, usize> {
    let mut distribution = BTreeMap::new();
    for index in questions.iter().filter_map(QuestionRecord::correct_index) {
        *distribution.entry(index).or_insert(0) += 1;
    }
    distribution
}

/// Positions whose question text repeats an earlier one (trimmed, case-insensitive).
#[must_use]
pub fn find_duplicate_questions(questions: &[QuestionRecord]) -> Vec<usize> {
    let mut seen = HashSet::new();
    questions
        .iter()
        .enumerate()
        .filter_map(|(position, question)| {
            let key = question.text().trim().to_lowercase();
            if seen.insert(key) {
                None
            } else {
                Some(position)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;

    fn question(id: u64, text: &str, options: &[&str], answer: &str) -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(id),
            text,
            options.iter().map(|o| (*o).to_string()).collect(),
            answer,
        )
    }

    #[test]
    fn stats_count_optional_fields() {
        let questions = vec![
            question(1, "Q1", &["A", "B"], "A").with_category("Art"),
            question(2, "Q2", &["A", "B", "C"], "C").with_explanation("why"),
            question(3, "Q3", &["A", "B", "C", "D"], "D").with_category("Art"),
        ];
        let stats = dataset_stats(&questions);
        assert_eq!(stats.total_questions, 3);
        assert!((stats.average_options_count - 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.questions_with_categories, 2);
        assert_eq!(stats.questions_with_explanations, 1);
    }

    #[test]
    fn average_is_rounded_to_two_decimals() {
        let questions = vec![
            question(1, "Q1", &["A", "B"], "A"),
            question(2, "Q2", &["A", "B"], "A"),
            question(3, "Q3", &["A", "B", "C"], "A"),
        ];
        let stats = dataset_stats(&questions);
        assert!((stats.average_options_count - 2.33).abs() < 1e-9);
    }

    #[test]
    fn empty_bank_has_zero_average() {
        let stats = dataset_stats(&[]);
        assert_eq!(stats.total_questions, 0);
        assert!(stats.average_options_count.abs() < f64::EPSILON);
    }

    #[test]
    fn distribution_by_correct_position() {
        let questions = vec![
            question(1, "Q1", &["A", "B"], "A"),
            question(2, "Q2", &["A", "B", "C"], "C"),
            question(3, "Q3", &["A", "B"], "A"),
            question(4, "Q4", &["A", "B"], "missing"),
        ];
        let distribution = correct_answer_distribution(&questions);
        assert_eq!(distribution.get(&0), Some(&2));
        assert_eq!(distribution.get(&2), Some(&1));
        assert_eq!(distribution.values().sum::<usize>(), 3);
    }

    #[test]
    fn duplicates_ignore_case_and_whitespace() {
        let questions = vec![
            question(1, "What is 2+2?", &["3", "4"], "4"),
            question(2, "Capital of France?", &["Paris", "Rome"], "Paris"),
            question(3, "  what is 2+2? ", &["4", "5"], "4"),
            question(4, "WHAT IS 2+2?", &["4", "5"], "4"),
        ];
        assert_eq!(find_duplicate_questions(&questions), vec![2, 3]);
    }
}
