use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Violations of the student-record invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("baseline already completed")]
    BaselineAlreadyCompleted,
    #[error("no answers provided")]
    NoAnswersProvided,
}

//
// ─── CONSTANTS ─────────────────────────────────────────────────────────────────
//

/// Display label used when the record never captured a name.
pub const DEFAULT_USERNAME: &str = "Student";

/// Strength floor; no mistake can push a topic below this.
const MIN_STRENGTH: f64 = 0.1;

/// Strength assumed for a topic the record has never graded, used as the
/// subtraction base when the first thing that happens to it is a mistake.
/// Deliberately distinct from the baseline-assigned 0.3/0.7.
const UNSEEN_STRENGTH: f64 = 0.5;

/// Strength deducted per registered mistake.
const MISTAKE_PENALTY: f64 = 0.1;

/// Strength awarded for a correct quiz answer. Uncapped.
const CORRECT_REWARD: f64 = 0.05;

//
// ─── REFLECTION ENTRY ──────────────────────────────────────────────────────────
//

/// One journal entry: what the student found hard, and when they wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub entry: String,
    pub timestamp: DateTime<Utc>,
}

impl ReflectionEntry {
    #[must_use]
    pub fn new(entry: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            entry: entry.into(),
            timestamp,
        }
    }
}

//
// ─── QUIZ GRADE ────────────────────────────────────────────────────────────────
//

/// How a quiz answer was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizGrade {
    /// Answer mentioned the topic; strength increased.
    Correct,
    /// Answer was blank after trimming; counted as a mistake but the study
    /// log is left untouched.
    Empty,
    /// Answer missed the topic; counted as a mistake and the topic's
    /// study-log timestamp moved to now.
    Incorrect,
}

impl QuizGrade {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

//
// ─── STUDENT RECORD ────────────────────────────────────────────────────────────
//

/// The single persisted student record.
///
/// Field names match the JSON document on disk. Topic names key every map;
/// nothing here validates them against the catalog — presentation adapters
/// do existence checks before calling in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub baseline_done: bool,
    #[serde(default)]
    pub topic_strength: BTreeMap<String, f64>,
    #[serde(default)]
    pub mistakes: BTreeMap<String, u32>,
    /// Unix seconds of the last incorrect answer per topic.
    #[serde(default)]
    pub study_log: BTreeMap<String, i64>,
    #[serde(default)]
    pub reflections: Vec<ReflectionEntry>,
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

impl Default for StudentRecord {
    fn default() -> Self {
        Self {
            username: default_username(),
            baseline_done: false,
            topic_strength: BTreeMap::new(),
            mistakes: BTreeMap::new(),
            study_log: BTreeMap::new(),
            reflections: Vec::new(),
        }
    }
}

impl StudentRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any topic has been graded yet.
    #[must_use]
    pub fn has_topics(&self) -> bool {
        !self.topic_strength.is_empty()
    }

    /// Current strength for a topic, if graded.
    #[must_use]
    pub fn strength(&self, topic: &str) -> Option<f64> {
        self.topic_strength.get(topic).copied()
    }

    /// Mistake count for a topic (zero when never missed).
    #[must_use]
    pub fn mistake_count(&self, topic: &str) -> u32 {
        self.mistakes.get(topic).copied().unwrap_or(0)
    }

    /// When the topic was last answered incorrectly, if ever.
    #[must_use]
    pub fn last_studied(&self, topic: &str) -> Option<DateTime<Utc>> {
        self.study_log
            .get(topic)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(*secs, 0))
    }

    /// Count a mistake against a topic and lower its strength.
    ///
    /// A topic never graded before starts from the unseen base of 0.5;
    /// strength never drops below 0.1.
    pub fn register_mistake(&mut self, topic: &str) {
        *self.mistakes.entry(topic.to_string()).or_insert(0) += 1;

        let current = self
            .topic_strength
            .get(topic)
            .copied()
            .unwrap_or(UNSEEN_STRENGTH);
        self.topic_strength
            .insert(topic.to_string(), (current - MISTAKE_PENALTY).max(MIN_STRENGTH));
    }

    /// Seed topic strengths from the baseline assessment answers.
    ///
    /// Each answer grades independently (0.7 for a substantive answer, 0.3
    /// otherwise). Returns the initial readiness percentage: the share of
    /// substantive answers over the submitted set, truncated to an integer.
    ///
    /// # Errors
    ///
    /// - `BaselineAlreadyCompleted` once `baseline_done` is set; the gate is
    ///   monotonic.
    /// - `NoAnswersProvided` for an empty answer map.
    pub fn apply_baseline(
        &mut self,
        answers: &BTreeMap<String, String>,
    ) -> Result<u32, ProgressError> {
        if self.baseline_done {
            return Err(ProgressError::BaselineAlreadyCompleted);
        }
        if answers.is_empty() {
            return Err(ProgressError::NoAnswersProvided);
        }

        let mut substantive = 0u32;
        for (topic, answer) in answers {
            if scoring::baseline_answer_is_substantive(answer) {
                substantive += 1;
            }
            self.topic_strength
                .insert(topic.clone(), scoring::baseline_strength(answer));
        }

        self.baseline_done = true;

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let readiness = (f64::from(substantive) / answers.len() as f64 * 100.0) as u32;
        Ok(readiness)
    }

    /// Judge a quiz answer for a topic and update the record accordingly.
    ///
    /// An answer counts as correct when it mentions the topic name
    /// (case-insensitive substring). Correct answers add 0.05 strength with
    /// no upper cap; incorrect ones register a mistake, and non-empty
    /// incorrect ones also stamp the study log with `now`.
    pub fn apply_quiz_answer(
        &mut self,
        topic: &str,
        answer: &str,
        now: DateTime<Utc>,
    ) -> QuizGrade {
        let answer = answer.trim().to_lowercase();

        if answer.is_empty() {
            self.register_mistake(topic);
            return QuizGrade::Empty;
        }

        if answer.contains(&topic.to_lowercase()) {
            *self
                .topic_strength
                .entry(topic.to_string())
                .or_insert(UNSEEN_STRENGTH) += CORRECT_REWARD;
            QuizGrade::Correct
        } else {
            self.register_mistake(topic);
            self.study_log.insert(topic.to_string(), now.timestamp());
            QuizGrade::Incorrect
        }
    }

    /// Append a journal entry.
    pub fn add_reflection(&mut self, entry: impl Into<String>, now: DateTime<Utc>) {
        self.reflections.push(ReflectionEntry::new(entry, now));
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn approx(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(topic, answer)| (topic.to_string(), answer.to_string()))
            .collect()
    }

    #[test]
    fn fresh_record_has_documented_defaults() {
        let record = StudentRecord::new();
        assert_eq!(record.username, DEFAULT_USERNAME);
        assert!(!record.baseline_done);
        assert!(!record.has_topics());
        assert!(record.mistakes.is_empty());
        assert!(record.study_log.is_empty());
        assert!(record.reflections.is_empty());
    }

    #[test]
    fn mistake_lowers_strength_and_counts() {
        let mut record = StudentRecord::new();
        record.topic_strength.insert("force".into(), 0.7);

        record.register_mistake("force");

        assert!(approx(record.strength("force").unwrap(), 0.6));
        assert_eq!(record.mistake_count("force"), 1);
    }

    #[test]
    fn mistake_on_unseen_topic_starts_from_half() {
        let mut record = StudentRecord::new();
        record.register_mistake("energy");
        assert!(approx(record.strength("energy").unwrap(), 0.4));
    }

    #[test]
    fn strength_never_drops_below_floor() {
        let mut record = StudentRecord::new();
        record.topic_strength.insert("ratio".into(), 0.15);

        for _ in 0..10 {
            record.register_mistake("ratio");
        }

        assert!(approx(record.strength("ratio").unwrap(), 0.1));
        assert_eq!(record.mistake_count("ratio"), 10);
    }

    #[test]
    fn baseline_grades_per_answer_and_reports_share() {
        let mut record = StudentRecord::new();
        let readiness = record
            .apply_baseline(&answers(&[
                ("cells", "cells are the building blocks of life"),
                ("ratio", "ok"),
            ]))
            .unwrap();

        assert!(record.baseline_done);
        assert!(approx(record.strength("cells").unwrap(), 0.7));
        assert!(approx(record.strength("ratio").unwrap(), 0.3));
        assert_eq!(readiness, 50);
    }

    #[test]
    fn baseline_rejects_repeat_and_empty_submissions() {
        let mut record = StudentRecord::new();
        assert_eq!(
            record.apply_baseline(&BTreeMap::new()),
            Err(ProgressError::NoAnswersProvided)
        );

        record
            .apply_baseline(&answers(&[("cells", "cells are alive")]))
            .unwrap();
        assert_eq!(
            record.apply_baseline(&answers(&[("cells", "again")])),
            Err(ProgressError::BaselineAlreadyCompleted)
        );
    }

    #[test]
    fn quiz_correct_adds_reward_without_cap() {
        let mut record = StudentRecord::new();
        record.topic_strength.insert("cells".into(), 1.0);

        let grade = record.apply_quiz_answer("cells", "Cells are tiny", fixed_now());

        assert_eq!(grade, QuizGrade::Correct);
        assert!(approx(record.strength("cells").unwrap(), 1.05));
        assert_eq!(record.mistake_count("cells"), 0);
        assert!(record.last_studied("cells").is_none());
    }

    #[test]
    fn quiz_match_is_case_insensitive() {
        let mut record = StudentRecord::new();
        record.topic_strength.insert("force".into(), 0.5);

        let grade = record.apply_quiz_answer("force", "A FORCE is a push", fixed_now());
        assert_eq!(grade, QuizGrade::Correct);
    }

    #[test]
    fn quiz_empty_answer_counts_mistake_without_study_stamp() {
        let mut record = StudentRecord::new();
        record.topic_strength.insert("motion".into(), 0.5);

        let grade = record.apply_quiz_answer("motion", "   ", fixed_now());

        assert_eq!(grade, QuizGrade::Empty);
        assert_eq!(record.mistake_count("motion"), 1);
        assert!(approx(record.strength("motion").unwrap(), 0.4));
        assert!(record.last_studied("motion").is_none());
    }

    #[test]
    fn quiz_wrong_answer_stamps_study_log() {
        let mut record = StudentRecord::new();
        record.topic_strength.insert("climate".into(), 0.5);
        let now = fixed_now();

        let grade = record.apply_quiz_answer("climate", "no idea", now);

        assert_eq!(grade, QuizGrade::Incorrect);
        assert_eq!(record.mistake_count("climate"), 1);
        assert!(approx(record.strength("climate").unwrap(), 0.4));
        assert_eq!(record.last_studied("climate"), Some(now));
    }

    #[test]
    fn reflections_keep_entry_and_timestamp() {
        let mut record = StudentRecord::new();
        let now = fixed_now();
        record.add_reflection("ratios were hard", now);

        assert_eq!(record.reflections.len(), 1);
        assert_eq!(record.reflections[0].entry, "ratios were hard");
        assert_eq!(record.reflections[0].timestamp, now);
    }

    #[test]
    fn partial_documents_deserialize_with_defaults() {
        // Records written by older builds lack the username field.
        let record: StudentRecord = serde_json::from_str(
            r#"{"baseline_done": true, "topic_strength": {"cells": 0.7}}"#,
        )
        .unwrap();

        assert_eq!(record.username, DEFAULT_USERNAME);
        assert!(record.baseline_done);
        assert!(record.has_topics());
    }
}
