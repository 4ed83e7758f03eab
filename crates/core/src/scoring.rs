use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog;
use crate::model::StudentRecord;
use crate::time::hours_between;

//
// ─── RETENTION ─────────────────────────────────────────────────────────────────
//

/// Forgetting-curve decay constant, per hour since last study.
///
/// Fixed design parameter (half-life ~4.6 hours); there is no per-topic
/// variation.
pub const DECAY_RATE_PER_HOUR: f64 = 0.15;

/// Round to two decimals for display.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Retention after the given number of hours, rounded to two decimals.
#[must_use]
pub fn retention_after_hours(hours: f64) -> f64 {
    round2((-DECAY_RATE_PER_HOUR * hours).exp())
}

/// Estimated retention for a topic at `now`.
///
/// Decays exponentially from the topic's last study-log stamp; a topic that
/// was never logged counts as just studied and yields 1.0.
#[must_use]
pub fn retention(record: &StudentRecord, topic: &str, now: DateTime<Utc>) -> f64 {
    let hours = record
        .last_studied(topic)
        .map_or(0.0, |last| hours_between(last, now));
    retention_after_hours(hours)
}

//
// ─── READINESS ─────────────────────────────────────────────────────────────────
//

/// Overall readiness percentage: mean strength across tracked topics,
/// truncated to an integer. Zero when nothing is tracked; can exceed 100
/// because strengths are uncapped.
#[must_use]
pub fn readiness(record: &StudentRecord) -> u32 {
    if record.topic_strength.is_empty() {
        return 0;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean =
        record.topic_strength.values().sum::<f64>() / record.topic_strength.len() as f64;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (mean * 100.0) as u32;
    percent
}

//
// ─── BASELINE GRADING ──────────────────────────────────────────────────────────
//

/// Strength assigned for a substantive baseline answer.
const BASELINE_STRONG: f64 = 0.7;

/// Strength assigned for a thin baseline answer.
const BASELINE_WEAK: f64 = 0.3;

/// An answer counts as substantive once it has more than five characters
/// after trimming.
#[must_use]
pub fn baseline_answer_is_substantive(answer: &str) -> bool {
    answer.trim().chars().count() > 5
}

/// Initial strength a baseline answer earns its topic.
#[must_use]
pub fn baseline_strength(answer: &str) -> f64 {
    if baseline_answer_is_substantive(answer) {
        BASELINE_STRONG
    } else {
        BASELINE_WEAK
    }
}

//
// ─── RANKING ───────────────────────────────────────────────────────────────────
//

/// Study-plan priority label derived from a topic's strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// High below 0.4, Medium below 0.7, Low otherwise.
    #[must_use]
    pub fn for_strength(strength: f64) -> Self {
        if strength < 0.4 {
            Self::High
        } else if strength < 0.7 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic with its current strength, as returned by [`rank_weakest`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTopic {
    pub topic: String,
    pub strength: f64,
}

/// The `n` weakest tracked topics, ascending by strength.
///
/// Equal strengths order by catalog position so the ranking is stable;
/// topics outside the catalog sort after it, by name.
#[must_use]
pub fn rank_weakest(record: &StudentRecord, n: usize) -> Vec<RankedTopic> {
    let mut ranked: Vec<RankedTopic> = record
        .topic_strength
        .iter()
        .map(|(topic, strength)| RankedTopic {
            topic: topic.clone(),
            strength: *strength,
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.strength
            .partial_cmp(&b.strength)
            .unwrap_or(Ordering::Equal)
            .then_with(|| tie_break(&a.topic).cmp(&tie_break(&b.topic)))
    });
    ranked.truncate(n);
    ranked
}

fn tie_break(topic: &str) -> (usize, &str) {
    (catalog::topic_position(topic).unwrap_or(usize::MAX), topic)
}

/// The single weakest tracked topic, if any are tracked. Drives the
/// adaptive quiz.
#[must_use]
pub fn weakest_topic(record: &StudentRecord) -> Option<String> {
    rank_weakest(record, 1).into_iter().next().map(|r| r.topic)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
