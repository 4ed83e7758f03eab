use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::warn;

use revise_core::model::{QuizGrade, StudentRecord};
use revise_core::scoring::{self, Priority};
use revise_core::{catalog, Clock};
use storage::StudentRepository;

use crate::connectivity::ConnectivityProbe;
use crate::error::ValidationError;

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentInfo {
    pub username: String,
    pub baseline_done: bool,
    pub readiness_score: u32,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStatus {
    pub topic: String,
    pub strength: f64,
    pub retention: f64,
    pub mistakes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub online: bool,
    pub readiness_score: u32,
    pub topics: Vec<TopicStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineOutcome {
    pub readiness_score: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizFeedback {
    pub correct: bool,
    pub explanation: String,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub topic: String,
    pub strength: f64,
    pub retention: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub explanation: String,
    pub online: bool,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Number of entries in a study plan.
const STUDY_PLAN_SIZE: usize = 5;

/// Number of topics in an exam prediction.
const EXAM_PREDICTION_SIZE: usize = 3;

/// Coordinates the student record, its persistence, and the connectivity
/// probe behind one operation per external request.
///
/// Owns the single in-memory record for the session behind a mutex, so
/// concurrent callers serialize into last-writer-wins updates rather than
/// interleaving partial mutations. The record loads once at construction
/// and is rewritten to the store after every mutating operation; a failed
/// save is logged and swallowed, leaving the in-memory record
/// authoritative for the rest of the process.
pub struct ProgressService {
    clock: Clock,
    store: Arc<dyn StudentRepository>,
    probe: Arc<dyn ConnectivityProbe>,
    record: Mutex<StudentRecord>,
}

impl ProgressService {
    /// Load the persisted record and assemble the service around it.
    pub async fn new(
        clock: Clock,
        store: Arc<dyn StudentRepository>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        let record = store.load().await;
        Self {
            clock,
            store,
            probe,
            record: Mutex::new(record),
        }
    }

    /// Current reachability, re-probed on every call.
    pub async fn is_online(&self) -> bool {
        self.probe.is_online().await
    }

    pub async fn student_info(&self) -> StudentInfo {
        let record = self.record.lock().await;
        StudentInfo {
            username: record.username.clone(),
            baseline_done: record.baseline_done,
            readiness_score: scoring::readiness(&record),
            online: self.probe.is_online().await,
        }
    }

    /// Run the one-time baseline assessment over the submitted answers.
    ///
    /// # Errors
    ///
    /// `BaselineAlreadyCompleted` on resubmission, `NoAnswersProvided` for
    /// an empty answer map.
    pub async fn submit_baseline(
        &self,
        answers: &BTreeMap<String, String>,
    ) -> Result<BaselineOutcome, ValidationError> {
        let mut record = self.record.lock().await;
        let readiness_score = record.apply_baseline(answers)?;
        self.persist(&record).await;

        Ok(BaselineOutcome {
            readiness_score,
            message: format!("Baseline completed! Initial readiness: {readiness_score}%"),
        })
    }

    pub async fn dashboard(&self) -> DashboardView {
        let record = self.record.lock().await;
        let now = self.clock.now();

        let topics = record
            .topic_strength
            .iter()
            .map(|(topic, strength)| TopicStatus {
                topic: topic.clone(),
                strength: scoring::round2(*strength),
                retention: scoring::retention(&record, topic, now),
                mistakes: record.mistake_count(topic),
            })
            .collect();

        DashboardView {
            online: self.probe.is_online().await,
            readiness_score: scoring::readiness(&record),
            topics,
        }
    }

    /// Grade a quiz answer for a tracked topic.
    ///
    /// # Errors
    ///
    /// `NoTopicsTracked` before any topic has a strength, `UnknownTopic`
    /// when the topic is absent from the record.
    pub async fn submit_quiz(
        &self,
        topic: &str,
        answer: &str,
    ) -> Result<QuizFeedback, ValidationError> {
        let mut record = self.record.lock().await;
        if !record.has_topics() {
            return Err(ValidationError::NoTopicsTracked);
        }

        let topic = topic.trim();
        if topic.is_empty() || record.strength(topic).is_none() {
            return Err(ValidationError::UnknownTopic(topic.to_string()));
        }

        let grade = record.apply_quiz_answer(topic, answer, self.clock.now());
        self.persist(&record).await;
        drop(record);

        let online = self.probe.is_online().await;
        let explanation = match grade {
            QuizGrade::Correct => "Great understanding!".to_string(),
            QuizGrade::Empty => "Empty answer. Try again!".to_string(),
            QuizGrade::Incorrect => {
                format!("Not quite right. {}", self.corrective_text(topic, online))
            }
        };

        Ok(QuizFeedback {
            correct: grade.is_correct(),
            explanation,
            online,
        })
    }

    /// The ranked study plan: up to five weakest topics with priorities.
    ///
    /// # Errors
    ///
    /// `NoTopicsTracked` before any topic has a strength.
    pub async fn study_plan(&self) -> Result<Vec<PlanEntry>, ValidationError> {
        let record = self.record.lock().await;
        if !record.has_topics() {
            return Err(ValidationError::NoTopicsTracked);
        }

        let now = self.clock.now();
        Ok(scoring::rank_weakest(&record, STUDY_PLAN_SIZE)
            .into_iter()
            .map(|ranked| PlanEntry {
                retention: scoring::retention(&record, &ranked.topic, now),
                priority: Priority::for_strength(ranked.strength),
                strength: scoring::round2(ranked.strength),
                topic: ranked.topic,
            })
            .collect())
    }

    /// The three topics most likely to need exam attention.
    ///
    /// # Errors
    ///
    /// `NoTopicsTracked` before any topic has a strength.
    pub async fn exam_prediction(&self) -> Result<Vec<String>, ValidationError> {
        let record = self.record.lock().await;
        if !record.has_topics() {
            return Err(ValidationError::NoTopicsTracked);
        }

        Ok(scoring::rank_weakest(&record, EXAM_PREDICTION_SIZE)
            .into_iter()
            .map(|ranked| ranked.topic)
            .collect())
    }

    /// Explain a topic, picking the online or offline variant by probing.
    ///
    /// # Errors
    ///
    /// `EmptyTopic` when the trimmed topic is empty.
    pub async fn explain(&self, topic: &str) -> Result<Explanation, ValidationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }

        let online = self.probe.is_online().await;
        let explanation = if online {
            advanced_explanation(topic)
        } else {
            simple_explanation(topic)
        };

        Ok(Explanation {
            explanation,
            online,
        })
    }

    /// Append a journal entry.
    ///
    /// # Errors
    ///
    /// `EmptyReflection` when the trimmed entry is empty.
    pub async fn add_reflection(&self, entry: &str) -> Result<(), ValidationError> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(ValidationError::EmptyReflection);
        }

        let mut record = self.record.lock().await;
        record.add_reflection(entry, self.clock.now());
        self.persist(&record).await;
        Ok(())
    }

    /// Replace the record with a fresh default and persist it.
    pub async fn reset(&self) {
        let mut record = self.record.lock().await;
        *record = StudentRecord::new();
        self.persist(&record).await;
    }

    /// The weakest tracked topic, used by the adaptive quiz prompt.
    pub async fn weakest_topic(&self) -> Option<String> {
        let record = self.record.lock().await;
        scoring::weakest_topic(&record)
    }

    /// Snapshot of the current record, for adapters that render it raw.
    pub async fn record(&self) -> StudentRecord {
        self.record.lock().await.clone()
    }

    fn corrective_text(&self, topic: &str, online: bool) -> String {
        if online {
            format!("Advanced tip for {topic}: this is a deeper concept related to fundamental principles.")
        } else {
            format!(
                "Simple explanation: {}",
                catalog::simple_explanation(topic).unwrap_or("Topic not found in database.")
            )
        }
    }

    async fn persist(&self, record: &StudentRecord) {
        if let Err(err) = self.store.save(record).await {
            warn!("could not save student data, keeping in-memory record: {err}");
        }
    }
}

fn advanced_explanation(topic: &str) -> String {
    format!(
        "Advanced explanation for {topic}: this topic involves deeper principles and real-world applications."
    )
}

fn simple_explanation(topic: &str) -> String {
    catalog::simple_explanation(topic)
        .unwrap_or("Topic not found in database.")
        .to_string()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
