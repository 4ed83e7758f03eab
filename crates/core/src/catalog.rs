//! Built-in subject catalog.
//!
//! Read-only reference data: the Grade 9 subjects with their topics, and a
//! one-line simple explanation per topic for offline use. Topic names act as
//! keys throughout the student record, so lookups here are by exact name.

/// Subjects with their topics, in catalog order.
pub const SUBJECT_TOPICS: &[(&str, &[&str])] = &[
    ("math", &["linear equations", "algebra", "ratio"]),
    ("biology", &["cells", "photosynthesis", "respiration"]),
    ("chemistry", &["states of matter", "separation of mixtures"]),
    ("physics", &["force", "energy", "motion"]),
    ("geography", &["weather", "climate"]),
];

/// Offline one-liners per topic.
const SIMPLE_EXPLANATIONS: &[(&str, &str)] = &[
    (
        "linear equations",
        "A linear equation has power of x as 1. Example: 2x + 3 = 7.",
    ),
    ("algebra", "Algebra uses letters to represent numbers."),
    ("ratio", "Ratio compares two quantities."),
    ("cells", "Cells are the basic units of life."),
    ("photosynthesis", "Plants use sunlight to make food."),
    ("respiration", "Respiration releases energy from food."),
    ("states of matter", "Matter exists as solid, liquid, or gas."),
    (
        "separation of mixtures",
        "Mixtures can be separated by filtration or evaporation.",
    ),
    ("force", "A force is a push or pull."),
    ("energy", "Energy is the ability to do work."),
    ("motion", "Motion is a change in position."),
    ("weather", "Weather is daily atmospheric condition."),
    ("climate", "Climate is average weather over long time."),
];

/// Iterate every topic in catalog order, across all subjects.
pub fn all_topics() -> impl Iterator<Item = &'static str> {
    SUBJECT_TOPICS
        .iter()
        .flat_map(|(_, topics)| topics.iter().copied())
}

/// Position of a topic in catalog order, if it is a catalog topic.
///
/// Used as the ranking tie-break so equal strengths order the way the
/// catalog lists them.
#[must_use]
pub fn topic_position(topic: &str) -> Option<usize> {
    all_topics().position(|candidate| candidate == topic)
}

/// Whether the catalog knows this topic.
#[must_use]
pub fn contains_topic(topic: &str) -> bool {
    topic_position(topic).is_some()
}

/// The simple offline explanation for a topic, if it is a catalog topic.
#[must_use]
pub fn simple_explanation(topic: &str) -> Option<&'static str> {
    SIMPLE_EXPLANATIONS
        .iter()
        .find(|(candidate, _)| *candidate == topic)
        .map(|(_, text)| *text)
}
