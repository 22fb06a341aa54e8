use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Score used whenever the model gives no usable well-being judgment.
pub const DEFAULT_WELLBEING_SCORE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub post_id: String,
    #[serde(default)]
    pub post: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub timeline_id: String,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl Timeline {
    /// All post texts joined by a blank line, in timeline order.
    pub fn joined_text(&self) -> String {
        self.posts
            .iter()
            .map(|p| p.post.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAnalysis {
    pub adaptive_evidence: Vec<String>,
    pub maladaptive_evidence: Vec<String>,
    pub summary: String,
    #[serde(rename = "well-being score")]
    pub wellbeing_score: u8,
}

impl Default for PostAnalysis {
    fn default() -> Self {
        Self {
            adaptive_evidence: Vec::new(),
            maladaptive_evidence: Vec::new(),
            summary: String::new(),
            wellbeing_score: DEFAULT_WELLBEING_SCORE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineAnalysis {
    pub timeline_level: TimelineSummary,
    pub post_level: BTreeMap<String, PostAnalysis>,
}

/// Final output document: `timeline_id -> analysis`.
pub type Submission = BTreeMap<String, TimelineAnalysis>;

/// Counters collected while a pipeline runs, written next to the submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub timelines: usize,
    pub posts: usize,
    pub queries: usize,
    pub exhausted_queries: usize,
    pub skipped_files: usize,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_analysis_uses_submission_key_names() {
        let analysis = PostAnalysis {
            adaptive_evidence: vec!["I went for a walk".to_string()],
            maladaptive_evidence: vec![],
            summary: "Mostly adaptive".to_string(),
            wellbeing_score: 7,
        };

        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["well-being score"], 7);
        assert!(value.get("wellbeing_score").is_none());
        assert_eq!(value["adaptive_evidence"][0], "I went for a walk");
    }

    #[test]
    fn test_timeline_accepts_numeric_ids_and_missing_text() {
        let timeline: Timeline = serde_json::from_value(serde_json::json!({
            "timeline_id": 42,
            "posts": [{"post_id": 7, "date": "2020-01-01"}]
        }))
        .unwrap();

        assert_eq!(timeline.timeline_id, "42");
        assert_eq!(timeline.posts[0].post_id, "7");
        assert_eq!(timeline.posts[0].post, "");
    }

    #[test]
    fn test_joined_text_separates_posts_with_blank_line() {
        let timeline = Timeline {
            timeline_id: "t1".to_string(),
            posts: vec![
                Post {
                    post_id: "p1".to_string(),
                    post: "first".to_string(),
                },
                Post {
                    post_id: "p2".to_string(),
                    post: "second".to_string(),
                },
            ],
        };
        assert_eq!(timeline.joined_text(), "first\n\nsecond");
    }
}
