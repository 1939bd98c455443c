//! Relevance weights: one independent multiplier per scoring signal.
//!
//! Weights are a plain value. Callers build a new snapshot when the user
//! saves settings and pass it by reference into every scoring call; the
//! engine never keeps one.

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RelevanceWeights {
    #[serde(default = "default_title")]
    pub title: f64,
    #[serde(default = "default_content")]
    pub content: f64,
    #[serde(default = "default_tags")]
    pub tags: f64,
    #[serde(default = "default_attendees")]
    pub attendees: f64,
    #[serde(default = "default_flex_search_bonus")]
    pub flex_search_bonus: f64,
    #[serde(default = "default_recency_bonus")]
    pub recency_bonus: f64,
}

fn default_title() -> f64 {
    0.4
}
fn default_content() -> f64 {
    0.3
}
fn default_tags() -> f64 {
    0.2
}
fn default_attendees() -> f64 {
    0.3
}
fn default_flex_search_bonus() -> f64 {
    0.2
}
fn default_recency_bonus() -> f64 {
    0.1
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            title: default_title(),
            content: default_content(),
            tags: default_tags(),
            attendees: default_attendees(),
            flex_search_bonus: default_flex_search_bonus(),
            recency_bonus: default_recency_bonus(),
        }
    }
}

impl RelevanceWeights {
    /// Every weight set to zero. Handy as a base when isolating one signal.
    pub fn zero() -> Self {
        Self {
            title: 0.0,
            content: 0.0,
            tags: 0.0,
            attendees: 0.0,
            flex_search_bonus: 0.0,
            recency_bonus: 0.0,
        }
    }

    /// Field name and value pairs, in the order the settings UI shows them.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("title", self.title),
            ("content", self.content),
            ("tags", self.tags),
            ("attendees", self.attendees),
            ("flex_search_bonus", self.flex_search_bonus),
            ("recency_bonus", self.recency_bonus),
        ]
    }

    /// Rejects NaN and anything outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ContextError> {
        for (field, value) in self.entries() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ContextError::InvalidWeights { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RelevanceWeights::default().validate().is_ok());
        assert!(RelevanceWeights::zero().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        let w = RelevanceWeights {
            tags: 1.5,
            ..RelevanceWeights::default()
        };
        match w.validate() {
            Err(ContextError::InvalidWeights { field, value }) => {
                assert_eq!(field, "tags");
                assert!((value - 1.5).abs() < 1e-9);
            }
            other => panic!("expected InvalidWeights, got {:?}", other),
        }
    }

    #[test]
    fn rejects_nan() {
        let w = RelevanceWeights {
            recency_bonus: f64::NAN,
            ..RelevanceWeights::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_per_field() {
        let w: RelevanceWeights = toml::from_str("title = 0.9\nrecency_bonus = 0.0").unwrap();
        assert!((w.title - 0.9).abs() < 1e-9);
        assert_eq!(w.recency_bonus, 0.0);
        assert!((w.content - default_content()).abs() < 1e-9);
        assert!((w.attendees - default_attendees()).abs() < 1e-9);
    }
}
