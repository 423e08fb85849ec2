//! Tone rotation.
//!
//! The tone of a variant depends only on how many variants were finalized
//! before it, so revision loops never shift the rotation.

use serde::{Deserialize, Serialize};

use super::error::CampaignError;
use crate::core::DEFAULT_TONES;

/// Ordered, non-empty list of tone labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ToneRotation {
    tones: Vec<String>,
}

impl ToneRotation {
    /// Create a rotation, rejecting empty lists and blank labels.
    pub fn new(tones: Vec<String>) -> Result<Self, CampaignError> {
        if tones.is_empty() {
            return Err(CampaignError::InvalidInput("at least one tone is required".to_string()));
        }
        if tones.iter().any(|t| t.trim().is_empty()) {
            return Err(CampaignError::InvalidInput("tone labels must not be empty".to_string()));
        }
        Ok(Self { tones })
    }

    /// Tone for the variant at `index` (0-based, counted over finalized variants).
    pub fn tone_for(&self, index: usize) -> &str {
        &self.tones[index % self.tones.len()]
    }

    pub fn first(&self) -> &str {
        self.tone_for(0)
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tones.iter().map(String::as_str)
    }

    /// Total variants a run must finalize, saturating at `usize::MAX`.
    pub fn quota(&self, variants_per_tone: usize) -> usize {
        variants_per_tone.saturating_mul(self.tones.len())
    }

    /// Total variants, or `None` when the product does not fit in `usize`.
    pub fn checked_quota(&self, variants_per_tone: usize) -> Option<usize> {
        variants_per_tone.checked_mul(self.tones.len())
    }
}

impl Default for ToneRotation {
    fn default() -> Self {
        Self { tones: DEFAULT_TONES.iter().map(|t| t.to_string()).collect() }
    }
}

impl TryFrom<Vec<String>> for ToneRotation {
    type Error = CampaignError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToneRotation> for Vec<String> {
    fn from(value: ToneRotation) -> Self {
        value.tones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation(tones: &[&str]) -> ToneRotation {
        ToneRotation::new(tones.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_round_robin() {
        let tones = rotation(&["warm", "urgent", "playful"]);
        let picked: Vec<&str> = (0..7).map(|i| tones.tone_for(i)).collect();
        assert_eq!(picked, ["warm", "urgent", "playful", "warm", "urgent", "playful", "warm"]);
    }

    #[test]
    fn test_quota() {
        assert_eq!(rotation(&["a", "b"]).quota(3), 6);
        assert_eq!(ToneRotation::default().quota(1), 6);
    }

    #[test]
    fn test_quota_overflow() {
        let tones = rotation(&["a", "b"]);
        assert_eq!(tones.checked_quota(usize::MAX), None);
        assert_eq!(tones.quota(usize::MAX), usize::MAX);
        assert_eq!(tones.checked_quota(4), Some(8));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(ToneRotation::new(vec![]).is_err());
        assert!(ToneRotation::new(vec!["ok".to_string(), " ".to_string()]).is_err());
    }

    #[test]
    fn test_default_starts_friendly() {
        assert_eq!(ToneRotation::default().first(), "friendly and conversational");
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<ToneRotation>("[]").is_err());
        let tones: ToneRotation = serde_json::from_str(r#"["calm"]"#).unwrap();
        assert_eq!(tones.first(), "calm");
    }
}
