use serde::{Deserialize, Serialize};

pub mod analyzer;

pub use analyzer::Analyzer;

/// Score and confidence for one personality dimension, both in `[0, 1]`.
/// A dimension missing from storage or from an analysis response reads as
/// the neutral 0.5/0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    pub confidence: f64,
}

impl Default for DimensionScore {
    fn default() -> Self {
        Self {
            score: 0.5,
            confidence: 0.5,
        }
    }
}

impl DimensionScore {
    pub fn new(score: f64, confidence: f64) -> Self {
        Self { score, confidence }
    }
}

/// The account's learned communication style. Exactly one active profile at
/// a time; re-analysis replaces it wholesale. The dimension set is fixed so
/// readers get compile-time checking instead of an open-ended map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub humor_level: DimensionScore,
    #[serde(default)]
    pub formality: DimensionScore,
    #[serde(default)]
    pub enthusiasm: DimensionScore,
    #[serde(default)]
    pub technical_depth: DimensionScore,
    #[serde(default)]
    pub controversy_tolerance: DimensionScore,
    #[serde(default)]
    pub emoji_usage: DimensionScore,
    #[serde(default)]
    pub hashtag_usage: DimensionScore,
}

impl Profile {
    /// Fallback used when an analysis response cannot be parsed: neutral on
    /// every dimension except a conservative controversy tolerance.
    pub fn neutral() -> Self {
        Self {
            controversy_tolerance: DimensionScore::new(0.3, 0.5),
            ..Self::default()
        }
    }

    /// Dimension name/value pairs, for persistence and display.
    pub fn dimensions(&self) -> [(&'static str, DimensionScore); 7] {
        [
            ("humor_level", self.humor_level),
            ("formality", self.formality),
            ("enthusiasm", self.enthusiasm),
            ("technical_depth", self.technical_depth),
            ("controversy_tolerance", self.controversy_tolerance),
            ("emoji_usage", self.emoji_usage),
            ("hashtag_usage", self.hashtag_usage),
        ]
    }

    /// Set a dimension by its stored name. Unknown names are ignored so a
    /// database written by a newer version still loads.
    pub fn set_dimension(&mut self, name: &str, value: DimensionScore) {
        match name {
            "humor_level" => self.humor_level = value,
            "formality" => self.formality = value,
            "enthusiasm" => self.enthusiasm = value,
            "technical_depth" => self.technical_depth = value,
            "controversy_tolerance" => self.controversy_tolerance = value,
            "emoji_usage" => self.emoji_usage = value,
            "hashtag_usage" => self.hashtag_usage = value,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_neutral_on_every_dimension() {
        let profile = Profile::default();
        for (_, dim) in profile.dimensions() {
            assert!((dim.score - 0.5).abs() < f64::EPSILON);
            assert!((dim.confidence - 0.5).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn neutral_fallback_lowers_controversy_tolerance() {
        let profile = Profile::neutral();
        assert!((profile.controversy_tolerance.score - 0.3).abs() < f64::EPSILON);
        assert!((profile.humor_level.score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn set_dimension_ignores_unknown_names() {
        let mut profile = Profile::default();
        profile.set_dimension("spirit_animal", DimensionScore::new(0.9, 0.9));
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn partial_json_fills_missing_dimensions_with_defaults() {
        let profile: Profile = serde_json::from_str(
            r#"{"humor_level": {"score": 0.8, "confidence": 0.9}}"#,
        )
        .unwrap();
        assert!((profile.humor_level.score - 0.8).abs() < f64::EPSILON);
        assert!((profile.formality.score - 0.5).abs() < f64::EPSILON);
    }
}
