use crate::PostureErrors;
use ron::ser::{to_string_pretty, PrettyConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning shared by the collision constraints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// Largest separation a proximity query reports
    pub prediction: f64,
    /// Witness points closer than this fall back to the contact normal
    pub degenerate_tolerance: f64,
    /// Allowed deviation (1 - cos) between the witness direction and the contact normal
    pub alignment_tolerance: f64,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            prediction: 1000.0,
            degenerate_tolerance: 1e-9,
            alignment_tolerance: 1e-6,
        }
    }
}

impl CollisionSettings {
    pub fn from_ron(s: &str) -> Result<Self, PostureErrors> {
        Ok(ron::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, PostureErrors> {
        let s = std::fs::read_to_string(path)?;
        Self::from_ron(&s)
    }

    pub fn to_ron(&self) -> Result<String, PostureErrors> {
        Ok(to_string_pretty(self, PrettyConfig::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = CollisionSettings::from_ron("(prediction: 2.5)").unwrap();
        assert_eq!(settings.prediction, 2.5);
        assert_eq!(settings.degenerate_tolerance, 1e-9);

        let back = CollisionSettings::from_ron(&settings.to_ron().unwrap()).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_bad_settings() {
        assert!(matches!(
            CollisionSettings::from_ron("(prediction: \"far\")"),
            Err(PostureErrors::RonDeserialize(_))
        ));
        assert!(matches!(
            CollisionSettings::load(Path::new("/definitely/not/here.ron")),
            Err(PostureErrors::Io(_))
        ));
    }
}
