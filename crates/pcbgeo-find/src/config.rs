use pcbgeo_core::Coord;
use serde::{Deserialize, Serialize};

/// Tuning for connectivity and clearance computations on a [`Board`](crate::Board).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindConfig {
    /// Extra distance added to every intersection test. Negative values
    /// require objects to overlap by at least that much.
    pub bloat: Coord,
    /// Number of clearing lines united before each subtraction from a polygon.
    pub clear_batch_size: usize,
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            bloat: 0,
            clear_batch_size: 20,
        }
    }
}

impl FindConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = FindConfig::default();
        assert_eq!(cfg.bloat, 0);
        assert_eq!(cfg.clear_batch_size, 20);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = FindConfig::from_json(r#"{ "bloat": 150 }"#).unwrap();
        assert_eq!(cfg.bloat, 150);
        assert_eq!(cfg.clear_batch_size, 20);
    }

    #[test]
    fn test_json_roundtrip() {
        let cfg = FindConfig {
            bloat: -20,
            clear_batch_size: 5,
        };
        let back = FindConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }
}
