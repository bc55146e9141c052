use serde::{Deserialize, Serialize};

/// Per-asset entry thresholds supplied by the trade-filter collaborator.
///
/// Upstream configs have used several spellings for the same fields over
/// time ("long"/"short", "long_entry"/"short_entry", "long_thr"/"short_thr");
/// all of them deserialize into the same structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Go LONG when prob_up is at or above this value.
    #[serde(alias = "long", alias = "long_thr")]
    pub long_entry: f64,
    /// Go SHORT when prob_up is at or below this value.
    #[serde(alias = "short", alias = "short_thr")]
    pub short_entry: f64,
    /// Optional free-text annotation shown in the report appendix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RuleThresholds {
    pub fn new(long_entry: f64, short_entry: f64) -> Self {
        RuleThresholds {
            long_entry,
            short_entry,
            note: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_canonical_names() {
        let r: RuleThresholds =
            serde_json::from_str(r#"{"long_entry": 0.6, "short_entry": 0.4, "note": "index"}"#)
                .unwrap();
        assert_eq!(r.long_entry, 0.6);
        assert_eq!(r.short_entry, 0.4);
        assert_eq!(r.note.as_deref(), Some("index"));
    }

    #[test]
    fn test_deserialize_short_aliases() {
        let r: RuleThresholds = serde_json::from_str(r#"{"long": 0.55, "short": 0.45}"#).unwrap();
        assert_eq!(r.long_entry, 0.55);
        assert_eq!(r.short_entry, 0.45);
        assert!(r.note.is_none());
    }

    #[test]
    fn test_deserialize_thr_aliases() {
        let r: RuleThresholds =
            serde_json::from_str(r#"{"long_thr": 0.7, "short_thr": 0.3}"#).unwrap();
        assert_eq!(r.long_entry, 0.7);
        assert_eq!(r.short_entry, 0.3);
    }
}
