//! Record types shared by the coordinator and its callers.

use chrono::{DateTime, Utc};

// =============================================================================
// Threat Subtype
// =============================================================================

/// Encoded marker for landing-page malware in threat-entry metadata.
const LANDING_MARKER: &str = "TEFORElORw";
/// Encoded marker for malware-distribution sites in threat-entry metadata.
const DISTRIBUTION_MARKER: &str = "RElTVFJJQlVUSU9O";

/// Malware subtype carried in a match's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatSubtype {
    Landing,
    Distribution,
}

impl ThreatSubtype {
    /// Recognize a subtype from an encoded metadata value.
    /// Unknown markers yield `None`. Distribution wins if both markers appear.
    pub fn from_metadata_value(value: &str) -> Option<Self> {
        if value.contains(DISTRIBUTION_MARKER) {
            Some(Self::Distribution)
        } else if value.contains(LANDING_MARKER) {
            Some(Self::Landing)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landing => "MALWARE LANDING",
            Self::Distribution => "MALWARE DISTRIBUTION",
        }
    }
}

// =============================================================================
// Match Record
// =============================================================================

/// Output column headers, in row order.
pub const RECORD_HEADER: [&str; 7] = [
    "URL",
    "Full Hash",
    "Partial Hash",
    "UTC Time Stamp",
    "Match Type",
    "Match Metadata",
    "Platform",
];

/// Time stamp layout used in output rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One output row: a confirmed match, a residual, or an unresolvable input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Source URL (empty when the service returned an unknown hash)
    pub url: String,
    /// Full hash, base64
    pub full_hash: String,
    /// Prefix, base64
    pub partial_hash: String,
    pub timestamp: DateTime<Utc>,
    pub threat_type: String,
    pub threat_subtype: Option<ThreatSubtype>,
    pub platform_type: String,
}

impl MatchRecord {
    /// A submitted hash that the service never confirmed.
    pub fn residual(
        url: String,
        full_hash: String,
        partial_hash: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            url,
            full_hash,
            partial_hash,
            timestamp,
            threat_type: String::new(),
            threat_subtype: None,
            platform_type: String::new(),
        }
    }

    /// Best-effort row for input that could not be canonicalized.
    pub fn unresolved(url: &str, timestamp: DateTime<Utc>) -> Self {
        Self::residual(url.to_string(), String::new(), String::new(), timestamp)
    }

    /// True when the service attached a threat to this record.
    pub fn is_match(&self) -> bool {
        !self.threat_type.is_empty()
    }

    /// Render as a row in [`RECORD_HEADER`] order.
    pub fn to_row(&self) -> [String; 7] {
        [
            self.url.clone(),
            self.full_hash.clone(),
            self.partial_hash.clone(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.threat_type.clone(),
            self.threat_subtype
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            self.platform_type.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_subtype_markers() {
        assert_eq!(
            ThreatSubtype::from_metadata_value("TEFORElORw=="),
            Some(ThreatSubtype::Landing)
        );
        assert_eq!(
            ThreatSubtype::from_metadata_value("RElTVFJJQlVUSU9O"),
            Some(ThreatSubtype::Distribution)
        );
        assert_eq!(ThreatSubtype::from_metadata_value("U09DSUFM"), None);
        assert_eq!(ThreatSubtype::from_metadata_value(""), None);
    }

    #[test]
    fn test_subtype_distribution_wins() {
        assert_eq!(
            ThreatSubtype::from_metadata_value("TEFORElORw RElTVFJJQlVUSU9O"),
            Some(ThreatSubtype::Distribution)
        );
    }

    #[test]
    fn test_to_row() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let record = MatchRecord {
            url: "http://evil.example/".to_string(),
            full_hash: "FULL".to_string(),
            partial_hash: "PART".to_string(),
            timestamp: ts,
            threat_type: "MALWARE".to_string(),
            threat_subtype: Some(ThreatSubtype::Landing),
            platform_type: "ANY_PLATFORM".to_string(),
        };
        assert_eq!(
            record.to_row(),
            [
                "http://evil.example/",
                "FULL",
                "PART",
                "2024-03-09 07:05:01.000000",
                "MALWARE",
                "MALWARE LANDING",
                "ANY_PLATFORM",
            ]
            .map(String::from)
        );
        assert!(record.is_match());
    }

    #[test]
    fn test_unresolved_is_not_a_match() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = MatchRecord::unresolved("http:///", ts);
        assert_eq!(record.url, "http:///");
        assert!(record.full_hash.is_empty());
        assert!(!record.is_match());
    }
}
