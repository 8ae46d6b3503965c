//! Lookup wire format and the service seam
//!
//! Requests carry base64 hash prefixes plus static client / threat metadata.
//! Responses list zero or more matches, each naming a full hash.

use serde::{Deserialize, Serialize};

use crate::hash::Prefix;

/// Default lookup server.
pub const DEFAULT_SERVER_URL: &str = "https://safebrowsing.googleapis.com";

/// Path of the full-hash lookup method.
pub const FULL_HASHES_PATH: &str = "/v4/fullHashes:find";

/// Error type for lookup exchanges.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("lookup service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Performs one lookup exchange. Blocking; no implicit retries expected.
pub trait LookupService {
    fn find_full_hashes(
        &mut self,
        request: &FindFullHashesRequest,
    ) -> Result<FindFullHashesResponse, LookupError>;
}

impl<S: LookupService + ?Sized> LookupService for Box<S> {
    fn find_full_hashes(
        &mut self,
        request: &FindFullHashesRequest,
    ) -> Result<FindFullHashesResponse, LookupError> {
        (**self).find_full_hashes(request)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Static request metadata attached to every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_version: String,
    pub threat_types: Vec<String>,
    pub platform_types: Vec<String>,
    pub threat_entry_types: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: "NSRG".to_string(),
            client_version: "1.0".to_string(),
            threat_types: [
                "MALWARE",
                "SOCIAL_ENGINEERING",
                "UNWANTED_SOFTWARE",
                "POTENTIALLY_HARMFUL_APPLICATION",
                "THREAT_TYPE_UNSPECIFIED",
            ]
            .map(String::from)
            .to_vec(),
            platform_types: vec!["ANY_PLATFORM".to_string()],
            threat_entry_types: vec!["URL".to_string()],
        }
    }
}

impl ClientConfig {
    /// Build a request for a batch of prefixes, preserving their order.
    pub fn request(&self, prefixes: &[Prefix]) -> FindFullHashesRequest {
        FindFullHashesRequest {
            client: ClientInfo {
                client_id: self.client_id.clone(),
                client_version: self.client_version.clone(),
            },
            client_states: Vec::new(),
            threat_info: ThreatInfo {
                threat_types: self.threat_types.clone(),
                platform_types: self.platform_types.clone(),
                threat_entry_types: self.threat_entry_types.clone(),
                threat_entries: prefixes
                    .iter()
                    .map(|prefix| ThreatEntry {
                        hash: prefix.to_base64(),
                    })
                    .collect(),
            },
            api_client: ApiClient {},
        }
    }
}

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindFullHashesRequest {
    pub client: ClientInfo,
    pub client_states: Vec<String>,
    pub threat_info: ThreatInfo,
    pub api_client: ApiClient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    pub client_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatInfo {
    pub threat_types: Vec<String>,
    pub platform_types: Vec<String>,
    pub threat_entry_types: Vec<String>,
    pub threat_entries: Vec<ThreatEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEntry {
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiClient {}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindFullHashesResponse {
    #[serde(default)]
    pub matches: Vec<ThreatMatch>,
    pub minimum_wait_duration: Option<String>,
    pub negative_cache_duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    pub threat_type: Option<String>,
    pub platform_type: Option<String>,
    pub threat_entry_type: Option<String>,
    pub threat: Option<ThreatEntry>,
    pub threat_entry_metadata: Option<ThreatEntryMetadata>,
    pub cache_duration: Option<String>,
}

impl ThreatMatch {
    /// Base64 full hash named by this match, or `""` if absent.
    pub fn full_hash(&self) -> &str {
        self.threat.as_ref().map(|t| t.hash.as_str()).unwrap_or("")
    }

    /// Value of the first metadata entry, which carries the subtype marker.
    pub fn subtype_marker(&self) -> Option<&str> {
        self.threat_entry_metadata
            .as_ref()?
            .entries
            .first()?
            .value
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThreatEntryMetadata {
    #[serde(default)]
    pub entries: Vec<MetadataEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataEntry {
    pub key: Option<String>,
    pub value: Option<String>,
}
