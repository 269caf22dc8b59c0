//! Participant-role metadata from the engine's `metadata.json`.

use crate::stream::StreamError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Agent type string for market makers.
pub const MARKET_MAKER: &str = "MarketMaker";
/// Agent type string for informed traders.
pub const INFORMED_TRADER: &str = "InformedTrader";
/// Agent type string for noise traders.
pub const NOISE_TRADER: &str = "NoiseTrader";
/// Counterparty type reported when an id is absent from the metadata.
pub const UNKNOWN: &str = "Unknown";

/// One agent record from the metadata file. Types outside the recognized
/// set are carried through and reported as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Participant id.
    pub client_id: u64,
    /// Agent type string.
    #[serde(rename = "type")]
    pub agent_type: String,
}

#[derive(Debug, Deserialize)]
struct MetadataFile {
    agents: Vec<AgentRecord>,
}

/// Lookup table from participant id to agent type.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    agents: HashMap<u64, String>,
}

impl AgentDirectory {
    /// Build a directory from already-parsed records.
    #[must_use]
    pub fn from_agents(records: Vec<AgentRecord>) -> Self {
        Self {
            agents: records
                .into_iter()
                .map(|r| (r.client_id, r.agent_type))
                .collect(),
        }
    }

    /// Load and parse `metadata.json`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid JSON with an
    /// `agents` list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StreamError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        let file: MetadataFile =
            serde_json::from_str(&raw).map_err(|err| StreamError::Json {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        Ok(Self::from_agents(file.agents))
    }

    /// Agent type of one participant, if present.
    #[must_use]
    pub fn agent_type(&self, client_id: u64) -> Option<&str> {
        self.agents.get(&client_id).map(String::as_str)
    }

    /// Agent type of one participant, with the `Unknown` fallback applied.
    #[must_use]
    pub fn agent_type_or_unknown(&self, client_id: u64) -> &str {
        self.agent_type(client_id).unwrap_or(UNKNOWN)
    }

    /// All market-maker ids, ascending.
    #[must_use]
    pub fn market_makers(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .agents
            .iter()
            .filter(|(_, t)| t.as_str() == MARKET_MAKER)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// True when the id appears in the metadata.
    #[must_use]
    pub fn contains(&self, client_id: u64) -> bool {
        self.agents.contains_key(&client_id)
    }

    /// Number of agents listed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True for an empty agents list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
