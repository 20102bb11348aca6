//! Leak candidates handed over by the leaked-window registry.

use std::io::Read;

use serde::Deserialize;

use crate::types::Address;
use crate::Result;

/// An object suspected to have outlived its expected lifetime.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct LeakCandidate {
    /// Identity of the leaked object in the captured graph.
    pub address: Address,
    /// Test the leak is attributed to.
    pub test: String,
    /// Registry serial of the leaked window, used when the graph lacks the object.
    #[serde(default)]
    pub serial: Option<u64>,
    /// Timing metadata passed through to the record.
    #[serde(default)]
    pub time: Option<u64>,
}

impl LeakCandidate {
    /// Creates a candidate with no serial or timing metadata.
    pub fn new(address: Address, test: impl Into<String>) -> Self {
        Self {
            address,
            test: test.into(),
            serial: None,
            time: None,
        }
    }

    pub(crate) fn serial_desc(&self) -> String {
        match self.serial {
            Some(serial) => format!("serial={serial}"),
            None => "serial=unknown".to_string(),
        }
    }
}

/// Parses a JSON array of candidates.
pub fn load_candidates<R: Read>(reader: R) -> Result<Vec<LeakCandidate>> {
    Ok(serde_json::from_reader(reader)?)
}
