//! Addresses and dense arena indices shared by every phase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LeakPathError;

/// Opaque identity of an object in a captured graph.
///
/// The value is a platform pointer or handle and is never dereferenced; it only
/// serves as a lookup key within one capture.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub u64);

/// Dense index of a node within one capture.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeIdx(pub u32);

/// Dense index of an edge within one capture, in arrival order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeIdx(pub u32);

/// Largest number of nodes, and of edges, one capture can hold.
///
/// Indices are `u32` and `u32::MAX` is reserved as a search sentinel.
pub const MAX_ARENA_LEN: usize = u32::MAX as usize;

fn arena_slot(len: usize, what: &str) -> u32 {
    match u32::try_from(len) {
        Ok(slot) if slot < u32::MAX => slot,
        _ => panic!("capture exceeds {MAX_ARENA_LEN} {what}"),
    }
}

impl NodeIdx {
    /// Index of the next node in an arena already holding `len` nodes.
    ///
    /// # Panics
    ///
    /// Panics when `len` has reached [`MAX_ARENA_LEN`].
    pub(crate) fn next(len: usize) -> Self {
        Self(arena_slot(len, "nodes"))
    }

    /// Returns the index as a `usize` suitable for slice access.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl EdgeIdx {
    /// Index of the next edge in an arena already holding `len` edges.
    ///
    /// # Panics
    ///
    /// Panics when `len` has reached [`MAX_ARENA_LEN`].
    pub(crate) fn next(len: usize) -> Self {
        Self(arena_slot(len, "edges"))
    }

    /// Returns the index as a `usize` suitable for slice access.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = LeakPathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(Address)
            .map_err(|_| LeakPathError::InvalidAddress(raw.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = LeakPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value)
    }
}
