//! Proposal store
//!
//! Append-only, sequence-numbered collection of pending authorization changes.
//! Sequence numbers start at 0 and are never reused, even after removal.

use crate::address::Address;
use crate::errors::{AccessControlError, Result};
use crate::roles::{Role, RoleConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deferred authorization change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Role to grant or revoke
    pub role: Role,
    /// `Some` grants the role with this config, `None` revokes it
    pub value: Option<RoleConfig>,
    /// Admin that created the proposal
    pub proposer: Address,
    /// Creation timestamp in milliseconds
    pub created_at_ms: u64,
}

impl Proposal {
    pub fn is_grant(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalStore {
    pending: BTreeMap<u64, Proposal>,
    next_seq: u64,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Insert a proposal and return its sequence number
    pub fn insert(&mut self, proposal: Proposal) -> u64 {
        let seq = self.next_seq;
        self.pending.insert(seq, proposal);
        self.next_seq += 1;
        seq
    }

    pub fn remove(&mut self, seq: u64) -> Result<Proposal> {
        self.pending
            .remove(&seq)
            .ok_or(AccessControlError::ProposalNotFound { seq })
    }

    pub fn get(&self, seq: u64) -> Result<&Proposal> {
        self.pending
            .get(&seq)
            .ok_or(AccessControlError::ProposalNotFound { seq })
    }

    /// Number of pending proposals
    pub fn count(&self) -> usize {
        self.pending.len()
    }

    /// Pending proposals in sequence order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Proposal)> {
        self.pending.iter().map(|(seq, proposal)| (*seq, proposal))
    }
}
