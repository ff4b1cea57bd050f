//! Notifications emitted by a guarded asset
//!
//! Emission is fire-and-forget: sinks cannot fail an operation.

use crate::address::Address;
use crate::roles::{Role, RoleKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetEvent {
    RoleGranted { role: Role, by: Address },
    RoleRevoked { role: Role, by: Address },
    ProposalCreated { seq: u64, role: Role, grant: bool, proposer: Address },
    ProposalExecuted { seq: u64, role: Role, by: Address },
    ProposalRejected { seq: u64, role: Role, by: Address },
    Paused { kind: RoleKind, by: Address },
    Unpaused { kind: RoleKind, by: Address },
    Minted { minter: Address, recipient: Address, amount: u64 },
    Burned { burner: Address, amount: u64 },
    AddressFrozen { address: Address, by: Address },
    AddressUnfrozen { address: Address, by: Address },
    VersionMigrated { from: u64, to: u64, by: Address },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: AssetEvent);
}

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: AssetEvent) {
        info!(target: "asset_control::events", ?event, "Asset event");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: AssetEvent) {}
}

/// Buffers events in memory (for tests and simulation)
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<AssetEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events
    pub fn events(&self) -> Vec<AssetEvent> {
        self.events.lock().clone()
    }

    /// Remove and return all recorded events
    pub fn drain(&self) -> Vec<AssetEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: AssetEvent) {
        self.events.lock().push(event);
    }
}
