//! IPPAN Asset Control
//!
//! Access control and governance for a mintable/burnable guarded asset:
//! - 🔐 Role registry with per-capability pause flags and an admin-count floor
//! - ⏳ Time-locked proposals for changes made by restricted admins
//! - 🚦 Sliding-window rate limiting of every minter
//!
//! Callers and timestamps are supplied by the execution environment. Each
//! operation runs to completion or fails without partial effect.

pub mod address;
pub mod asset;
pub mod config;
pub mod errors;
pub mod events;
pub mod external;
pub mod governance;
pub mod proposals;
pub mod rate_limit;
pub mod roles;

pub use address::{Address, AddressError};
pub use asset::{GuardedAsset, PROTOCOL_VERSION};
pub use config::AssetControlConfig;
pub use errors::{AccessControlError, Result};
pub use events::{AssetEvent, EventSink, NoopEventSink, RecordingEventSink, TracingEventSink};
pub use external::{
    Asset, AssetIssuer, Clock, Denylist, InMemoryDenylist, InMemoryIssuer, ManualClock,
};
pub use governance::{Governance, GovernanceOutcome, LOCK_PERIOD_MS};
pub use proposals::{Proposal, ProposalStore};
pub use rate_limit::{MintConfig, MintRecord, MintWindow, MAX_TRANSACTIONS_PER_WINDOW};
pub use roles::{AdminConfig, Role, RoleConfig, RoleKind, RoleValue, RolesRegistry};

/// Crate version (for API introspection)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
