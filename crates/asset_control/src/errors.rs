//! Error types for the asset control module

use crate::roles::RoleKind;
use thiserror::Error;

/// Errors that can occur while guarding an asset
#[derive(Error, Debug)]
pub enum AccessControlError {
    // -------------------------------------------------------------------------
    // Authorization
    // -------------------------------------------------------------------------
    /// Caller does not hold the required role
    #[error("Unauthorized user: {address} is not a {kind}")]
    UnauthorizedUser { kind: RoleKind, address: String },

    /// Capability is currently paused
    #[error("Role paused: {kind}")]
    RolePaused { kind: RoleKind },

    // -------------------------------------------------------------------------
    // State conflicts
    // -------------------------------------------------------------------------
    #[error("Role already exists: {kind} for {address}")]
    RoleAlreadyExists { kind: RoleKind, address: String },

    #[error("Role does not exist: {kind} for {address}")]
    RoleNotExists { kind: RoleKind, address: String },

    #[error("Cannot remove the last admin")]
    CannotRemoveLastAdmin,

    #[error("Already paused: {kind}")]
    AlreadyPaused { kind: RoleKind },

    #[error("Already unpaused: {kind}")]
    AlreadyUnpaused { kind: RoleKind },

    /// Admin and Pauser are never pause-gated, so their flags are refused
    #[error("Capability cannot be paused: {kind}")]
    NotPausable { kind: RoleKind },

    #[error("Proposal not found: {seq}")]
    ProposalNotFound { seq: u64 },

    /// Governance refused to grant a role that is already present
    #[error("Already authorized: {kind} for {address}")]
    AlreadyAuthorized { kind: RoleKind, address: String },

    /// Governance refused to revoke a role that is absent
    #[error("Role not authorized: {kind} for {address}")]
    RoleNotAuthorized { kind: RoleKind, address: String },

    #[error("Address is frozen: {address}")]
    AddressDenied { address: String },

    #[error("Address already frozen: {address}")]
    AlreadyFrozen { address: String },

    #[error("Address not frozen: {address}")]
    NotFrozen { address: String },

    // -------------------------------------------------------------------------
    // Governance timing
    // -------------------------------------------------------------------------
    #[error("Cannot execute proposal {seq} created by another admin")]
    CannotExecuteNonOwnProposal { seq: u64 },

    #[error("Proposal {seq} not available for execution until {available_at} (now {now})")]
    NotYetAvailableForExecution {
        seq: u64,
        available_at: u64,
        now: u64,
    },

    #[error("Time-locked admin cannot reject proposal {seq} created by another admin")]
    CannotRejectAsTimeLocked { seq: u64 },

    #[error("Operation not available for time-locked admin")]
    NotAvailableForTimeLockedAdmin,

    // -------------------------------------------------------------------------
    // Rate limits
    // -------------------------------------------------------------------------
    #[error("Mint limit exceeded: window total {total} > limit {limit}")]
    LimitExceeded { total: u64, limit: u64 },

    #[error("Transactions per window exceeded: {count} > {max}")]
    TransactionsLimitExceeded { count: usize, max: usize },

    // -------------------------------------------------------------------------
    // Versioning and programming errors
    // -------------------------------------------------------------------------
    #[error("Version mismatch: instance accepts {accepted}, running {running}")]
    VersionMismatch { accepted: u64, running: u64 },

    #[error("Invalid version {requested}: must be greater than {current}")]
    InvalidVersion { requested: u64, current: u64 },

    #[error("Invalid configuration for role {kind}")]
    InvalidRoleConfig { kind: RoleKind },

    /// The stored configuration is not of the type requested by the caller
    #[error("Config type mismatch for {kind}: expected {expected}")]
    ConfigTypeMismatch {
        kind: RoleKind,
        expected: &'static str,
    },

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corrupt state: {0}")]
    CorruptState(String),
}

/// Result type for asset control operations
pub type Result<T> = std::result::Result<T, AccessControlError>;
