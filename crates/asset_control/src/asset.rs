//! Guarded asset instance
//!
//! Wires one role registry, one governance workflow and the external
//! collaborators together. Every entry point checks the accepted protocol
//! version, then the caller's role and the relevant pause flag, and only then
//! mutates state. Admin operations are never pause-gated.

use crate::address::Address;
use crate::config::AssetControlConfig;
use crate::errors::{AccessControlError, Result};
use crate::events::{AssetEvent, EventSink};
use crate::external::{Asset, AssetIssuer, Clock, Denylist};
use crate::governance::{Governance, GovernanceOutcome};
use crate::proposals::Proposal;
use crate::rate_limit::MintConfig;
use crate::roles::{Role, RoleConfig, RoleKind, RolesRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Protocol version implemented by this build
pub const PROTOCOL_VERSION: u64 = 1;

/// Persisted logical state of one guarded asset
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssetState {
    registry: RolesRegistry,
    governance: Governance,
    accepted_version: u64,
    max_transactions_per_window: usize,
}

pub struct GuardedAsset<I: AssetIssuer, D: Denylist> {
    registry: RolesRegistry,
    governance: Governance,
    accepted_version: u64,
    max_transactions_per_window: usize,
    issuer: I,
    denylist: D,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl<I: AssetIssuer, D: Denylist> GuardedAsset<I, D> {
    /// Initialize a guarded asset with `deployer` as its unrestricted admin
    pub fn new(
        deployer: Address,
        config: AssetControlConfig,
        issuer: I,
        denylist: D,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let asset = Self {
            registry: RolesRegistry::new(deployer),
            governance: Governance::new(config.lock_period_ms),
            accepted_version: PROTOCOL_VERSION,
            max_transactions_per_window: config.max_transactions_per_window,
            issuer,
            denylist,
            events,
            clock,
        };

        asset.events.emit(AssetEvent::RoleGranted {
            role: Role::admin(deployer),
            by: deployer,
        });
        info!(
            target: "asset_control",
            deployer = %deployer,
            lock_period_ms = config.lock_period_ms,
            "Guarded asset created"
        );
        Ok(asset)
    }

    /// Rebuild an instance from [`GuardedAsset::export_state`] output
    pub fn restore_state(
        bytes: &[u8],
        issuer: I,
        denylist: D,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let state: AssetState = bincode::deserialize(bytes)?;
        AssetControlConfig {
            lock_period_ms: state.governance.lock_period_ms(),
            max_transactions_per_window: state.max_transactions_per_window,
        }
        .validate()?;
        state.registry.check_consistency()?;

        debug!(
            target: "asset_control",
            roles = state.registry.len(),
            pending = state.governance.pending_count(),
            "Guarded asset state restored"
        );

        Ok(Self {
            registry: state.registry,
            governance: state.governance,
            accepted_version: state.accepted_version,
            max_transactions_per_window: state.max_transactions_per_window,
            issuer,
            denylist,
            events,
            clock,
        })
    }

    /// Encode the registry, proposal store and version for persistence
    pub fn export_state(&self) -> Result<Vec<u8>> {
        let state = AssetState {
            registry: self.registry.clone(),
            governance: self.governance.clone(),
            accepted_version: self.accepted_version,
            max_transactions_per_window: self.max_transactions_per_window,
        };
        Ok(bincode::serialize(&state)?)
    }

    fn assert_version(&self) -> Result<()> {
        if self.accepted_version != PROTOCOL_VERSION {
            return Err(AccessControlError::VersionMismatch {
                accepted: self.accepted_version,
                running: PROTOCOL_VERSION,
            });
        }
        Ok(())
    }

    fn emit_outcome(&self, role: Role, caller: Address, outcome: &GovernanceOutcome) {
        let event = match outcome {
            GovernanceOutcome::Granted => AssetEvent::RoleGranted { role, by: caller },
            GovernanceOutcome::Revoked(_) => AssetEvent::RoleRevoked { role, by: caller },
            GovernanceOutcome::Proposed(seq) => AssetEvent::ProposalCreated {
                seq: *seq,
                role,
                grant: matches!(
                    self.governance.proposal(*seq).map(Proposal::is_grant),
                    Ok(true)
                ),
                proposer: caller,
            },
        };
        self.events.emit(event);
    }

    // -------------------------------------------------------------------------
    // Role management
    // -------------------------------------------------------------------------

    /// Grant `role`, or queue a proposal when `caller` is time-locked
    pub fn authorize(
        &mut self,
        caller: Address,
        role: Role,
        config: RoleConfig,
    ) -> Result<GovernanceOutcome> {
        self.assert_version()?;
        self.registry
            .assert_is_authorized(RoleKind::Admin, &caller)?;
        if !config.fits(role.kind) {
            return Err(AccessControlError::InvalidRoleConfig { kind: role.kind });
        }

        let now = self.clock.now_ms();
        let outcome =
            self.governance
                .authorize_or_propose(&mut self.registry, caller, role, config, now)?;
        self.emit_outcome(role, caller, &outcome);
        Ok(outcome)
    }

    /// Revoke `role`, or queue a proposal when `caller` is time-locked
    pub fn deauthorize(&mut self, caller: Address, role: Role) -> Result<GovernanceOutcome> {
        self.assert_version()?;

        let now = self.clock.now_ms();
        let outcome = self
            .governance
            .deauthorize_or_propose(&mut self.registry, caller, role, now)?;
        self.emit_outcome(role, caller, &outcome);
        Ok(outcome)
    }

    pub fn execute_proposal(&mut self, caller: Address, seq: u64) -> Result<GovernanceOutcome> {
        self.assert_version()?;

        let now = self.clock.now_ms();
        let (proposal, outcome) =
            self.governance
                .execute_proposal(&mut self.registry, caller, seq, now)?;

        self.events.emit(AssetEvent::ProposalExecuted {
            seq,
            role: proposal.role,
            by: caller,
        });
        self.emit_outcome(proposal.role, caller, &outcome);
        Ok(outcome)
    }

    pub fn reject_proposal(&mut self, caller: Address, seq: u64) -> Result<Proposal> {
        self.assert_version()?;

        let proposal = self
            .governance
            .reject_proposal(&self.registry, caller, seq)?;
        self.events.emit(AssetEvent::ProposalRejected {
            seq,
            role: proposal.role,
            by: caller,
        });
        Ok(proposal)
    }

    /// Move the instance to `new_version`; unrestricted admins only
    ///
    /// Irreversible: once past [`PROTOCOL_VERSION`] this build refuses the
    /// instance.
    pub fn migrate_version(&mut self, caller: Address, new_version: u64) -> Result<()> {
        self.assert_version()?;
        self.governance
            .assert_unrestricted_admin(&self.registry, &caller)?;

        if new_version <= self.accepted_version {
            return Err(AccessControlError::InvalidVersion {
                requested: new_version,
                current: self.accepted_version,
            });
        }

        let from = self.accepted_version;
        self.accepted_version = new_version;
        self.events.emit(AssetEvent::VersionMigrated {
            from,
            to: new_version,
            by: caller,
        });
        info!(target: "asset_control", from, to = new_version, admin = %caller, "Protocol version migrated");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pause control
    // -------------------------------------------------------------------------

    pub fn pause(&mut self, caller: Address, kind: RoleKind) -> Result<()> {
        self.assert_version()?;
        self.registry
            .assert_is_authorized(RoleKind::Pauser, &caller)?;
        if matches!(kind, RoleKind::Admin | RoleKind::Pauser) {
            return Err(AccessControlError::NotPausable { kind });
        }

        self.registry.pause(kind)?;
        self.events.emit(AssetEvent::Paused { kind, by: caller });
        info!(target: "asset_control", %kind, pauser = %caller, "Capability paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address, kind: RoleKind) -> Result<()> {
        self.assert_version()?;
        self.registry
            .assert_is_authorized(RoleKind::Pauser, &caller)?;
        if matches!(kind, RoleKind::Admin | RoleKind::Pauser) {
            return Err(AccessControlError::NotPausable { kind });
        }

        self.registry.unpause(kind)?;
        self.events.emit(AssetEvent::Unpaused { kind, by: caller });
        info!(target: "asset_control", %kind, pauser = %caller, "Capability unpaused");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Capability entry points
    // -------------------------------------------------------------------------

    /// Mint `amount` for `recipient`, charged against the caller's window
    pub fn mint(&mut self, caller: Address, amount: u64, recipient: Address) -> Result<Asset> {
        self.assert_version()?;
        self.registry
            .assert_is_authorized(RoleKind::Minter, &caller)?;
        self.registry.assert_is_not_paused(RoleKind::Minter)?;

        if self.denylist.contains(&recipient) {
            return Err(AccessControlError::AddressDenied {
                address: recipient.to_string(),
            });
        }

        let now = self.clock.now_ms();
        let limiter = self
            .registry
            .config_mut::<MintConfig>(RoleKind::Minter, &caller)?;
        let window = limiter.check(amount, now, self.max_transactions_per_window)?;
        let asset = self.issuer.mint(amount)?;
        limiter.commit(window);

        self.events.emit(AssetEvent::Minted {
            minter: caller,
            recipient,
            amount,
        });
        debug!(target: "asset_control", minter = %caller, recipient = %recipient, amount, "Minted");
        Ok(asset)
    }

    /// Destroy a deposited asset
    pub fn burn(&mut self, caller: Address, asset: Asset) -> Result<u64> {
        self.assert_version()?;
        self.registry
            .assert_is_authorized(RoleKind::Burner, &caller)?;
        self.registry.assert_is_not_paused(RoleKind::Burner)?;

        let amount = self.issuer.burn(asset)?;
        self.events.emit(AssetEvent::Burned {
            burner: caller,
            amount,
        });
        debug!(target: "asset_control", burner = %caller, amount, "Burned");
        Ok(amount)
    }

    pub fn freeze(&mut self, caller: Address, address: Address) -> Result<()> {
        self.assert_version()?;
        self.registry
            .assert_is_authorized(RoleKind::Freezer, &caller)?;
        self.registry.assert_is_not_paused(RoleKind::Freezer)?;

        if self.denylist.contains(&address) {
            return Err(AccessControlError::AlreadyFrozen {
                address: address.to_string(),
            });
        }

        self.denylist.add(address)?;
        self.events.emit(AssetEvent::AddressFrozen {
            address,
            by: caller,
        });
        info!(target: "asset_control", %address, freezer = %caller, "Address frozen");
        Ok(())
    }

    pub fn unfreeze(&mut self, caller: Address, address: Address) -> Result<()> {
        self.assert_version()?;
        self.registry
            .assert_is_authorized(RoleKind::Freezer, &caller)?;
        self.registry.assert_is_not_paused(RoleKind::Freezer)?;

        if !self.denylist.contains(&address) {
            return Err(AccessControlError::NotFrozen {
                address: address.to_string(),
            });
        }

        self.denylist.remove(&address)?;
        self.events.emit(AssetEvent::AddressUnfrozen {
            address,
            by: caller,
        });
        info!(target: "asset_control", %address, freezer = %caller, "Address unfrozen");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn registry(&self) -> &RolesRegistry {
        &self.registry
    }

    pub fn governance(&self) -> &Governance {
        &self.governance
    }

    pub fn accepted_version(&self) -> u64 {
        self.accepted_version
    }

    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    pub fn is_frozen(&self, address: &Address) -> bool {
        self.denylist.contains(address)
    }

    /// Amount `minter` may still mint right now
    pub fn mint_remaining(&self, minter: &Address) -> Result<u64> {
        let now = self.clock.now_ms();
        Ok(self
            .registry
            .config::<MintConfig>(RoleKind::Minter, minter)?
            .remaining_at(now))
    }
}
