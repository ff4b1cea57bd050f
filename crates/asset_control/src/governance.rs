//! Time-locked governance over the role registry
//!
//! ## Flow
//!
//! - Unrestricted admins (`time_locked = false`) change roles immediately.
//! - Restricted admins create a [`Proposal`] instead; only the proposer may
//!   execute it, and only once `created_at + lock_period` has passed.
//! - A restricted admin may reject only its own proposals; an unrestricted
//!   admin may reject any pending proposal. Rejection needs no waiting.
//! - Global operations are reserved to unrestricted admins.
//!
//! Proposals for the same role are not deduplicated. When two compete, the
//! second to execute fails with the registry's own conflict error.

use crate::address::Address;
use crate::errors::{AccessControlError, Result};
use crate::proposals::{Proposal, ProposalStore};
use crate::roles::{Role, RoleConfig, RoleKind, RolesRegistry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Delay between proposal creation and execution: 7 days in milliseconds
pub const LOCK_PERIOD_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Result of a governance call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceOutcome {
    /// The role was granted immediately
    Granted,
    /// The role was revoked immediately; carries its former config
    Revoked(RoleConfig),
    /// A proposal was queued under this sequence number
    Proposed(u64),
}

/// Governance workflow; owns the proposal store of one guarded asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Governance {
    proposals: ProposalStore,
    lock_period_ms: u64,
}

impl Default for Governance {
    fn default() -> Self {
        Self::new(LOCK_PERIOD_MS)
    }
}

impl Governance {
    pub fn new(lock_period_ms: u64) -> Self {
        Self {
            proposals: ProposalStore::new(),
            lock_period_ms,
        }
    }

    pub fn lock_period_ms(&self) -> u64 {
        self.lock_period_ms
    }

    /// Grant `role` now, or propose it if `caller` is time-locked
    pub fn authorize_or_propose(
        &mut self,
        registry: &mut RolesRegistry,
        caller: Address,
        role: Role,
        config: RoleConfig,
        now_ms: u64,
    ) -> Result<GovernanceOutcome> {
        registry.assert_is_authorized(RoleKind::Admin, &caller)?;

        if registry.is_authorized(role.kind, &role.address) {
            return Err(AccessControlError::AlreadyAuthorized {
                kind: role.kind,
                address: role.address.to_string(),
            });
        }

        if !registry.is_time_locked(&caller)? {
            registry.authorize(role, config)?;
            info!(target: "asset_control", %role, admin = %caller, "Role granted");
            return Ok(GovernanceOutcome::Granted);
        }

        let seq = self.propose(caller, role, Some(config), now_ms);
        Ok(GovernanceOutcome::Proposed(seq))
    }

    /// Revoke `role` now, or propose the revocation if `caller` is time-locked
    pub fn deauthorize_or_propose(
        &mut self,
        registry: &mut RolesRegistry,
        caller: Address,
        role: Role,
        now_ms: u64,
    ) -> Result<GovernanceOutcome> {
        registry.assert_is_authorized(RoleKind::Admin, &caller)?;

        if !registry.is_authorized(role.kind, &role.address) {
            return Err(AccessControlError::RoleNotAuthorized {
                kind: role.kind,
                address: role.address.to_string(),
            });
        }

        if !registry.is_time_locked(&caller)? {
            let config = registry.deauthorize(role)?;
            info!(target: "asset_control", %role, admin = %caller, "Role revoked");
            return Ok(GovernanceOutcome::Revoked(config));
        }

        let seq = self.propose(caller, role, None, now_ms);
        Ok(GovernanceOutcome::Proposed(seq))
    }

    fn propose(
        &mut self,
        proposer: Address,
        role: Role,
        value: Option<RoleConfig>,
        now_ms: u64,
    ) -> u64 {
        let grant = value.is_some();
        let seq = self.proposals.insert(Proposal {
            role,
            value,
            proposer,
            created_at_ms: now_ms,
        });

        info!(
            target: "asset_control",
            seq,
            %role,
            grant,
            proposer = %proposer,
            executable_at = now_ms.saturating_add(self.lock_period_ms),
            "Proposal created"
        );
        seq
    }

    /// Apply a matured proposal created by `caller`
    ///
    /// Returns the consumed proposal with the applied change. The proposal
    /// stays pending if any check or the registry change fails.
    pub fn execute_proposal(
        &mut self,
        registry: &mut RolesRegistry,
        caller: Address,
        seq: u64,
        now_ms: u64,
    ) -> Result<(Proposal, GovernanceOutcome)> {
        registry.assert_is_authorized(RoleKind::Admin, &caller)?;

        let proposal = self.proposals.get(seq)?;
        if proposal.proposer != caller {
            warn!(target: "asset_control", seq, caller = %caller, "Execution by non-proposer refused");
            return Err(AccessControlError::CannotExecuteNonOwnProposal { seq });
        }

        let available_at = proposal.created_at_ms.saturating_add(self.lock_period_ms);
        if now_ms < available_at {
            debug!(target: "asset_control", seq, available_at, now_ms, "Proposal still locked");
            return Err(AccessControlError::NotYetAvailableForExecution {
                seq,
                available_at,
                now: now_ms,
            });
        }

        let role = proposal.role;
        let outcome = match &proposal.value {
            Some(config) => {
                registry.authorize(role, config.clone())?;
                GovernanceOutcome::Granted
            }
            None => GovernanceOutcome::Revoked(registry.deauthorize(role)?),
        };
        let proposal = self.proposals.remove(seq)?;

        info!(target: "asset_control", seq, %role, admin = %caller, "Proposal executed");
        Ok((proposal, outcome))
    }

    /// Drop a pending proposal without applying it
    pub fn reject_proposal(
        &mut self,
        registry: &RolesRegistry,
        caller: Address,
        seq: u64,
    ) -> Result<Proposal> {
        registry.assert_is_authorized(RoleKind::Admin, &caller)?;

        let proposal = self.proposals.get(seq)?;
        if registry.is_time_locked(&caller)? && proposal.proposer != caller {
            warn!(target: "asset_control", seq, caller = %caller, "Rejection by time-locked non-proposer refused");
            return Err(AccessControlError::CannotRejectAsTimeLocked { seq });
        }

        let proposal = self.proposals.remove(seq)?;
        info!(target: "asset_control", seq, role = %proposal.role, admin = %caller, "Proposal rejected");
        Ok(proposal)
    }

    /// Guard for operations reserved to unrestricted admins
    pub fn assert_unrestricted_admin(&self, registry: &RolesRegistry, caller: &Address) -> Result<()> {
        registry.assert_is_authorized(RoleKind::Admin, caller)?;
        if registry.is_time_locked(caller)? {
            return Err(AccessControlError::NotAvailableForTimeLockedAdmin);
        }
        Ok(())
    }

    pub fn proposal(&self, seq: u64) -> Result<&Proposal> {
        self.proposals.get(seq)
    }

    /// Pending proposals in sequence order
    pub fn pending(&self) -> Vec<(u64, &Proposal)> {
        self.proposals.iter().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.proposals.count()
    }

    /// Earliest timestamp at which proposal `seq` may be executed
    pub fn executable_at(&self, seq: u64) -> Result<u64> {
        Ok(self
            .proposals
            .get(seq)?
            .created_at_ms
            .saturating_add(self.lock_period_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::MintConfig;
    use crate::roles::AdminConfig;

    const SUDO: Address = Address::repeat(1);
    const LOCKED: Address = Address::repeat(2);
    const OTHER_LOCKED: Address = Address::repeat(3);
    const TARGET: Address = Address::repeat(9);

    fn setup() -> (Governance, RolesRegistry) {
        let mut registry = RolesRegistry::new(SUDO);
        for admin in [LOCKED, OTHER_LOCKED] {
            registry
                .authorize(
                    Role::admin(admin),
                    RoleConfig::Admin(AdminConfig::restricted()),
                )
                .unwrap();
        }
        (Governance::default(), registry)
    }

    #[test]
    fn test_unrestricted_admin_applies_immediately() {
        let (mut gov, mut registry) = setup();
        let role = Role::new(RoleKind::Burner, TARGET);

        let outcome = gov
            .authorize_or_propose(&mut registry, SUDO, role, RoleConfig::Empty, 0)
            .unwrap();
        assert_eq!(outcome, GovernanceOutcome::Granted);
        assert!(registry.is_authorized(RoleKind::Burner, &TARGET));
        assert_eq!(gov.pending_count(), 0);

        let outcome = gov.deauthorize_or_propose(&mut registry, SUDO, role, 0).unwrap();
        assert_eq!(outcome, GovernanceOutcome::Revoked(RoleConfig::Empty));
        assert!(!registry.is_authorized(RoleKind::Burner, &TARGET));
    }

    #[test]
    fn test_restricted_admin_proposes() {
        let (mut gov, mut registry) = setup();
        let before = registry.clone();
        let role = Role::new(RoleKind::Freezer, TARGET);

        let outcome = gov
            .authorize_or_propose(&mut registry, LOCKED, role, RoleConfig::Empty, 1_000)
            .unwrap();
        assert_eq!(outcome, GovernanceOutcome::Proposed(0));
        assert_eq!(registry, before);

        let proposal = gov.proposal(0).unwrap();
        assert_eq!(proposal.proposer, LOCKED);
        assert_eq!(proposal.created_at_ms, 1_000);
        assert!(proposal.is_grant());
        assert_eq!(gov.executable_at(0).unwrap(), 1_000 + LOCK_PERIOD_MS);
    }

    #[test]
    fn test_non_admin_cannot_govern() {
        let (mut gov, mut registry) = setup();
        let role = Role::new(RoleKind::Pauser, TARGET);
        assert!(matches!(
            gov.authorize_or_propose(&mut registry, TARGET, role, RoleConfig::Empty, 0),
            Err(AccessControlError::UnauthorizedUser { .. })
        ));
        assert!(matches!(
            gov.deauthorize_or_propose(&mut registry, TARGET, Role::admin(SUDO), 0),
            Err(AccessControlError::UnauthorizedUser { .. })
        ));
    }

    #[test]
    fn test_duplicate_and_missing_targets() {
        let (mut gov, mut registry) = setup();
        assert!(matches!(
            gov.authorize_or_propose(
                &mut registry,
                LOCKED,
                Role::admin(SUDO),
                RoleConfig::Admin(AdminConfig::default()),
                0
            ),
            Err(AccessControlError::AlreadyAuthorized { .. })
        ));
        assert!(matches!(
            gov.deauthorize_or_propose(&mut registry, LOCKED, Role::minter(TARGET), 0),
            Err(AccessControlError::RoleNotAuthorized { .. })
        ));
        assert_eq!(gov.pending_count(), 0);
    }

    #[test]
    fn test_execute_after_lock_period() {
        let (mut gov, mut registry) = setup();
        let role = Role::minter(TARGET);
        let config = RoleConfig::Minter(MintConfig::new(1_000, 60_000));
        gov.authorize_or_propose(&mut registry, LOCKED, role, config.clone(), 0)
            .unwrap();

        assert!(matches!(
            gov.execute_proposal(&mut registry, LOCKED, 0, LOCK_PERIOD_MS - 1),
            Err(AccessControlError::NotYetAvailableForExecution { seq: 0, .. })
        ));
        assert_eq!(gov.pending_count(), 1);

        let (executed, outcome) = gov
            .execute_proposal(&mut registry, LOCKED, 0, LOCK_PERIOD_MS)
            .unwrap();
        assert_eq!(outcome, GovernanceOutcome::Granted);
        assert_eq!(executed.value, Some(config));
        assert_eq!(
            registry.config::<MintConfig>(RoleKind::Minter, &TARGET).unwrap(),
            &MintConfig::new(1_000, 60_000)
        );
        assert_eq!(gov.pending_count(), 0);
        assert!(matches!(
            gov.execute_proposal(&mut registry, LOCKED, 0, LOCK_PERIOD_MS),
            Err(AccessControlError::ProposalNotFound { seq: 0 })
        ));
    }

    #[test]
    fn test_only_proposer_executes() {
        let (mut gov, mut registry) = setup();
        gov.authorize_or_propose(
            &mut registry,
            LOCKED,
            Role::new(RoleKind::Burner, TARGET),
            RoleConfig::Empty,
            0,
        )
        .unwrap();

        for caller in [SUDO, OTHER_LOCKED] {
            assert!(matches!(
                gov.execute_proposal(&mut registry, caller, 0, LOCK_PERIOD_MS),
                Err(AccessControlError::CannotExecuteNonOwnProposal { seq: 0 })
            ));
        }
        assert!(!registry.is_authorized(RoleKind::Burner, &TARGET));
        assert_eq!(gov.pending_count(), 1);
    }

    #[test]
    fn test_revocation_proposal_executes() {
        let (mut gov, mut registry) = setup();
        let outcome = gov
            .deauthorize_or_propose(&mut registry, LOCKED, Role::admin(OTHER_LOCKED), 5)
            .unwrap();
        assert_eq!(outcome, GovernanceOutcome::Proposed(0));
        assert_eq!(registry.admin_count(), 3);

        let (_, outcome) = gov
            .execute_proposal(&mut registry, LOCKED, 0, 5 + LOCK_PERIOD_MS)
            .unwrap();
        assert_eq!(
            outcome,
            GovernanceOutcome::Revoked(RoleConfig::Admin(AdminConfig::restricted()))
        );
        assert_eq!(registry.admin_count(), 2);
    }

    #[test]
    fn test_competing_proposals_fail_late() {
        let (mut gov, mut registry) = setup();
        let role = Role::new(RoleKind::Pauser, TARGET);
        let first = gov
            .authorize_or_propose(&mut registry, LOCKED, role, RoleConfig::Empty, 0)
            .unwrap();
        let second = gov
            .authorize_or_propose(&mut registry, OTHER_LOCKED, role, RoleConfig::Empty, 0)
            .unwrap();
        assert_eq!(first, GovernanceOutcome::Proposed(0));
        assert_eq!(second, GovernanceOutcome::Proposed(1));

        gov.execute_proposal(&mut registry, LOCKED, 0, LOCK_PERIOD_MS)
            .unwrap();
        assert!(matches!(
            gov.execute_proposal(&mut registry, OTHER_LOCKED, 1, LOCK_PERIOD_MS),
            Err(AccessControlError::RoleAlreadyExists { .. })
        ));
        // Failed execution leaves the proposal pending
        assert!(gov.proposal(1).is_ok());
    }

    #[test]
    fn test_reject_rules() {
        let (mut gov, mut registry) = setup();
        let role = Role::new(RoleKind::Burner, TARGET);
        gov.authorize_or_propose(&mut registry, LOCKED, role, RoleConfig::Empty, 0)
            .unwrap();
        gov.authorize_or_propose(&mut registry, LOCKED, role, RoleConfig::Empty, 0)
            .unwrap();

        assert!(matches!(
            gov.reject_proposal(&registry, OTHER_LOCKED, 0),
            Err(AccessControlError::CannotRejectAsTimeLocked { seq: 0 })
        ));

        let rejected = gov.reject_proposal(&registry, LOCKED, 0).unwrap();
        assert_eq!(rejected.role, role);

        // Unrestricted admins may reject anyone's proposal without waiting
        gov.reject_proposal(&registry, SUDO, 1).unwrap();
        assert_eq!(gov.pending_count(), 0);
        assert!(matches!(
            gov.reject_proposal(&registry, SUDO, 1),
            Err(AccessControlError::ProposalNotFound { seq: 1 })
        ));
    }

    #[test]
    fn test_unrestricted_guard() {
        let (gov, registry) = setup();
        assert!(gov.assert_unrestricted_admin(&registry, &SUDO).is_ok());
        assert!(matches!(
            gov.assert_unrestricted_admin(&registry, &LOCKED),
            Err(AccessControlError::NotAvailableForTimeLockedAdmin)
        ));
        assert!(matches!(
            gov.assert_unrestricted_admin(&registry, &TARGET),
            Err(AccessControlError::UnauthorizedUser { .. })
        ));
    }
}
