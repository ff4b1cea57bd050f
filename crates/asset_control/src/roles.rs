//! Role registry
//!
//! Maps `(capability kind, address)` to a capability-specific configuration
//! value. Presence of an entry is the authorization. The registry also keeps
//! one pause flag per kind and a count of Admin entries that can never drop
//! to zero through a removal.

use crate::address::Address;
use crate::errors::{AccessControlError, Result};
use crate::rate_limit::MintConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Capability kinds guarded by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Admin,
    Minter,
    Burner,
    Freezer,
    Pauser,
    /// Reserved for capabilities added after deployment
    Extension(u16),
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::Admin => write!(f, "Admin"),
            RoleKind::Minter => write!(f, "Minter"),
            RoleKind::Burner => write!(f, "Burner"),
            RoleKind::Freezer => write!(f, "Freezer"),
            RoleKind::Pauser => write!(f, "Pauser"),
            RoleKind::Extension(id) => write!(f, "Extension({id})"),
        }
    }
}

/// A capability kind held by an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Role {
    pub kind: RoleKind,
    pub address: Address,
}

impl Role {
    pub fn new(kind: RoleKind, address: Address) -> Self {
        Self { kind, address }
    }

    pub fn admin(address: Address) -> Self {
        Self::new(RoleKind::Admin, address)
    }

    pub fn minter(address: Address) -> Self {
        Self::new(RoleKind::Minter, address)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.address)
    }
}

/// Configuration attached to an Admin entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Restricted admins must route every change through a proposal
    pub time_locked: bool,
}

impl AdminConfig {
    pub fn unrestricted() -> Self {
        Self { time_locked: false }
    }

    pub fn restricted() -> Self {
        Self { time_locked: true }
    }
}

/// Configuration value stored per registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleConfig {
    Admin(AdminConfig),
    Minter(MintConfig),
    /// Capabilities without settings (Burner, Freezer, Pauser)
    Empty,
    /// Opaque payload owned by an extension capability
    Opaque(Vec<u8>),
}

impl RoleConfig {
    /// Whether this value has the shape expected for `kind`
    pub fn fits(&self, kind: RoleKind) -> bool {
        matches!(
            (kind, self),
            (RoleKind::Admin, RoleConfig::Admin(_))
                | (RoleKind::Minter, RoleConfig::Minter(_))
                | (RoleKind::Burner, RoleConfig::Empty)
                | (RoleKind::Freezer, RoleConfig::Empty)
                | (RoleKind::Pauser, RoleConfig::Empty)
                | (RoleKind::Extension(_), RoleConfig::Opaque(_))
                | (RoleKind::Extension(_), RoleConfig::Empty)
        )
    }
}

/// Typed view over a [`RoleConfig`]
///
/// Each capability module asks for its own type; asking for the wrong one is
/// a programming error surfaced as [`AccessControlError::ConfigTypeMismatch`].
pub trait RoleValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_config(config: &RoleConfig) -> Option<&Self>;

    fn from_config_mut(config: &mut RoleConfig) -> Option<&mut Self>;
}

impl RoleValue for AdminConfig {
    const TYPE_NAME: &'static str = "AdminConfig";

    fn from_config(config: &RoleConfig) -> Option<&Self> {
        match config {
            RoleConfig::Admin(admin) => Some(admin),
            _ => None,
        }
    }

    fn from_config_mut(config: &mut RoleConfig) -> Option<&mut Self> {
        match config {
            RoleConfig::Admin(admin) => Some(admin),
            _ => None,
        }
    }
}

impl RoleValue for MintConfig {
    const TYPE_NAME: &'static str = "MintConfig";

    fn from_config(config: &RoleConfig) -> Option<&Self> {
        match config {
            RoleConfig::Minter(mint) => Some(mint),
            _ => None,
        }
    }

    fn from_config_mut(config: &mut RoleConfig) -> Option<&mut Self> {
        match config {
            RoleConfig::Minter(mint) => Some(mint),
            _ => None,
        }
    }
}

/// Authoritative role and pause state of one guarded asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesRegistry {
    entries: BTreeMap<Role, RoleConfig>,
    paused: BTreeMap<RoleKind, bool>,
    admin_count: u64,
}

impl RolesRegistry {
    /// Create a registry whose only entry is `deployer` as an unrestricted admin
    pub fn new(deployer: Address) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            Role::admin(deployer),
            RoleConfig::Admin(AdminConfig::unrestricted()),
        );

        info!(target: "asset_control", admin = %deployer, "Role registry initialized");

        Self {
            entries,
            paused: BTreeMap::new(),
            admin_count: 1,
        }
    }

    /// Grant `role` with `config`
    pub fn authorize(&mut self, role: Role, config: RoleConfig) -> Result<()> {
        if self.entries.contains_key(&role) {
            return Err(AccessControlError::RoleAlreadyExists {
                kind: role.kind,
                address: role.address.to_string(),
            });
        }

        self.entries.insert(role, config);
        if role.kind == RoleKind::Admin {
            self.admin_count += 1;
        }

        debug!(target: "asset_control", %role, admins = self.admin_count, "Role authorized");
        Ok(())
    }

    /// Revoke `role`, returning its configuration
    pub fn deauthorize(&mut self, role: Role) -> Result<RoleConfig> {
        if !self.entries.contains_key(&role) {
            return Err(AccessControlError::RoleNotExists {
                kind: role.kind,
                address: role.address.to_string(),
            });
        }

        if role.kind == RoleKind::Admin && self.admin_count <= 1 {
            return Err(AccessControlError::CannotRemoveLastAdmin);
        }

        let config = self
            .entries
            .remove(&role)
            .ok_or_else(|| AccessControlError::RoleNotExists {
                kind: role.kind,
                address: role.address.to_string(),
            })?;
        if role.kind == RoleKind::Admin {
            self.admin_count -= 1;
        }

        debug!(target: "asset_control", %role, admins = self.admin_count, "Role deauthorized");
        Ok(config)
    }

    pub fn pause(&mut self, kind: RoleKind) -> Result<()> {
        if self.is_paused(kind) {
            return Err(AccessControlError::AlreadyPaused { kind });
        }
        self.paused.insert(kind, true);
        Ok(())
    }

    pub fn unpause(&mut self, kind: RoleKind) -> Result<()> {
        if !self.is_paused(kind) {
            return Err(AccessControlError::AlreadyUnpaused { kind });
        }
        self.paused.remove(&kind);
        Ok(())
    }

    pub fn is_authorized(&self, kind: RoleKind, address: &Address) -> bool {
        self.entries.contains_key(&Role::new(kind, *address))
    }

    pub fn is_paused(&self, kind: RoleKind) -> bool {
        self.paused.get(&kind).copied().unwrap_or(false)
    }

    pub fn assert_is_authorized(&self, kind: RoleKind, address: &Address) -> Result<()> {
        if !self.is_authorized(kind, address) {
            return Err(AccessControlError::UnauthorizedUser {
                kind,
                address: address.to_string(),
            });
        }
        Ok(())
    }

    pub fn assert_is_not_paused(&self, kind: RoleKind) -> Result<()> {
        if self.is_paused(kind) {
            return Err(AccessControlError::RolePaused { kind });
        }
        Ok(())
    }

    /// Typed read access to the configuration of `(kind, address)`
    pub fn config<V: RoleValue>(&self, kind: RoleKind, address: &Address) -> Result<&V> {
        let config = self
            .entries
            .get(&Role::new(kind, *address))
            .ok_or_else(|| AccessControlError::RoleNotExists {
                kind,
                address: address.to_string(),
            })?;
        V::from_config(config).ok_or(AccessControlError::ConfigTypeMismatch {
            kind,
            expected: V::TYPE_NAME,
        })
    }

    /// Typed write access to the configuration of `(kind, address)`
    pub fn config_mut<V: RoleValue>(&mut self, kind: RoleKind, address: &Address) -> Result<&mut V> {
        let config = self
            .entries
            .get_mut(&Role::new(kind, *address))
            .ok_or_else(|| AccessControlError::RoleNotExists {
                kind,
                address: address.to_string(),
            })?;
        V::from_config_mut(config).ok_or(AccessControlError::ConfigTypeMismatch {
            kind,
            expected: V::TYPE_NAME,
        })
    }

    /// Whether `address` is an admin that must go through proposals
    pub fn is_time_locked(&self, address: &Address) -> Result<bool> {
        Ok(self
            .config::<AdminConfig>(RoleKind::Admin, address)?
            .time_locked)
    }

    pub fn admin_count(&self) -> u64 {
        self.admin_count
    }

    /// Verify invariants of a registry decoded from untrusted bytes
    ///
    /// The admin count must equal the number of Admin entries and be non-zero,
    /// and every entry must carry a config shaped for its kind.
    pub fn check_consistency(&self) -> Result<()> {
        let admins = self.roles_of(RoleKind::Admin).len() as u64;
        if self.admin_count != admins {
            return Err(AccessControlError::CorruptState(format!(
                "admin count {} does not match {} admin entries",
                self.admin_count, admins
            )));
        }
        if admins == 0 {
            return Err(AccessControlError::CorruptState(
                "registry has no admin".to_string(),
            ));
        }

        if let Some(role) = self
            .entries
            .iter()
            .find(|(role, config)| !config.fits(role.kind))
            .map(|(role, _)| role)
        {
            return Err(AccessControlError::CorruptState(format!(
                "config of {role} does not fit its kind"
            )));
        }

        Ok(())
    }

    /// Number of entries across all kinds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Addresses holding `kind`, in address order
    pub fn roles_of(&self, kind: RoleKind) -> Vec<Address> {
        self.entries
            .keys()
            .filter(|role| role.kind == kind)
            .map(|role| role.address)
            .collect()
    }
}
