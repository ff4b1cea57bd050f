//! External collaborators of a guarded asset
//!
//! The core does not account for supply, own denylist membership, or read a
//! clock. It consumes these through the traits below. In-memory
//! implementations back tests and simulations.

use crate::address::Address;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// A unit of the guarded asset held by the caller
///
/// Only an [`AssetIssuer`] creates one; it is consumed by [`AssetIssuer::burn`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Asset {
    amount: u64,
}

impl Asset {
    pub fn amount(&self) -> u64 {
        self.amount
    }
}

/// Issuance and destruction primitive
pub trait AssetIssuer: Send + Sync {
    fn mint(&mut self, amount: u64) -> Result<Asset>;

    /// Destroy `asset`, returning the amount removed from supply
    fn burn(&mut self, asset: Asset) -> Result<u64>;

    fn total_supply(&self) -> u64;
}

/// Denylist membership store
pub trait Denylist: Send + Sync {
    fn contains(&self, address: &Address) -> bool;

    fn add(&mut self, address: Address) -> Result<()>;

    fn remove(&mut self, address: &Address) -> Result<()>;
}

/// Trusted wall-clock oracle
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

// -----------------------------------------------------------------------------
// In-memory implementations
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryIssuer {
    total_supply: u64,
}

impl InMemoryIssuer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetIssuer for InMemoryIssuer {
    fn mint(&mut self, amount: u64) -> Result<Asset> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| anyhow!("Total supply overflow"))?;
        Ok(Asset { amount })
    }

    fn burn(&mut self, asset: Asset) -> Result<u64> {
        self.total_supply = self
            .total_supply
            .checked_sub(asset.amount)
            .ok_or_else(|| anyhow!("Burn exceeds total supply"))?;
        Ok(asset.amount)
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDenylist {
    entries: BTreeSet<Address>,
}

impl InMemoryDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Denylist for InMemoryDenylist {
    fn contains(&self, address: &Address) -> bool {
        self.entries.contains(address)
    }

    fn add(&mut self, address: Address) -> Result<()> {
        self.entries.insert(address);
        Ok(())
    }

    fn remove(&mut self, address: &Address) -> Result<()> {
        self.entries.remove(address);
        Ok(())
    }
}

/// Manually driven clock for deterministic runs
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        // fetch_update only fails when the closure returns None
        let _ = self
            .now_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(delta_ms))
            });
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issuer_tracks_supply() {
        let mut issuer = InMemoryIssuer::new();
        let asset = issuer.mint(40).unwrap();
        assert_eq!(asset.amount(), 40);
        assert_eq!(issuer.total_supply(), 40);

        assert_eq!(issuer.burn(asset).unwrap(), 40);
        assert_eq!(issuer.total_supply(), 0);
    }

    #[test]
    fn test_issuer_overflow() {
        let mut issuer = InMemoryIssuer::new();
        let _held = issuer.mint(u64::MAX).unwrap();
        assert!(issuer.mint(1).is_err());
        assert_eq!(issuer.total_supply(), u64::MAX);
    }

    #[test]
    fn test_denylist_membership() {
        let mut denylist = InMemoryDenylist::new();
        let addr = Address::repeat(5);
        denylist.add(addr).unwrap();
        assert!(denylist.contains(&addr));
        denylist.remove(&addr).unwrap();
        assert!(denylist.is_empty());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now_ms(), 15);
        clock.set(3);
        assert_eq!(clock.now_ms(), 3);
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new(10);
        clock.advance(u64::MAX);
        assert_eq!(clock.now_ms(), u64::MAX);
        clock.advance(1);
        assert_eq!(clock.now_ms(), u64::MAX);
    }
}
