//! Sliding-window mint rate limiter
//!
//! Every minter carries a [`MintConfig`] inside the role registry. Each mint is
//! evaluated against a candidate window (the retained history plus the new
//! entry) and the stored history is only replaced once both ceilings pass, so
//! a rejected mint leaves the previous state untouched.
//!
//! The window is right-inclusive: with `floor = now - duration_ms`
//! (saturating at zero) an entry stamped exactly `floor` is still counted.

use crate::errors::{AccessControlError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum number of mint transactions retained inside one window
pub const MAX_TRANSACTIONS_PER_WINDOW: usize = 7500;

/// A single mint recorded in the window history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRecord {
    pub amount: u64,
    pub timestamp_ms: u64,
}

/// Per-minter rate limit state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintConfig {
    /// Window length in milliseconds
    duration_ms: u64,
    /// Ceiling on the cumulative amount minted inside one window
    mint_limit: u64,
    /// Retained transactions, oldest first
    history: Vec<MintRecord>,
}

/// Candidate window produced by [`MintConfig::check`], ready to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintWindow {
    records: Vec<MintRecord>,
    total: u64,
}

impl MintWindow {
    /// Cumulative amount inside the candidate window
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of transactions inside the candidate window
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn window_floor(now_ms: u64, duration_ms: u64) -> u64 {
    now_ms.saturating_sub(duration_ms)
}

impl MintConfig {
    /// Create a limiter with an empty history
    pub fn new(mint_limit: u64, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            mint_limit,
            history: Vec::new(),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn mint_limit(&self) -> u64 {
        self.mint_limit
    }

    /// Transactions currently stored, oldest first
    pub fn history(&self) -> &[MintRecord] {
        &self.history
    }

    /// Evaluate a mint of `amount` at `now_ms` without touching the history
    pub fn check(&self, amount: u64, now_ms: u64, max_transactions: usize) -> Result<MintWindow> {
        let floor = window_floor(now_ms, self.duration_ms);

        let mut records: Vec<MintRecord> = self
            .history
            .iter()
            .filter(|record| record.timestamp_ms >= floor)
            .copied()
            .collect();
        records.push(MintRecord {
            amount,
            timestamp_ms: now_ms,
        });

        // An overflowing total is necessarily above any u64 limit
        let total = records
            .iter()
            .try_fold(0u64, |acc, record| acc.checked_add(record.amount))
            .ok_or(AccessControlError::LimitExceeded {
                total: u64::MAX,
                limit: self.mint_limit,
            })?;

        if total > self.mint_limit {
            debug!(
                target: "asset_control",
                total,
                limit = self.mint_limit,
                "Mint rejected by window limit"
            );
            return Err(AccessControlError::LimitExceeded {
                total,
                limit: self.mint_limit,
            });
        }

        if records.len() > max_transactions {
            debug!(
                target: "asset_control",
                count = records.len(),
                max = max_transactions,
                "Mint rejected by transaction count"
            );
            return Err(AccessControlError::TransactionsLimitExceeded {
                count: records.len(),
                max: max_transactions,
            });
        }

        Ok(MintWindow { records, total })
    }

    /// Install a window previously produced by [`MintConfig::check`]
    pub fn commit(&mut self, window: MintWindow) {
        self.history = window.records;
    }

    /// Check and commit in one step using [`MAX_TRANSACTIONS_PER_WINDOW`]
    pub fn record(&mut self, amount: u64, now_ms: u64) -> Result<()> {
        let window = self.check(amount, now_ms, MAX_TRANSACTIONS_PER_WINDOW)?;
        self.commit(window);
        Ok(())
    }

    /// Amount minted inside the window ending at `now_ms`
    pub fn cumulative_at(&self, now_ms: u64) -> u64 {
        let floor = window_floor(now_ms, self.duration_ms);
        self.history
            .iter()
            .filter(|record| record.timestamp_ms >= floor)
            .fold(0u64, |acc, record| acc.saturating_add(record.amount))
    }

    /// Amount that could still be minted at `now_ms`
    pub fn remaining_at(&self, now_ms: u64) -> u64 {
        self.mint_limit.saturating_sub(self.cumulative_at(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_accumulates_and_expires() {
        let mut config = MintConfig::new(10, 10);

        config.record(2, 1).unwrap();
        config.record(3, 2).unwrap();
        assert_eq!(config.history().len(), 2);
        assert_eq!(config.cumulative_at(2), 5);

        config.record(5, 3).unwrap();
        assert_eq!(config.cumulative_at(3), 10);
        // Entry at t=1 is exactly duration old at t=11 and still counts
        assert_eq!(config.cumulative_at(11), 10);
        assert_eq!(config.cumulative_at(12), 8);
        assert_eq!(config.remaining_at(12), 2);
    }

    #[test]
    fn test_history_is_pruned_on_record() {
        let mut config = MintConfig::new(10, 10);
        config.record(2, 1).unwrap();
        config.record(3, 2).unwrap();
        config.record(5, 3).unwrap();

        config.record(5, 13).unwrap();
        let stamps: Vec<u64> = config.history().iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(stamps, vec![3, 13]);

        config.record(10, 24).unwrap();
        assert_eq!(
            config.history(),
            &[MintRecord {
                amount: 10,
                timestamp_ms: 24
            }]
        );
    }

    #[test]
    fn test_rejected_mint_keeps_history() {
        let mut config = MintConfig::new(100, 10);
        config.record(90, 5).unwrap();

        let err = config.record(11, 15).unwrap_err();
        assert!(matches!(
            err,
            AccessControlError::LimitExceeded {
                total: 101,
                limit: 100
            }
        ));
        assert_eq!(
            config.history(),
            &[MintRecord {
                amount: 90,
                timestamp_ms: 5
            }]
        );
    }

    #[test]
    fn test_floor_saturates_at_zero() {
        let mut config = MintConfig::new(5, 1_000);
        config.record(5, 0).unwrap();
        assert!(config.record(1, 999).is_err());
        assert_eq!(config.cumulative_at(500), 5);
    }

    #[test]
    fn test_total_overflow_is_limit_error() {
        let mut config = MintConfig::new(u64::MAX, 10);
        config.record(u64::MAX, 1).unwrap();
        assert!(matches!(
            config.record(1, 2),
            Err(AccessControlError::LimitExceeded { .. })
        ));
        assert_eq!(config.history().len(), 1);
    }

    #[test]
    fn test_check_does_not_mutate() {
        let config = MintConfig::new(10, 10);
        let window = config.check(4, 1, MAX_TRANSACTIONS_PER_WINDOW).unwrap();
        assert_eq!(window.total(), 4);
        assert_eq!(window.len(), 1);
        assert!(config.history().is_empty());
    }

    #[test]
    fn test_transaction_cap() {
        let mut config = MintConfig::new(u64::MAX, 1_000);
        for t in 0..3 {
            let window = config.check(1, t, 3).unwrap();
            config.commit(window);
        }
        let err = config.check(1, 3, 3).unwrap_err();
        assert!(matches!(
            err,
            AccessControlError::TransactionsLimitExceeded { count: 4, max: 3 }
        ));
        assert_eq!(config.history().len(), 3);
    }
}
