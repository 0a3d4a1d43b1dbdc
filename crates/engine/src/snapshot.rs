//! Derived budget views: status classification, snapshots and month totals.
//!
//! Nothing in here is persisted. A [`BudgetSnapshot`] is rebuilt from a fresh
//! ledger total on every read.

use serde::{Deserialize, Serialize};

use crate::{Budget, EngineError, Money, MonthPeriod, ResultEngine};

/// Default share of the limit at which a budget turns [`BudgetStatus::Warning`].
pub const DEFAULT_WARNING_RATIO: f64 = 0.8;

const BPS_SCALE: i128 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    Ok,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Exceeded => "EXCEEDED",
        }
    }
}

/// Status thresholds. The exceeded threshold is fixed at 100 % of the limit;
/// the warning threshold is configurable and kept in basis points so that
/// boundary comparisons stay exact integer arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    warning_bps: u32,
}

impl Thresholds {
    /// Builds thresholds from a warning ratio in `(0, 1]` (e.g. `0.8`).
    pub fn from_ratio(warning_ratio: f64) -> ResultEngine<Self> {
        if !warning_ratio.is_finite() || warning_ratio <= 0.0 || warning_ratio > 1.0 {
            return Err(EngineError::InvalidThreshold(format!(
                "warning ratio must be in (0, 1], got {warning_ratio}"
            )));
        }
        let warning_bps = (warning_ratio * BPS_SCALE as f64).round() as u32;
        if warning_bps == 0 {
            return Err(EngineError::InvalidThreshold(format!(
                "warning ratio {warning_ratio} is too small"
            )));
        }
        Ok(Self { warning_bps })
    }

    #[must_use]
    pub fn warning_ratio(self) -> f64 {
        f64::from(self.warning_bps) / BPS_SCALE as f64
    }

    /// Classifies `spent` against `limit`. Both bounds are closed: exactly
    /// 80 % is `Warning`, exactly 100 % is `Exceeded`.
    #[must_use]
    pub fn classify(self, spent: Money, limit: Money) -> BudgetStatus {
        if spent >= limit {
            return BudgetStatus::Exceeded;
        }
        let spent_scaled = i128::from(spent.minor()) * BPS_SCALE;
        let warning_floor = i128::from(limit.minor()) * i128::from(self.warning_bps);
        if spent_scaled >= warning_floor {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { warning_bps: 8_000 }
    }
}

/// A stored budget combined with freshly computed spend data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// The budget with `spent` replaced by the fresh ledger total.
    pub budget: Budget,
    /// `spent / limit * 100`, not clamped (150.0 is a valid value).
    pub percentage_used: f64,
    /// `limit - spent`; negative when over budget.
    pub remaining: Money,
    pub status: BudgetStatus,
}

impl BudgetSnapshot {
    pub fn compute(mut budget: Budget, spent: Money, thresholds: Thresholds) -> ResultEngine<Self> {
        let remaining = budget
            .limit
            .checked_sub(spent)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        let percentage_used = percentage(spent, budget.limit);
        let status = thresholds.classify(spent, budget.limit);
        budget.spent = spent;
        Ok(Self {
            budget,
            percentage_used,
            remaining,
            status,
        })
    }

    /// Percentage clamped to `0..=100`, for progress bars.
    #[must_use]
    pub fn display_percentage(&self) -> f64 {
        self.percentage_used.clamp(0.0, 100.0)
    }
}

/// Totals across every budget of a month (the dashboard card).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub period: MonthPeriod,
    pub budget_count: usize,
    pub total_limit: Money,
    pub total_spent: Money,
    pub total_remaining: Money,
    pub percentage_used: f64,
    pub ok: usize,
    pub warning: usize,
    pub exceeded: usize,
}

impl MonthSummary {
    pub fn from_snapshots(period: MonthPeriod, snapshots: &[BudgetSnapshot]) -> ResultEngine<Self> {
        let total_limit = Money::checked_sum(snapshots.iter().map(|s| s.budget.limit))?;
        let total_spent = Money::checked_sum(snapshots.iter().map(|s| s.budget.spent))?;
        let total_remaining = total_limit
            .checked_sub(total_spent)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        let count = |status: BudgetStatus| snapshots.iter().filter(|s| s.status == status).count();

        Ok(Self {
            period,
            budget_count: snapshots.len(),
            total_limit,
            total_spent,
            total_remaining,
            percentage_used: percentage(total_spent, total_limit),
            ok: count(BudgetStatus::Ok),
            warning: count(BudgetStatus::Warning),
            exceeded: count(BudgetStatus::Exceeded),
        })
    }
}

fn percentage(spent: Money, limit: Money) -> f64 {
    if !limit.is_positive() {
        return 0.0;
    }
    (spent.minor() as f64 * 100.0) / limit.minor() as f64
}
