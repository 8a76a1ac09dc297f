use crate::core::account::{AccountId, Category};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How severe a projected breach is.
///
/// Severity comes from the three-way split of the budget threshold
/// against the forecast's uncertainty band, not the point estimate
/// alone — the engine's core anti-false-positive mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Lifecycle of an alert record.
///
/// `Pending` → `Stale` (superseded by a newer run), `Resolved` (a
/// newer run no longer projects the breach), or `Realized` (the
/// breach period passed and the ledger confirmed it — informational,
/// kept for model-accuracy evaluation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Pending,
    Stale,
    Resolved,
    Realized,
}

/// Identity of a projected breach: at most one non-stale alert may
/// exist per key at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub account_id: AccountId,
    /// `None` for total-balance (liquidity) alerts.
    pub category: Option<Category>,
    pub period_start: NaiveDate,
}

/// A typed overspend alert.
///
/// Immutable once emitted; recomputation supersedes an alert with a
/// new record rather than editing it, preserving the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: Uuid,
    pub account_id: AccountId,
    /// `None` for total-balance alerts.
    pub category: Option<Category>,
    pub severity: Severity,
    /// Period in which the breach is projected.
    pub projected_breach_period: NaiveDate,
    /// Whole periods between "now" and the breach. Never negative: an
    /// alert cannot reference a past breach.
    pub lead_time_periods: u32,
    /// The budget floor that is projected to be crossed, minor units.
    pub threshold_minor: i64,
    /// Model/run version of the forecast that generated this alert.
    pub generating_forecast_version: String,
    pub status: AlertStatus,
    /// The alert that replaced this one, once stale.
    pub superseded_by: Option<Uuid>,
}

impl Alert {
    pub fn key(&self) -> AlertKey {
        AlertKey {
            account_id: self.account_id.clone(),
            category: self.category.clone(),
            period_start: self.projected_breach_period,
        }
    }
}

/// Append-mostly arena of alert records.
///
/// Alerts are never hard-deleted: supersession and resolution flip
/// status markers on old records and append new ones, keeping the
/// forecast-accuracy trail auditable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertBook {
    records: Vec<Alert>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the alerts of a completed run for one account.
    ///
    /// Every currently pending alert for the account is either
    /// superseded by a fresh alert with the same key (marked stale) or
    /// resolved (the new run no longer projects that breach). Fresh
    /// alerts are appended as pending. After any sequence of publishes
    /// at most one non-stale alert exists per key.
    pub fn publish(&mut self, account_id: &AccountId, fresh: Vec<Alert>) {
        for record in self
            .records
            .iter_mut()
            .filter(|r| &r.account_id == account_id && r.status == AlertStatus::Pending)
        {
            let key = record.key();
            match fresh.iter().find(|f| f.key() == key) {
                Some(replacement) => {
                    record.status = AlertStatus::Stale;
                    record.superseded_by = Some(replacement.alert_id);
                }
                None => {
                    record.status = AlertStatus::Resolved;
                }
            }
        }
        self.records.extend(fresh);
    }

    /// Record that a projected breach actually occurred, as confirmed
    /// by the external ledger once the period passed. Informational:
    /// feeds model-accuracy evaluation, erases nothing.
    pub fn mark_realized(&mut self, alert_id: Uuid) -> bool {
        match self.records.iter_mut().find(|r| r.alert_id == alert_id) {
            Some(record) => {
                record.status = AlertStatus::Realized;
                true
            }
            None => false,
        }
    }

    /// Current (pending) alerts for an account.
    pub fn active(&self, account_id: &AccountId) -> Vec<&Alert> {
        self.records
            .iter()
            .filter(|r| &r.account_id == account_id && r.status == AlertStatus::Pending)
            .collect()
    }

    /// Every record ever published, stale and resolved included —
    /// the audit view.
    pub fn all_for_audit(&self, account_id: &AccountId) -> Vec<&Alert> {
        self.records
            .iter()
            .filter(|r| &r.account_id == account_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
