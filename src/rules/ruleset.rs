use crate::core::account::RegionCode;
use crate::error::EngineError;
use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One marginal tax bracket. Each bracket taxes only the slice of
/// income between its floor and ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive lower edge of the bracket, in minor units.
    pub floor_minor: i64,
    /// Exclusive upper edge; `None` for the open top bracket.
    pub ceiling_minor: Option<i64>,
    /// Marginal rate applied to the slice. Negative rates model
    /// explicitly tagged rebates.
    pub marginal_rate: Decimal,
}

/// A fixed loan amortization entry: a constant installment withheld
/// for a known number of future periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRule {
    pub loan_id: String,
    /// Installment per period, in minor units. Positive.
    pub installment_minor: i64,
    /// Periods (from the forecast start) the installment still applies.
    pub remaining_periods: u32,
}

/// Region-specific, versioned rule configuration.
///
/// Externally authored data, loaded read-only: the engine selects
/// among published versions and never edits one. Effective ranges are
/// half-open `[effective_from, effective_to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub region_code: RegionCode,
    pub version: String,
    pub effective_from: NaiveDate,
    /// `None` = open-ended.
    pub effective_to: Option<NaiveDate>,
    /// Ordered, contiguous from zero.
    pub brackets: Vec<TaxBracket>,
    pub loans: Vec<LoanRule>,
}

impl RuleSet {
    /// Whether this version covers the given as-of date.
    pub fn covers(&self, as_of: NaiveDate) -> bool {
        as_of >= self.effective_from && self.effective_to.map_or(true, |to| as_of < to)
    }

    /// Whether this version's effective range overlaps another's.
    fn overlaps(&self, other: &RuleSet) -> bool {
        let self_end = self.effective_to.unwrap_or(NaiveDate::MAX);
        let other_end = other.effective_to.unwrap_or(NaiveDate::MAX);
        self.effective_from < other_end && other.effective_from < self_end
    }

    /// Validate the configuration.
    ///
    /// Brackets must start at zero, be contiguous and ascending, and
    /// no marginal rate may exceed 100% — a rate above 1 would make
    /// net income fall as gross rises, which is a configuration error
    /// to surface, never a silent pass-through.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: String| EngineError::InvalidRuleSet {
            region: self.region_code.clone(),
            reason,
        };

        if let Some(to) = self.effective_to {
            if to <= self.effective_from {
                return Err(invalid(format!(
                    "empty effective range {}..{}",
                    self.effective_from, to
                )));
            }
        }

        if self.brackets.is_empty() {
            return Err(invalid("no tax brackets".to_string()));
        }

        let mut expected_floor = 0i64;
        for (i, bracket) in self.brackets.iter().enumerate() {
            if bracket.floor_minor != expected_floor {
                return Err(invalid(format!(
                    "bracket {} starts at {}, expected {}",
                    i, bracket.floor_minor, expected_floor
                )));
            }
            if bracket.marginal_rate > Decimal::ONE {
                return Err(invalid(format!(
                    "bracket {} rate {} exceeds 100%, net would not be monotonic",
                    i, bracket.marginal_rate
                )));
            }
            match bracket.ceiling_minor {
                Some(ceiling) => {
                    if ceiling <= bracket.floor_minor {
                        return Err(invalid(format!("bracket {} is empty or inverted", i)));
                    }
                    expected_floor = ceiling;
                }
                None => {
                    if i != self.brackets.len() - 1 {
                        return Err(invalid(format!(
                            "open bracket {} is not the top bracket",
                            i
                        )));
                    }
                }
            }
        }
        if self.brackets.last().map(|b| b.ceiling_minor).unwrap_or(None).is_some() {
            return Err(invalid("top bracket must be open-ended".to_string()));
        }

        for loan in &self.loans {
            if loan.installment_minor <= 0 {
                return Err(invalid(format!(
                    "loan {} installment must be positive",
                    loan.loan_id
                )));
            }
        }

        Ok(())
    }
}

/// Append-only registry of published rule set versions.
///
/// Versions are immutable once published; concurrent readers need no
/// locks because publishing only appends new non-overlapping ranges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetRegistry {
    rule_sets: Vec<RuleSet>,
}

impl RuleSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new version. Rejects invalid configurations and any
    /// effective range that overlaps an already published version for
    /// the same region.
    pub fn publish(&mut self, rule_set: RuleSet) -> Result<(), EngineError> {
        rule_set.validate()?;
        for existing in self
            .rule_sets
            .iter()
            .filter(|r| r.region_code == rule_set.region_code)
        {
            if existing.overlaps(&rule_set) {
                return Err(EngineError::InvalidRuleSet {
                    region: rule_set.region_code.clone(),
                    reason: format!(
                        "effective range overlaps published version {}",
                        existing.version
                    ),
                });
            }
        }
        info!(
            "published rule set {}/{} effective {}..{}",
            rule_set.region_code,
            rule_set.version,
            rule_set.effective_from,
            rule_set
                .effective_to
                .map(|d| d.to_string())
                .unwrap_or_else(|| "open".to_string())
        );
        self.rule_sets.push(rule_set);
        Ok(())
    }

    /// Select the version covering `as_of` for a region. There is no
    /// default-region fallback: a missing covering version is an
    /// operator-facing configuration gap.
    pub fn select(&self, region: &RegionCode, as_of: NaiveDate) -> Result<&RuleSet, EngineError> {
        self.rule_sets
            .iter()
            .find(|r| &r.region_code == region && r.covers(as_of))
            .ok_or_else(|| EngineError::NoApplicableRuleSet {
                region: region.clone(),
                as_of,
            })
    }

    pub fn len(&self) -> usize {
        self.rule_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_sets.is_empty()
    }
}
