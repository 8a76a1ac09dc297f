use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a cash account.
///
/// # Examples
///
/// ```
/// use forecash::core::account::AccountId;
///
/// let checking = AccountId::new("ACC-001");
/// let savings = AccountId::new("ACC-002");
/// assert_ne!(checking, savings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Spending or income category label (e.g. "rent", "salary", "groceries").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Jurisdiction code selecting which tax/loan rule sets apply.
///
/// Convention: ISO 3166-1 alpha-2, optionally suffixed with a
/// subdivision (e.g. "DE", "US-CA").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegionCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// ISO 4217-style currency code. Amounts are minor units of this
/// currency; the engine never converts between currencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Kind of account, as reported by the owning profile service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
}

/// A cash account as seen by the engine.
///
/// Owned by the external user-profile service; the engine reads these
/// records and never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub owner_id: String,
    pub region_code: RegionCode,
    pub account_type: AccountType,
    pub currency: CurrencyCode,
}

impl Account {
    pub fn new(
        account_id: AccountId,
        owner_id: impl Into<String>,
        region_code: RegionCode,
        account_type: AccountType,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            account_id,
            owner_id: owner_id.into(),
            region_code,
            account_type,
            currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_equality() {
        let a = AccountId::new("ACC-001");
        let b = AccountId::new("ACC-001");
        let c = AccountId::new("ACC-002");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_category_display() {
        let c = Category::new("groceries");
        assert_eq!(format!("{}", c), "groceries");
    }

    #[test]
    fn test_region_ordering() {
        let de = RegionCode::new("DE");
        let us = RegionCode::new("US-CA");
        assert!(de < us);
    }

    #[test]
    fn test_account_serializes() {
        let account = Account::new(
            AccountId::new("ACC-001"),
            "user-1",
            RegionCode::new("DE"),
            AccountType::Checking,
            CurrencyCode::new("EUR"),
        );
        let json = serde_json::to_string(&account).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["account_id"], "ACC-001");
        assert_eq!(parsed["account_type"], "checking");
    }
}
