//! # Domain Types
//!
//! Long-lived entities the settlement engine mutates but does not own.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Account      │   │     Party       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name (unique)  │   │  name (unique)  │   │  designation    │       │
//! │  │  sale_price     │   │  balance_cents  │   │  balance_cents  │       │
//! │  │  stock_quantity │   │  transactions*  │   │  history*       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   StaffUser     │   │  LedgerEntry    │   * append-only logs        │
//! │  │  ─────────────  │   │  ─────────────  │     stored in their own     │
//! │  │  id, email      │   │  invoice_id     │     tables                  │
//! │  │  history*       │   │  total_cents    │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for references
//! - Business key: (product name, account name, mobile number) - unique,
//!   case-normalized, human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::invoice::InvoiceKind;
use crate::money::Money;
use crate::validation::{
    normalize_name, validate_discount_bps, validate_email, validate_mobile_number,
    validate_name, validate_price_cents, ValidationResult,
};

// =============================================================================
// Product
// =============================================================================

/// Unit of measure for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum ProductUnit {
    Unt,
    #[default]
    Pcs,
    Nos,
    Mtr,
    Box,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, trimmed and lower-cased. Unique.
    pub name: String,

    /// Optional item code, lower-cased. Unique when present.
    pub item_code: Option<String>,

    pub unit: ProductUnit,

    /// Price paid to suppliers, in paise.
    pub purchase_price_cents: i64,

    /// Price charged to customers, in paise.
    pub sale_price_cents: i64,

    pub min_sale_price_cents: Option<i64>,

    /// Maximum retail price printed on the package.
    pub mrp_cents: Option<i64>,

    /// Suggested sale discount in basis points.
    pub sale_discount_bps: Option<u32>,

    /// Stock level at or below which the product is reported as low.
    pub low_stock_threshold: Option<i64>,

    /// Current stock level. May go negative under the lenient stock policy.
    pub stock_quantity: i64,

    /// Whether stock is tracked for this product.
    pub track_inventory: bool,

    /// Whether product is active (soft lifecycle).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Catalog price used for an invoice of the given kind when the request
    /// carries no override.
    #[inline]
    pub fn price_for(&self, kind: InvoiceKind) -> Money {
        match kind {
            InvoiceKind::Sale => Money::from_paise(self.sale_price_cents),
            InvoiceKind::Purchase => Money::from_paise(self.purchase_price_cents),
        }
    }

    /// Checks if the product can be sold without driving tracked stock
    /// below zero.
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        !self.track_inventory || self.stock_quantity >= quantity
    }

    /// Low-stock signal. Products without a threshold signal at zero or below.
    pub fn is_low_stock(&self) -> bool {
        self.track_inventory && self.stock_quantity <= self.low_stock_threshold.unwrap_or(0)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub item_code: Option<String>,
    #[serde(default)]
    pub unit: ProductUnit,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    pub min_sale_price_cents: Option<i64>,
    pub mrp_cents: Option<i64>,
    pub sale_discount_bps: Option<u32>,
    pub low_stock_threshold: Option<i64>,
    #[serde(default)]
    pub opening_stock: i64,
    #[serde(default = "default_true")]
    pub track_inventory: bool,
}

fn default_true() -> bool {
    true
}

impl NewProduct {
    /// Validates the input and returns a copy with normalized name/code.
    pub fn normalized(&self) -> ValidationResult<NewProduct> {
        validate_name("name", &self.name, 200)?;
        validate_price_cents("purchase price", self.purchase_price_cents)?;
        validate_price_cents("sale price", self.sale_price_cents)?;
        if let Some(min) = self.min_sale_price_cents {
            validate_price_cents("min sale price", min)?;
        }
        if let Some(mrp) = self.mrp_cents {
            validate_price_cents("mrp", mrp)?;
        }
        if let Some(bps) = self.sale_discount_bps {
            validate_discount_bps(bps)?;
        }

        let item_code = match self.item_code.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(code) => Some(code.to_lowercase()),
        };

        Ok(NewProduct {
            name: normalize_name(&self.name),
            item_code,
            ..self.clone()
        })
    }
}

/// Typed allow-list of product fields an administrator may change.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductPricingPatch {
    pub purchase_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub min_sale_price_cents: Option<i64>,
    pub mrp_cents: Option<i64>,
    pub sale_discount_bps: Option<u32>,
    pub low_stock_threshold: Option<i64>,
}

impl ProductPricingPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        for (field, value) in [
            ("purchase price", self.purchase_price_cents),
            ("sale price", self.sale_price_cents),
            ("min sale price", self.min_sale_price_cents),
            ("mrp", self.mrp_cents),
        ] {
            if let Some(cents) = value {
                validate_price_cents(field, cents)?;
            }
        }
        if let Some(bps) = self.sale_discount_bps {
            validate_discount_bps(bps)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.purchase_price_cents.is_none()
            && self.sale_price_cents.is_none()
            && self.min_sale_price_cents.is_none()
            && self.mrp_cents.is_none()
            && self.sale_discount_bps.is_none()
            && self.low_stock_threshold.is_none()
    }
}

/// A reference from a product to an invoice that moved its stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ProductInvoiceRef {
    pub product_id: String,
    pub invoice_id: String,
    pub invoice_kind: InvoiceKind,
    /// Signed stock delta applied by the invoice.
    pub quantity_delta: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledger Account
// =============================================================================

/// Kind of ledger account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AccountType {
    /// Cash drawer.
    Cash,
    /// UPI / QR code collections.
    QrCode,
    /// Online payment gateway.
    Gateway,
    /// Bank account.
    Bank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

/// A named pool of funds with a running balance.
///
/// Invariant: `balance_cents` equals the sum of all credit entries minus all
/// debit entries in the account's transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Account {
    pub id: String,
    /// Trimmed, lower-cased, unique.
    pub name: String,
    pub account_type: AccountType,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub branch: Option<String>,
    pub balance_cents: i64,
    pub status: AccountStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_paise(self.balance_cents)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub branch: Option<String>,
    /// Recorded as the first credit entry so the ledger invariant holds.
    #[serde(default)]
    pub opening_balance_cents: i64,
    #[serde(default)]
    pub status: AccountStatus,
}

impl NewAccount {
    pub fn normalized(&self) -> ValidationResult<NewAccount> {
        validate_name("name", &self.name, 100)?;
        if self.opening_balance_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "opening balance".to_string(),
            });
        }
        Ok(NewAccount {
            name: normalize_name(&self.name),
            ..self.clone()
        })
    }
}

/// Direction of an account transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TransactionKind {
    Credit,
    Debit,
}

/// An append-only entry in an account's transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccountTransaction {
    pub id: String,
    pub account_id: String,
    pub kind: TransactionKind,
    /// Always positive; direction comes from `kind`.
    pub amount_cents: i64,
    pub description: Option<String>,
    /// External transaction id (UPI ref, cheque number, ...).
    pub reference: Option<String>,
    pub invoice_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl AccountTransaction {
    /// Signed effect of this entry on the balance.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Credit => Money::from_paise(self.amount_cents),
            TransactionKind::Debit => Money::from_paise(-self.amount_cents),
        }
    }
}

// =============================================================================
// Party (Customer / Supplier)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Designation {
    #[default]
    Customer,
    Supplier,
}

impl std::fmt::Display for Designation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Designation::Customer => write!(f, "customer"),
            Designation::Supplier => write!(f, "supplier"),
        }
    }
}

/// A customer or supplier.
///
/// ## Balance Sign Convention
/// A positive `balance_cents` is money the party owes the shop. A sale adds
/// the invoice's due amount; a purchase subtracts it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub email: Option<String>,
    pub address: String,
    pub designation: Designation,
    pub balance_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Party {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_paise(self.balance_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewParty {
    pub name: String,
    pub mobile_number: String,
    pub email: Option<String>,
    pub address: String,
    #[serde(default)]
    pub designation: Designation,
}

impl NewParty {
    pub fn normalized(&self) -> ValidationResult<NewParty> {
        validate_name("name", &self.name, 100)?;
        validate_mobile_number(&self.mobile_number)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "address".to_string(),
            });
        }
        Ok(NewParty {
            name: normalize_name(&self.name),
            mobile_number: self.mobile_number.trim().to_string(),
            email: self.email.as_deref().map(|e| e.trim().to_lowercase()),
            address: self.address.trim().to_string(),
            designation: self.designation,
        })
    }
}

/// Typed allow-list of contact fields that may be patched on a party.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PartyContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub designation: Option<Designation>,
}

impl PartyContactPatch {
    pub fn normalized(&self) -> ValidationResult<PartyContactPatch> {
        if let Some(name) = &self.name {
            validate_name("name", name, 100)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(address) = &self.address {
            if address.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "address".to_string(),
                });
            }
        }
        Ok(PartyContactPatch {
            name: self.name.as_deref().map(normalize_name),
            email: self.email.as_deref().map(|e| e.trim().to_lowercase()),
            address: self.address.as_deref().map(|a| a.trim().to_string()),
            designation: self.designation,
        })
    }
}

// =============================================================================
// Staff User
// =============================================================================

/// A member of staff who issues invoices.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StaffUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewStaffUser {
    pub name: String,
    pub email: String,
}

impl NewStaffUser {
    pub fn normalized(&self) -> ValidationResult<NewStaffUser> {
        validate_name("name", &self.name, 100)?;
        validate_email(&self.email)?;
        Ok(NewStaffUser {
            name: normalize_name(&self.name),
            email: self.email.trim().to_lowercase(),
        })
    }
}

// =============================================================================
// History Ledger
// =============================================================================

/// An append-only history entry on a party or staff user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    /// Party id or staff user id, depending on which log the entry lives in.
    pub owner_id: String,
    pub invoice_id: String,
    pub invoice_kind: InvoiceKind,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// Total payable amount of the invoice.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, threshold: Option<i64>, tracked: bool) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            name: "usb cable".to_string(),
            item_code: None,
            unit: ProductUnit::Pcs,
            purchase_price_cents: 6000,
            sale_price_cents: 10_000,
            min_sale_price_cents: None,
            mrp_cents: None,
            sale_discount_bps: None,
            low_stock_threshold: threshold,
            stock_quantity: stock,
            track_inventory: tracked,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_for_kind() {
        let p = product(10, None, true);
        assert_eq!(p.price_for(InvoiceKind::Sale).paise(), 10_000);
        assert_eq!(p.price_for(InvoiceKind::Purchase).paise(), 6000);
    }

    #[test]
    fn test_can_fulfil() {
        assert!(product(5, None, true).can_fulfil(5));
        assert!(!product(4, None, true).can_fulfil(5));
        assert!(product(-3, None, false).can_fulfil(5));
    }

    #[test]
    fn test_low_stock_signal() {
        assert!(product(0, None, true).is_low_stock());
        assert!(!product(1, None, true).is_low_stock());
        assert!(product(3, Some(5), true).is_low_stock());
        assert!(!product(-1, None, false).is_low_stock());
    }

    #[test]
    fn test_new_product_normalizes_names() {
        let input = NewProduct {
            name: "  USB Cable ".to_string(),
            item_code: Some(" UC-01 ".to_string()),
            unit: ProductUnit::Pcs,
            purchase_price_cents: 6000,
            sale_price_cents: 10_000,
            min_sale_price_cents: None,
            mrp_cents: None,
            sale_discount_bps: None,
            low_stock_threshold: None,
            opening_stock: 10,
            track_inventory: true,
        };
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.name, "usb cable");
        assert_eq!(normalized.item_code.as_deref(), Some("uc-01"));
    }

    #[test]
    fn test_new_product_rejects_negative_price() {
        let input = NewProduct {
            name: "cable".to_string(),
            item_code: None,
            unit: ProductUnit::Pcs,
            purchase_price_cents: -1,
            sale_price_cents: 100,
            min_sale_price_cents: None,
            mrp_cents: None,
            sale_discount_bps: None,
            low_stock_threshold: None,
            opening_stock: 0,
            track_inventory: true,
        };
        assert!(input.normalized().is_err());
    }

    #[test]
    fn test_pricing_patch_is_empty() {
        assert!(ProductPricingPatch::default().is_empty());
        let patch = ProductPricingPatch {
            sale_price_cents: Some(100),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_new_account_rejects_negative_opening_balance() {
        let input = NewAccount {
            name: "Cash Drawer".to_string(),
            account_type: AccountType::Cash,
            account_number: None,
            ifsc_code: None,
            branch: None,
            opening_balance_cents: -100,
            status: AccountStatus::Active,
        };
        assert!(input.normalized().is_err());
    }

    #[test]
    fn test_signed_amount() {
        let entry = AccountTransaction {
            id: "t1".to_string(),
            account_id: "a1".to_string(),
            kind: TransactionKind::Debit,
            amount_cents: 250,
            description: None,
            reference: None,
            invoice_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(entry.signed_amount().paise(), -250);
    }

    #[test]
    fn test_new_party_validates_mobile() {
        let input = NewParty {
            name: "Ravi Kumar".to_string(),
            mobile_number: "12345".to_string(),
            email: None,
            address: "Main Road".to_string(),
            designation: Designation::Customer,
        };
        assert!(input.normalized().is_err());
    }
}
