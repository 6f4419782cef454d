//! # Settlement Request
//!
//! The payload a caller hands to the settlement engine, and its pure
//! validation. Everything here runs before a database connection is taken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::invoice::{BillTo, InvoiceKind, InvoiceType};
use crate::validation::{
    validate_discount_bps, validate_invoice_number, validate_item_count, validate_note,
    validate_payment_amount, validate_price_cents, validate_quantity, validate_reference,
};

/// One requested line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the catalog price when present.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    /// Line discount in basis points.
    #[serde(default)]
    pub discount_bps: Option<u32>,
}

/// One payment routed to a ledger account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentInstruction {
    pub account_id: String,
    pub amount_cents: i64,
    /// External transaction id (UPI ref, cheque number, ...).
    #[serde(default)]
    pub reference: Option<String>,
}

/// A request to settle a sale or purchase invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettlementRequest {
    #[serde(default)]
    pub kind: InvoiceKind,

    #[serde(default)]
    pub invoice_type: InvoiceType,

    /// Caller-chosen number; assigned from the sequence when absent.
    #[serde(default)]
    pub invoice_number: Option<String>,

    /// Invoice date; defaults to the settlement time.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub place_of_supply: Option<String>,

    #[serde(default)]
    pub bill_to: BillTo,

    /// Required when `bill_to` is `party`; ignored for cash.
    #[serde(default)]
    pub party_id: Option<String>,

    pub items: Vec<ItemRequest>,

    /// Invoice-level discount in paise.
    #[serde(default)]
    pub discount_amount_cents: i64,

    #[serde(default)]
    pub payments: Vec<PaymentInstruction>,

    #[serde(default)]
    pub private_note: Option<String>,

    #[serde(default)]
    pub party_note: Option<String>,

    #[serde(default)]
    pub delivery_term: Option<String>,

    /// Issuing staff user.
    pub staff_id: String,
}

impl SettlementRequest {
    /// Checks every rule that needs no stored state.
    ///
    /// The discount-versus-total check needs resolved prices and happens
    /// later, in [`crate::invoice::InvoiceTotals::compute`].
    pub fn validate(&self) -> CoreResult<()> {
        validate_reference("staff id", &self.staff_id)?;
        validate_item_count(self.items.len())?;

        for item in &self.items {
            validate_reference("product id", &item.product_id)?;
            validate_quantity(item.quantity)?;
            if let Some(price) = item.unit_price_cents {
                validate_price_cents("unit price", price)?;
            }
            if let Some(bps) = item.discount_bps {
                validate_discount_bps(bps)?;
            }
        }

        if self.discount_amount_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "discount amount".to_string(),
            }
            .into());
        }

        for payment in &self.payments {
            validate_reference("account id", &payment.account_id)?;
            validate_payment_amount(payment.amount_cents)?;
        }

        if self.bill_to == BillTo::Party {
            match self.party_id.as_deref() {
                Some(id) => validate_reference("party id", id)?,
                None => {
                    return Err(ValidationError::Required {
                        field: "party id".to_string(),
                    }
                    .into())
                }
            }
        }

        if let Some(number) = &self.invoice_number {
            validate_invoice_number(number)?;
        }

        validate_note("private note", self.private_note.as_deref())?;
        validate_note("party note", self.party_note.as_deref())?;
        validate_note("delivery term", self.delivery_term.as_deref())?;
        validate_note("place of supply", self.place_of_supply.as_deref())?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ErrorKind};

    fn request() -> SettlementRequest {
        SettlementRequest {
            kind: InvoiceKind::Sale,
            invoice_type: InvoiceType::NonGst,
            invoice_number: None,
            date: None,
            due_date: None,
            place_of_supply: None,
            bill_to: BillTo::Cash,
            party_id: None,
            items: vec![ItemRequest {
                product_id: "p1".to_string(),
                quantity: 2,
                unit_price_cents: None,
                discount_bps: None,
            }],
            discount_amount_cents: 0,
            payments: vec![],
            private_note: None,
            party_note: None,
            delivery_term: None,
            staff_id: "s1".to_string(),
        }
    }

    fn kind_of(req: &SettlementRequest) -> ErrorKind {
        req.validate().unwrap_err().kind()
    }

    #[test]
    fn test_valid_cash_sale() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut req = request();
        req.items.clear();
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut req = request();
        req.items[0].quantity = 0;
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let mut req = request();
        req.payments.push(PaymentInstruction {
            account_id: "a1".to_string(),
            amount_cents: 0,
            reference: None,
        });
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_price_override_above_cap_rejected() {
        let mut req = request();
        req.items[0].unit_price_cents = Some(i64::MAX / 2 + 1);
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);

        req.items[0].unit_price_cents = Some(crate::MAX_PRICE_CENTS);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_payment_above_cap_rejected() {
        let mut req = request();
        req.payments.push(PaymentInstruction {
            account_id: "a1".to_string(),
            amount_cents: i64::MAX,
            reference: None,
        });
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_negative_discount_rejected() {
        let mut req = request();
        req.discount_amount_cents = -1;
        assert!(matches!(
            req.validate(),
            Err(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[test]
    fn test_line_discount_over_100_percent_rejected() {
        let mut req = request();
        req.items[0].discount_bps = Some(10_001);
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_party_bill_requires_party_id() {
        let mut req = request();
        req.bill_to = BillTo::Party;
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);

        req.party_id = Some("c1".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_staff_id_required() {
        let mut req = request();
        req.staff_id = "  ".to_string();
        assert_eq!(kind_of(&req), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_deserializes_camel_case_with_defaults() {
        let json = r#"{
            "items": [{"productId": "p1", "quantity": 2}],
            "payments": [{"accountId": "a1", "amountCents": 20000}],
            "staffId": "s1"
        }"#;
        let req: SettlementRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, InvoiceKind::Sale);
        assert_eq!(req.bill_to, BillTo::Cash);
        assert_eq!(req.discount_amount_cents, 0);
        assert_eq!(req.payments[0].amount_cents, 20_000);
        assert!(req.validate().is_ok());
    }
}
