//! # Bill Request Payloads
//!
//! Each bill kind is a tagged variant with an explicit schema, validated at
//! the boundary before it reaches the transaction coordinator. Nothing
//! loosely-shaped crosses into business logic.
//!
//! ## Wire Shape
//! ```json
//! { "kind": "sale",
//!   "invoice_number": "INV005",
//!   "party_name": "Ravi Medical Stores",
//!   "bill_date": "2026-08-25",
//!   "items": [ { "item_name": "Crocin", "batch": "B42", "quantity": 2,
//!                "mrp_cents": 1250, "discount_bps": 500,
//!                "gst_bps": 1200, "gst_number": "27AAPFU0939F1ZV" } ] }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::{
    parse_quantity, validate_batch, validate_gst_number, validate_item_name, validate_quantity,
    validate_rate_bps, validate_rate_cents, validate_required,
};
use crate::MAX_BILL_LINES;

/// Historical clients send quantities as strings ("12"), current ones as
/// numbers. Accept both; text goes through the parse-or-zero rule and a
/// zero is then rejected by quantity validation.
fn quantity_from_payload<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawQuantity {
        Number(i64),
        Text(String),
    }

    Ok(match RawQuantity::deserialize(deserializer)? {
        RawQuantity::Number(qty) => qty,
        RawQuantity::Text(raw) => parse_quantity(&raw),
    })
}

// =============================================================================
// Line Item Requests (one schema per bill kind)
// =============================================================================

/// One purchased line: establishes or tops up an inventory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLineRequest {
    pub item_name: String,
    pub batch: String,
    #[serde(deserialize_with = "quantity_from_payload")]
    pub quantity: i64,
    pub purchase_rate_cents: i64,
    pub mrp_cents: i64,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub gst_bps: u32,
    pub expiry_date: Option<NaiveDate>,
    pub pack: Option<String>,
    pub description: Option<String>,
}

/// One sold line. Carries the customer GST number; all lines on a sale
/// must agree on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub item_name: String,
    pub batch: String,
    #[serde(deserialize_with = "quantity_from_payload")]
    pub quantity: i64,
    pub mrp_cents: i64,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub gst_bps: u32,
    pub gst_number: String,
}

/// One returned line (sale-return or purchase-return): just the stock key
/// and the quantity. Rates come from the original ledger, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLineRequest {
    pub item_name: String,
    pub batch: String,
    #[serde(deserialize_with = "quantity_from_payload")]
    pub quantity: i64,
}

// =============================================================================
// Bill Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseBillRequest {
    /// The supplier's invoice number.
    pub invoice_number: String,
    /// Supplier name.
    pub party_name: String,
    pub bill_date: NaiveDate,
    pub items: Vec<PurchaseLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleBillRequest {
    /// Sale invoice number (`INV…`), normally obtained from
    /// the next-invoice-number operation.
    pub invoice_number: String,
    /// Customer/party name.
    pub party_name: String,
    pub bill_date: NaiveDate,
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReturnBillRequest {
    /// The originating sale invoice being returned against.
    pub origin_invoice: String,
    /// Customer/party name.
    pub party_name: String,
    pub bill_date: NaiveDate,
    pub items: Vec<ReturnLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReturnBillRequest {
    /// Supplier the stock goes back to; scopes the reconciliation.
    pub party_name: String,
    pub bill_date: NaiveDate,
    pub items: Vec<ReturnLineRequest>,
}

/// A bill-creation request: a discriminated union over the four bill kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillRequest {
    Purchase(PurchaseBillRequest),
    Sale(SaleBillRequest),
    SaleReturn(SaleReturnBillRequest),
    PurchaseReturn(PurchaseReturnBillRequest),
}

// =============================================================================
// Boundary Validation
// =============================================================================

fn validate_line_count(count: usize) -> CoreResult<()> {
    if count == 0 {
        return Err(CoreError::MissingField {
            field: "items".to_string(),
        });
    }
    if count > MAX_BILL_LINES {
        return Err(CoreError::Validation(
            crate::error::ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_BILL_LINES as i64,
            },
        ));
    }
    Ok(())
}

impl PurchaseBillRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_required("invoice_number", &self.invoice_number, 50)?;
        validate_required("party_name", &self.party_name, 200)?;
        validate_line_count(self.items.len())?;

        for line in &self.items {
            validate_item_name(&line.item_name)?;
            validate_batch(&line.batch)?;
            validate_quantity(line.quantity)?;
            validate_rate_cents("purchase_rate", line.purchase_rate_cents)?;
            validate_rate_cents("mrp", line.mrp_cents)?;
            validate_rate_bps("discount", line.discount_bps)?;
            validate_rate_bps("gst", line.gst_bps)?;
        }

        Ok(())
    }
}

impl SaleBillRequest {
    /// Validates the request and returns the single GST number shared by
    /// every line item. Mixed GST numbers are a business-rule violation.
    pub fn validate(&self) -> CoreResult<String> {
        validate_required("invoice_number", &self.invoice_number, 50)?;
        validate_required("party_name", &self.party_name, 200)?;
        validate_line_count(self.items.len())?;

        let mut bill_gst: Option<String> = None;
        for line in &self.items {
            validate_item_name(&line.item_name)?;
            validate_batch(&line.batch)?;
            validate_quantity(line.quantity)?;
            validate_rate_cents("mrp", line.mrp_cents)?;
            validate_rate_bps("discount", line.discount_bps)?;
            validate_rate_bps("gst", line.gst_bps)?;
            validate_gst_number(&line.gst_number)?;

            let gst = line.gst_number.trim().to_uppercase();
            match &bill_gst {
                None => bill_gst = Some(gst),
                Some(expected) if *expected != gst => {
                    return Err(CoreError::GstMismatch {
                        expected: expected.clone(),
                        found: gst,
                    });
                }
                Some(_) => {}
            }
        }

        // validate_line_count guarantees at least one line.
        Ok(bill_gst.unwrap_or_default())
    }
}

impl SaleReturnBillRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_required("origin_invoice", &self.origin_invoice, 50)?;
        validate_required("party_name", &self.party_name, 200)?;
        validate_line_count(self.items.len())?;

        for line in &self.items {
            validate_item_name(&line.item_name)?;
            validate_batch(&line.batch)?;
            validate_quantity(line.quantity)?;
        }

        Ok(())
    }
}

impl PurchaseReturnBillRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_required("party_name", &self.party_name, 200)?;
        validate_line_count(self.items.len())?;

        for line in &self.items {
            validate_item_name(&line.item_name)?;
            validate_batch(&line.batch)?;
            validate_quantity(line.quantity)?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
