//! # pharmarx-core: Pure Business Logic for PharmaRx
//!
//! This crate is the **heart** of PharmaRx. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       PharmaRx Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 pharmarx-billing (Coordinator)                  │   │
//! │  │   create_bill, next_invoice_number, expiry sweep                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ pharmarx-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │ reconcile │  │   money   │  │  invoice  │  │ validation│   │   │
//! │  │   │ purchased │  │   Money   │  │ INV/PRET  │  │   rules   │   │   │
//! │  │   │ −sold−ret │  │  Percent  │  │  numbers  │  │  checks   │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  pharmarx-db (Database Layer)                   │   │
//! │  │          SQLite ledgers, inventory, migrations                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryRecord, bills, line items)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Stock key normalization (one rule for every flow)
//! - [`reconcile`] - The quantity reconciliation engine
//! - [`invoice`] - Invoice number generation (INV…/PRET…)
//! - [`request`] - Tagged bill request payloads + boundary validation
//! - [`validation`] - Field-level validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod reconcile;
pub mod request;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{LineAmounts, Money};
pub use reconcile::{reconcile, LedgerLine, ReconciliationResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single bill.
///
/// ## Business Reason
/// Prevents runaway payloads; a pharmacy counter bill never has hundreds
/// of distinct lines.
pub const MAX_BILL_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-entry (e.g., typing 10000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum discount/GST rate in basis points (10000 bps = 100%).
///
/// ## Business Reason
/// A discount above 100% would freeze negative net amounts into the
/// ledger; no tax slab exceeds 100% either.
pub const MAX_RATE_BPS: u32 = 10_000;
