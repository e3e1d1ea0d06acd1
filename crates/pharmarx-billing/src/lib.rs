//! # pharmarx-billing: Bill Transaction Coordinator
//!
//! The service layer of PharmaRx: turns validated bill requests into
//! atomic ledger + inventory writes, and runs the expiry sweep.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              ★ pharmarx-billing (THIS CRATE) ★                          │
//! │                                                                         │
//! │   ┌──────────────────────┐      ┌──────────────────────┐                │
//! │   │    BillingService    │      │    ExpirySweeper     │                │
//! │   │ create_bill (4 kinds)│      │ sweep + near-expiry  │                │
//! │   │ next invoice number  │      │ notices (Notifier)   │                │
//! │   │ returnable stock     │      └──────────────────────┘                │
//! │   └──────────────────────┘                                              │
//! │              │ validation: pharmarx-core                                │
//! │              │ storage:    pharmarx-db (transactions begin here)        │
//! └──────────────┴──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Taxonomy
//! Every operation fails with a [`BillingError`]: validation failures
//! (including missing fields) before anything is written, NotFound for
//! absent references, Conflict when a concurrent write wins, Storage when
//! the database fails. Partial writes are impossible - each bill is one
//! transaction.

pub mod error;
pub mod expiry;
pub mod notify;
pub mod service;

pub use error::{BillingError, BillingResult};
pub use expiry::ExpirySweeper;
pub use notify::{LogNotifier, Notifier, NotifyError};
pub use service::{BillingService, CreatedBill};
