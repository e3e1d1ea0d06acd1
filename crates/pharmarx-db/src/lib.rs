//! # pharmarx-db: Database Layer for PharmaRx
//!
//! SQLite persistence for the ledger tables (append-only bills), the
//! mutable inventory table, customer purchase history and expiry records.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          pharmarx-db                                    │
//! │                                                                         │
//! │  Database (pool.rs)                                                     │
//! │  ├── InventoryRepository  - the only mutable table; atomic              │
//! │  │                          conditional decrements                      │
//! │  ├── PurchaseRepository   - purchase + purchase-return ledgers          │
//! │  ├── SaleRepository       - sale + sale-return ledgers                  │
//! │  ├── HistoryRepository    - customer purchase history (reporting)       │
//! │  └── ExpiryRepository     - sweep snapshots                             │
//! │                                                                         │
//! │  migrations.rs - embedded SQL migrations                                │
//! │  error.rs      - DbError mapping from sqlx                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Model
//! Read-only operations take `&self` and run on the pool. Write operations
//! take a `&mut SqliteConnection`, so the billing coordinator can wrap a
//! whole bill (ledger insert + inventory mutation + history append) in one
//! transaction that commits or rolls back as a unit.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::expiry::ExpiryRepository;
pub use repository::history::HistoryRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
