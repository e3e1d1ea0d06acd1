//! End-to-end billing flows against an in-memory database: every bill kind,
//! the stock bounds that reject them, invoice numbering, and the expiry
//! sweep.

use chrono::{Duration, NaiveDate, Utc};

use pharmarx_billing::{BillingError, BillingService, CreatedBill, ExpirySweeper};
use pharmarx_core::request::{
    BillRequest, PurchaseBillRequest, PurchaseLineRequest, PurchaseReturnBillRequest,
    ReturnLineRequest, SaleBillRequest, SaleLineRequest, SaleReturnBillRequest,
};
use pharmarx_core::CoreError;
use pharmarx_db::{Database, DbConfig};

const OWNER: &str = "owner@pharmacy.com";
const SUPPLIER: &str = "HealthKart Distributors";
const CUSTOMER_GST: &str = "27AAPFU0939F1ZV";

async fn service() -> BillingService {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    BillingService::new(db)
}

fn bill_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
}

fn purchase_line(item: &str, batch: &str, qty: i64) -> PurchaseLineRequest {
    PurchaseLineRequest {
        item_name: item.to_string(),
        batch: batch.to_string(),
        quantity: qty,
        purchase_rate_cents: 900,
        mrp_cents: 1250,
        discount_bps: 0,
        gst_bps: 1200,
        expiry_date: Some(NaiveDate::from_ymd_opt(2027, 12, 31).unwrap()),
        pack: Some("10x10".to_string()),
        description: None,
    }
}

fn purchase_request(invoice: &str, items: Vec<PurchaseLineRequest>) -> PurchaseBillRequest {
    PurchaseBillRequest {
        invoice_number: invoice.to_string(),
        party_name: SUPPLIER.to_string(),
        bill_date: bill_date(),
        items,
    }
}

fn sale_line(item: &str, batch: &str, qty: i64) -> SaleLineRequest {
    SaleLineRequest {
        item_name: item.to_string(),
        batch: batch.to_string(),
        quantity: qty,
        mrp_cents: 1250,
        discount_bps: 0,
        gst_bps: 1200,
        gst_number: CUSTOMER_GST.to_string(),
    }
}

fn sale_request(invoice: &str, items: Vec<SaleLineRequest>) -> SaleBillRequest {
    SaleBillRequest {
        invoice_number: invoice.to_string(),
        party_name: "Ravi Medical Stores".to_string(),
        bill_date: bill_date(),
        items,
    }
}

fn return_line(item: &str, batch: &str, qty: i64) -> ReturnLineRequest {
    ReturnLineRequest {
        item_name: item.to_string(),
        batch: batch.to_string(),
        quantity: qty,
    }
}

// =============================================================================
// Purchase → inventory
// =============================================================================

#[tokio::test]
async fn purchase_creates_and_tops_up_inventory() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 40)]))
        .await
        .unwrap();
    svc.create_purchase_bill(OWNER, purchase_request("S-101", vec![purchase_line("crocin", "b1", 60)]))
        .await
        .unwrap();

    // Case-insensitive key: one record, summed quantity.
    let record = svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "B1")
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.quantity, 100);
    assert_eq!(record.purchase_rate_cents, 900);
}

#[tokio::test]
async fn duplicate_purchase_invoice_is_a_conflict() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();
    let err = svc
        .create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Dolo", "B2", 10)]))
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::Conflict(_)), "got {err:?}");
}

// =============================================================================
// Sale
// =============================================================================

#[tokio::test]
async fn sale_depletes_stock_and_rejects_oversell() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();

    svc.create_sale_bill(OWNER, sale_request("INV005", vec![sale_line("Crocin", "B1", 7)]))
        .await
        .unwrap();

    // Only 3 left; the next sale of 5 must fail with the live quantity in
    // the error, and nothing from the failed bill may be written.
    let err = svc
        .create_sale_bill(OWNER, sale_request("INV006", vec![sale_line("Crocin", "B1", 5)]))
        .await
        .unwrap_err();
    match err {
        BillingError::Core(CoreError::InsufficientStock {
            available, requested, ..
        }) => {
            assert_eq!(available, 3);
            assert_eq!(requested, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    let record = svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "B1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity, 3);
    assert!(svc
        .database()
        .sales()
        .find_by_invoice(OWNER, "INV006")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn sale_of_unknown_item_is_rejected_whole() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();

    // Second line has no inventory record: the whole bill must roll back,
    // including the first line's already-applied decrement.
    let err = svc
        .create_sale_bill(
            OWNER,
            sale_request(
                "INV005",
                vec![sale_line("Crocin", "B1", 2), sale_line("Dolo", "B9", 1)],
            ),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, BillingError::Core(CoreError::NotInInventory { .. })),
        "got {err:?}"
    );

    let record = svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "B1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity, 10, "failed sale must not take stock");
}

#[tokio::test]
async fn sale_requires_one_gst_number_and_appends_history() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();

    let mut mismatched = sale_request("INV005", vec![sale_line("Crocin", "B1", 1)]);
    let mut other = sale_line("Crocin", "B1", 1);
    other.gst_number = "29ZZZZZ9999Z9Z9".to_string();
    mismatched.items.push(other);

    let err = svc.create_sale_bill(OWNER, mismatched).await.unwrap_err();
    assert!(
        matches!(err, BillingError::Core(CoreError::GstMismatch { .. })),
        "got {err:?}"
    );

    svc.create_sale_bill(OWNER, sale_request("INV005", vec![sale_line("Crocin", "B1", 4)]))
        .await
        .unwrap();

    let history = svc
        .database()
        .history()
        .for_customer(OWNER, CUSTOMER_GST)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].invoice_number, "INV005");
    assert_eq!(history[0].quantity, 4);
}

// =============================================================================
// Invoice numbering
// =============================================================================

#[tokio::test]
async fn invoice_numbers_start_at_default_and_increment() {
    let svc = service().await;

    assert_eq!(svc.next_sale_invoice_number(OWNER).await.unwrap(), "INV005");

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();
    svc.create_sale_bill(OWNER, sale_request("INV005", vec![sale_line("Crocin", "B1", 1)]))
        .await
        .unwrap();

    assert_eq!(svc.next_sale_invoice_number(OWNER).await.unwrap(), "INV006");
}

#[tokio::test]
async fn invoice_numbering_survives_the_pad_width() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();

    svc.create_sale_bill(OWNER, sale_request("INV999", vec![sale_line("Crocin", "B1", 1)]))
        .await
        .unwrap();
    assert_eq!(svc.next_sale_invoice_number(OWNER).await.unwrap(), "INV1000");

    // As a plain string "INV1000" sorts before "INV999"; the generator
    // must still move past it instead of re-issuing it forever.
    svc.create_sale_bill(OWNER, sale_request("INV1000", vec![sale_line("Crocin", "B1", 1)]))
        .await
        .unwrap();
    assert_eq!(svc.next_sale_invoice_number(OWNER).await.unwrap(), "INV1001");
}

// =============================================================================
// Sale return
// =============================================================================

#[tokio::test]
async fn sale_return_is_bounded_by_the_original_bill() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();
    svc.create_sale_bill(OWNER, sale_request("INV005", vec![sale_line("Crocin", "B1", 6)]))
        .await
        .unwrap();

    let returns = |items| SaleReturnBillRequest {
        origin_invoice: "INV005".to_string(),
        party_name: "Ravi Medical Stores".to_string(),
        bill_date: bill_date(),
        items,
    };

    // Unknown origin invoice.
    let mut missing = returns(vec![return_line("Crocin", "B1", 1)]);
    missing.origin_invoice = "INV999".to_string();
    assert!(matches!(
        svc.create_sale_return_bill(OWNER, missing).await.unwrap_err(),
        BillingError::NotFound { .. }
    ));

    // Item never on the bill.
    assert!(matches!(
        svc.create_sale_return_bill(OWNER, returns(vec![return_line("Dolo", "B9", 1)]))
            .await
            .unwrap_err(),
        BillingError::Core(CoreError::NotOnOriginalBill { .. })
    ));

    // More than was sold.
    assert!(matches!(
        svc.create_sale_return_bill(OWNER, returns(vec![return_line("crocin", "b1", 7)]))
            .await
            .unwrap_err(),
        BillingError::Core(CoreError::ExceedsOriginal { original: 6, .. })
    ));

    // Valid return restocks (case-insensitive match against the bill).
    let bill = svc
        .create_sale_return_bill(OWNER, returns(vec![return_line("CROCIN", "b1", 2)]))
        .await
        .unwrap();
    assert_eq!(bill.origin_invoice, "INV005");
    assert!(bill.invoice_number.starts_with("SRET"));

    let record = svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "B1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity, 6); // 10 − 6 sold + 2 returned
}

// =============================================================================
// Purchase return
// =============================================================================

#[tokio::test]
async fn purchase_return_is_bounded_by_reconciliation() {
    let svc = service().await;

    // purchased 100, sold 40 → returnable 60
    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 100)]))
        .await
        .unwrap();
    svc.create_sale_bill(OWNER, sale_request("INV005", vec![sale_line("Crocin", "B1", 40)]))
        .await
        .unwrap();

    let request = |qty| PurchaseReturnBillRequest {
        party_name: SUPPLIER.to_string(),
        bill_date: bill_date(),
        items: vec![return_line("Crocin", "B1", qty)],
    };

    let err = svc
        .create_purchase_return_bill(OWNER, request(61))
        .await
        .unwrap_err();
    match err {
        BillingError::Core(CoreError::ExceedsReturnable {
            returnable,
            requested,
            ..
        }) => {
            assert_eq!(returnable, 60);
            assert_eq!(requested, 61);
        }
        other => panic!("expected ExceedsReturnable, got {other:?}"),
    }

    let bill = svc
        .create_purchase_return_bill(OWNER, request(50))
        .await
        .unwrap();
    assert!(bill.invoice_number.starts_with("PRET"));
    assert_eq!(bill.invoice_number.len(), 10);
    // Amounts at the purchase rate, not MRP: 50 × 9.00
    assert_eq!(bill.totals.net_cents, 45_000);

    // Ledger history now shows 50 already returned: only 10 left.
    let remaining = svc.returnable_stock(OWNER, SUPPLIER).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].returnable_qty, 10);

    let record = svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "B1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity, 10); // 100 − 40 − 50
}

#[tokio::test]
async fn purchase_return_to_unknown_supplier_is_rejected() {
    let svc = service().await;

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();

    let request = PurchaseReturnBillRequest {
        party_name: "Some Other Distributor".to_string(),
        bill_date: bill_date(),
        items: vec![return_line("Crocin", "B1", 1)],
    };

    // Never purchased from this supplier → returnable 0 for the key.
    assert!(matches!(
        svc.create_purchase_return_bill(OWNER, request).await.unwrap_err(),
        BillingError::Core(CoreError::ExceedsReturnable { returnable: 0, .. })
    ));
}

// =============================================================================
// Tagged dispatch
// =============================================================================

#[tokio::test]
async fn create_bill_dispatches_on_the_tagged_variant() {
    let svc = service().await;

    let json = format!(
        r#"{{
            "kind": "purchase",
            "invoice_number": "S-100",
            "party_name": "{SUPPLIER}",
            "bill_date": "2026-08-25",
            "items": [{{
                "item_name": "Crocin", "batch": "B1", "quantity": 10,
                "purchase_rate_cents": 900, "mrp_cents": 1250,
                "expiry_date": null, "pack": null, "description": null
            }}]
        }}"#
    );
    let request: BillRequest = serde_json::from_str(&json).unwrap();

    let created = svc.create_bill(OWNER, request).await.unwrap();
    assert!(matches!(created, CreatedBill::Purchase(_)));
    assert_eq!(created.invoice_number(), "S-100");
}

#[tokio::test]
async fn empty_bill_is_a_missing_field() {
    let svc = service().await;

    let err = svc
        .create_purchase_bill(OWNER, purchase_request("S-100", vec![]))
        .await
        .unwrap_err();
    assert!(
        matches!(err, BillingError::Core(CoreError::MissingField { ref field }) if field == "items"),
        "got {err:?}"
    );
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn concurrent_sales_cannot_oversell_the_same_batch() {
    // A file-backed database with a real pool, so both sales can hold a
    // connection at once (the in-memory config is pinned to one).
    let path = std::env::temp_dir().join(format!(
        "pharmarx-race-{}-{}.db",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let db = Database::new(DbConfig::new(&path)).await.unwrap();
    let svc = BillingService::new(db);

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![purchase_line("Crocin", "B1", 10)]))
        .await
        .unwrap();

    // Two sales of 7 against a stock of 10: whatever the interleaving,
    // exactly one may win.
    let first = svc.clone();
    let second = svc.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            first
                .create_sale_bill(OWNER, sale_request("INV005", vec![sale_line("Crocin", "B1", 7)]))
                .await
        }),
        tokio::spawn(async move {
            second
                .create_sale_bill(OWNER, sale_request("INV006", vec![sale_line("Crocin", "B1", 7)]))
                .await
        }),
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1, "{outcomes:?}");

    let record = svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "B1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity, 3);

    svc.database().close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

// =============================================================================
// Expiry sweep
// =============================================================================

#[tokio::test]
async fn expiry_sweep_archives_expired_batches_once() {
    let svc = service().await;
    let today = Utc::now().date_naive();

    let mut expired = purchase_line("Crocin", "OLD", 25);
    expired.expiry_date = Some(today - Duration::days(10));
    let fresh = purchase_line("Crocin", "NEW", 30);

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![expired, fresh]))
        .await
        .unwrap();

    let sweeper = ExpirySweeper::new(svc.database().clone());
    let swept = sweeper.sweep_expired(today).await.unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].batch, "OLD");
    assert_eq!(swept[0].quantity, 25);

    // The expired record is gone from inventory, the fresh one stays.
    assert!(svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "OLD")
        .await
        .unwrap()
        .is_none());
    assert!(svc
        .database()
        .inventory()
        .get(OWNER, "Crocin", "NEW")
        .await
        .unwrap()
        .is_some());

    let archived = svc.database().expiry().list_for_owner(OWNER).await.unwrap();
    assert_eq!(archived.len(), 1);

    // A second sweep finds nothing: archiving is once-only.
    assert!(sweeper.sweep_expired(today).await.unwrap().is_empty());
}

#[tokio::test]
async fn near_expiry_notices_cover_the_window() {
    let svc = service().await;
    let today = Utc::now().date_naive();

    let mut soon = purchase_line("Crocin", "SOON", 5);
    soon.expiry_date = Some(today + Duration::days(7));
    let mut far = purchase_line("Crocin", "FAR", 5);
    far.expiry_date = Some(today + Duration::days(200));

    svc.create_purchase_bill(OWNER, purchase_request("S-100", vec![soon, far]))
        .await
        .unwrap();

    let expiring = svc
        .database()
        .inventory()
        .list_expiring_between(today, today + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].batch, "SOON");

    // One owner with expiring stock → one notice delivered.
    let sweeper = ExpirySweeper::new(svc.database().clone());
    assert_eq!(sweeper.notify_near_expiry(today).await.unwrap(), 1);
}
