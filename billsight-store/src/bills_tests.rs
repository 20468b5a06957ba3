//! Bill repository tests against in-memory and on-disk SQLite.

use billsight_core::{Category, LineItem};
use tempfile::TempDir;

use crate::bills::{BillRepository, BillStore, NewBill};
use crate::error::StoreError;

fn acme_bill() -> NewBill {
    NewBill {
        merchant_name: "Acme Market".to_string(),
        bill_date: "2024-03-01".to_string(),
        total_amount: 15.5,
        currency: "USD".to_string(),
        image_path: Some("/tmp/acme.png".to_string()),
        quality_score: None,
        confidence_score: 0.92,
        model_used: "openrouter_gemini".to_string(),
        fallback_used: false,
        processing_time_secs: 3.25,
    }
}

fn acme_items() -> Vec<LineItem> {
    vec![
        LineItem::new("Milk", 3.5, Category::Groceries, 0.95),
        LineItem::new("Sandwich", 12.0, Category::Dining, 0.9),
    ]
}

#[test]
fn test_save_and_get_bill() {
    let store = BillStore::open_in_memory().unwrap();

    let id = store.save_bill(&acme_bill()).unwrap();
    let bill = store.get_bill(id).unwrap();

    assert_eq!(bill.id, id);
    assert_eq!(bill.merchant_name, "Acme Market");
    assert_eq!(bill.bill_date, "2024-03-01");
    assert!((bill.total_amount - 15.5).abs() < f64::EPSILON);
    assert_eq!(bill.image_path.as_deref(), Some("/tmp/acme.png"));
    assert_eq!(bill.quality_score, None);
    assert!(!bill.fallback_used);
}

#[test]
fn test_ids_auto_increment() {
    let store = BillStore::open_in_memory().unwrap();
    let first = store.save_bill(&acme_bill()).unwrap();
    let second = store.save_bill(&acme_bill()).unwrap();
    assert_eq!(second, first + 1);
}

#[test]
fn test_line_items_keep_order() {
    let store = BillStore::open_in_memory().unwrap();
    let id = store.save_bill(&acme_bill()).unwrap();

    let item_ids = store.save_line_items(id, &acme_items()).unwrap();
    assert_eq!(item_ids.len(), 2);

    let items = store.get_line_items(id).unwrap();
    assert_eq!(items[0].description, "Milk");
    assert_eq!(items[0].category, Category::Groceries);
    assert_eq!(items[1].description, "Sandwich");
    assert_eq!(items[1].bill_id, id);
    assert_eq!(items[1].to_line_item(), acme_items()[1]);
}

#[test]
fn test_line_items_require_existing_bill() {
    let store = BillStore::open_in_memory().unwrap();
    let err = store.save_line_items(999, &acme_items()).unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
}

#[test]
fn test_save_bill_with_items_is_atomic() {
    let store = BillStore::open_in_memory().unwrap();
    let (bill_id, item_ids) = store.save_bill_with_items(&acme_bill(), &acme_items()).unwrap();

    assert_eq!(item_ids.len(), 2);
    assert_eq!(store.get_line_items(bill_id).unwrap().len(), 2);
}

#[test]
fn test_get_missing_bill() {
    let store = BillStore::open_in_memory().unwrap();
    let err = store.get_bill(42).unwrap_err();
    assert!(matches!(err, StoreError::BillNotFound(42)));
}

#[test]
fn test_list_bills_newest_first() {
    let store = BillStore::open_in_memory().unwrap();
    for merchant in ["A", "B", "C"] {
        let bill = NewBill {
            merchant_name: merchant.to_string(),
            ..acme_bill()
        };
        store.save_bill(&bill).unwrap();
    }

    let bills = store.list_bills(2).unwrap();
    let names: Vec<_> = bills.iter().map(|b| b.merchant_name.as_str()).collect();
    assert_eq!(names, vec!["C", "B"]);
}

#[test]
fn test_statistics() {
    let store = BillStore::open_in_memory().unwrap();
    assert_eq!(store.statistics().unwrap().total_bills, 0);
    assert!(store.statistics().unwrap().average_bill.abs() < f64::EPSILON);

    store.save_bill_with_items(&acme_bill(), &acme_items()).unwrap();
    let second = NewBill {
        total_amount: 4.5,
        ..acme_bill()
    };
    store
        .save_bill_with_items(&second, &[LineItem::new("Bread", 4.5, Category::Groceries, 0.8)])
        .unwrap();

    let stats = store.statistics().unwrap();
    assert_eq!(stats.total_bills, 2);
    assert!((stats.total_spent - 20.0).abs() < 1e-9);
    assert!((stats.average_bill - 10.0).abs() < 1e-9);
    assert!((stats.by_category[&Category::Groceries] - 8.0).abs() < 1e-9);
    assert!((stats.by_category[&Category::Dining] - 12.0).abs() < 1e-9);
}

#[test]
fn test_reopen_on_disk_database() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bills.db");

    let id = {
        let store = BillStore::open(&path).unwrap();
        store.save_bill_with_items(&acme_bill(), &acme_items()).unwrap().0
    };

    let store = BillStore::open(&path).unwrap();
    assert_eq!(store.get_bill(id).unwrap().merchant_name, "Acme Market");
    assert_eq!(store.get_line_items(id).unwrap().len(), 2);
}
