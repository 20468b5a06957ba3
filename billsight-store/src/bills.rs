//! SQLite bill repository.
//!
//! Two tables: `bills` holds one row per processed image and `line_items`
//! holds its itemized entries. Items reference their bill through a foreign
//! key and are removed with it.

use billsight_core::{Category, LineItem};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS bills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    merchant_name TEXT NOT NULL,
    bill_date TEXT NOT NULL,
    total_amount REAL NOT NULL,
    currency TEXT NOT NULL,
    image_path TEXT,
    quality_score REAL,
    confidence_score REAL NOT NULL,
    model_used TEXT NOT NULL,
    fallback_used INTEGER NOT NULL DEFAULT 0,
    processing_time REAL NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS line_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bill_id INTEGER NOT NULL REFERENCES bills(id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    category TEXT NOT NULL,
    confidence REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_line_items_bill_id ON line_items(bill_id);
";

const BILL_COLUMNS: &str = "id, merchant_name, bill_date, total_amount, currency, image_path, \
     quality_score, confidence_score, model_used, fallback_used, processing_time, created_at";

// ============================================================================
// Records
// ============================================================================

/// A bill about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    /// Merchant name as extracted.
    pub merchant_name: String,
    /// Bill date as extracted.
    pub bill_date: String,
    /// Bill total.
    pub total_amount: f64,
    /// ISO currency code.
    pub currency: String,
    /// Source image, if known.
    pub image_path: Option<String>,
    /// Image quality score, if assessed separately from confidence.
    pub quality_score: Option<f64>,
    /// The model's overall confidence.
    pub confidence_score: f64,
    /// Model that produced the extraction.
    pub model_used: String,
    /// Whether any call of the run fell back to the secondary model.
    pub fallback_used: bool,
    /// Cumulative model time in seconds.
    pub processing_time_secs: f64,
}

/// A bill row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBill {
    /// Row id.
    pub id: i64,
    /// Merchant name.
    pub merchant_name: String,
    /// Bill date.
    pub bill_date: String,
    /// Bill total.
    pub total_amount: f64,
    /// ISO currency code.
    pub currency: String,
    /// Source image.
    pub image_path: Option<String>,
    /// Image quality score.
    pub quality_score: Option<f64>,
    /// Overall confidence.
    pub confidence_score: f64,
    /// Extraction model.
    pub model_used: String,
    /// Whether a fallback answered.
    pub fallback_used: bool,
    /// Cumulative model time in seconds.
    pub processing_time_secs: f64,
    /// Insert time.
    pub created_at: DateTime<Utc>,
}

/// A line item row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredLineItem {
    /// Row id.
    pub id: i64,
    /// Owning bill.
    pub bill_id: i64,
    /// Item description.
    pub description: String,
    /// Item amount.
    pub amount: f64,
    /// Expense category.
    pub category: Category,
    /// Item confidence.
    pub confidence: f64,
}

impl StoredLineItem {
    /// Drops the row ids.
    pub fn to_line_item(&self) -> LineItem {
        LineItem::new(self.description.clone(), self.amount, self.category, self.confidence)
    }
}

/// Aggregates over everything stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    /// Number of bills.
    pub total_bills: u64,
    /// Sum of bill totals.
    pub total_spent: f64,
    /// Mean bill total, 0 when there are no bills.
    pub average_bill: f64,
    /// Sum of line item amounts per category.
    pub by_category: BTreeMap<Category, f64>,
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Write side of bill persistence, as used by the processing workflow.
pub trait BillRepository: Send + Sync {
    /// Inserts a bill and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save_bill(&self, bill: &NewBill) -> Result<i64, StoreError>;

    /// Inserts items for an existing bill and returns their ids in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails or the bill does not exist.
    fn save_line_items(&self, bill_id: i64, items: &[LineItem]) -> Result<Vec<i64>, StoreError>;

    /// Inserts a bill and its items.
    ///
    /// The default runs the two writes in sequence; implementations backed by
    /// a transactional store should make them atomic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if either write fails.
    fn save_bill_with_items(
        &self,
        bill: &NewBill,
        items: &[LineItem],
    ) -> Result<(i64, Vec<i64>), StoreError> {
        let bill_id = self.save_bill(bill)?;
        let item_ids = self.save_line_items(bill_id, items)?;
        Ok((bill_id, item_ids))
    }
}

// ============================================================================
// SQLite Store
// ============================================================================

/// SQLite-backed bill store.
///
/// The connection sits behind a mutex, so concurrent runs serialize their
/// writes.
#[derive(Debug)]
pub struct BillStore {
    conn: Mutex<Connection>,
}

impl BillStore {
    /// Opens (or creates) the database at `path` and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening bill database");
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_millis(3000))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::ConnectionPoisoned)
    }

    /// Loads one bill.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BillNotFound`] if no bill has this id.
    pub fn get_bill(&self, id: i64) -> Result<StoredBill, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1"),
            [id],
            map_bill_row,
        )
        .optional()?
        .ok_or(StoreError::BillNotFound(id))
    }

    /// Loads the items of a bill in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn get_line_items(&self, bill_id: i64) -> Result<Vec<StoredLineItem>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, bill_id, description, amount, category, confidence \
             FROM line_items WHERE bill_id = ?1 ORDER BY id ASC",
        )?;
        let mut rows = stmt.query([bill_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map_line_item_row(row)?);
        }
        Ok(out)
    }

    /// Returns the most recent bills, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn list_bills(&self, limit: usize) -> Result<Vec<StoredBill>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bills ORDER BY id DESC LIMIT ?1"
        ))?;
        let mut rows = stmt.query([limit])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map_bill_row(row)?);
        }
        Ok(out)
    }

    /// Computes totals over all stored bills.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a query fails.
    pub fn statistics(&self) -> Result<Statistics, StoreError> {
        let conn = self.lock()?;
        let (count, total_spent): (i64, f64) = conn.query_row(
            "SELECT COUNT(1), COALESCE(SUM(total_amount), 0.0) FROM bills",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut by_category = BTreeMap::new();
        let mut stmt =
            conn.prepare("SELECT category, SUM(amount) FROM line_items GROUP BY category")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let tag: String = row.get(0)?;
            let amount: f64 = row.get(1)?;
            *by_category.entry(Category::parse(&tag)).or_insert(0.0) += amount;
        }

        let total_bills = u64::try_from(count).unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let average_bill = if total_bills == 0 {
            0.0
        } else {
            total_spent / count as f64
        };

        Ok(Statistics {
            total_bills,
            total_spent,
            average_bill,
            by_category,
        })
    }
}

impl BillRepository for BillStore {
    #[instrument(skip_all, fields(merchant = %bill.merchant_name))]
    fn save_bill(&self, bill: &NewBill) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let id = insert_bill(&conn, bill)?;
        info!(bill_id = id, "Bill saved");
        Ok(id)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    fn save_line_items(&self, bill_id: i64, items: &[LineItem]) -> Result<Vec<i64>, StoreError> {
        let conn = self.lock()?;
        insert_line_items(&conn, bill_id, items)
    }

    #[instrument(skip_all, fields(merchant = %bill.merchant_name, items = items.len()))]
    fn save_bill_with_items(
        &self,
        bill: &NewBill,
        items: &[LineItem],
    ) -> Result<(i64, Vec<i64>), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let bill_id = insert_bill(&tx, bill)?;
        let item_ids = insert_line_items(&tx, bill_id, items)?;
        tx.commit()?;
        info!(bill_id, items = item_ids.len(), "Bill and line items saved");
        Ok((bill_id, item_ids))
    }
}

// ============================================================================
// Row Helpers
// ============================================================================

fn insert_bill(conn: &Connection, bill: &NewBill) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO bills (merchant_name, bill_date, total_amount, currency, image_path, \
         quality_score, confidence_score, model_used, fallback_used, processing_time, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            bill.merchant_name,
            bill.bill_date,
            bill.total_amount,
            bill.currency,
            bill.image_path,
            bill.quality_score,
            bill.confidence_score,
            bill.model_used,
            bill.fallback_used,
            bill.processing_time_secs,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_line_items(
    conn: &Connection,
    bill_id: i64,
    items: &[LineItem],
) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare(
        "INSERT INTO line_items (bill_id, description, amount, category, confidence) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        stmt.execute(params![
            bill_id,
            item.description,
            item.amount,
            item.category.as_str(),
            item.confidence,
        ])?;
        ids.push(conn.last_insert_rowid());
    }
    debug!(bill_id, count = ids.len(), "Line items saved");
    Ok(ids)
}

fn map_bill_row(row: &Row<'_>) -> rusqlite::Result<StoredBill> {
    let created_at: String = row.get(11)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(StoredBill {
        id: row.get(0)?,
        merchant_name: row.get(1)?,
        bill_date: row.get(2)?,
        total_amount: row.get(3)?,
        currency: row.get(4)?,
        image_path: row.get(5)?,
        quality_score: row.get(6)?,
        confidence_score: row.get(7)?,
        model_used: row.get(8)?,
        fallback_used: row.get(9)?,
        processing_time_secs: row.get(10)?,
        created_at,
    })
}

fn map_line_item_row(row: &Row<'_>) -> rusqlite::Result<StoredLineItem> {
    let category: String = row.get(4)?;
    Ok(StoredLineItem {
        id: row.get(0)?,
        bill_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: Category::parse(&category),
        confidence: row.get(5)?,
    })
}
