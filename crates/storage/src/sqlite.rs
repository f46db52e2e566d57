//! SQLite search store.
//!
//! Each summary is stored as one `searches` row plus one `top_prices` row per
//! entry of its cheapest fixed-price and soonest-ending auction lists.

use chrono::{DateTime, Utc};
use listing_core::{Error, PriceRecord, Result, SearchRecord, StatsSummary};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::info;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS searches (
    id INTEGER PRIMARY KEY,
    search_term TEXT NOT NULL,
    timestamp DATETIME NOT NULL,
    total_listings INTEGER NOT NULL,
    avg_price REAL NOT NULL,
    min_price REAL NOT NULL,
    max_price REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS top_prices (
    search_id INTEGER NOT NULL,
    price REAL NOT NULL,
    is_auction INTEGER NOT NULL,
    FOREIGN KEY (search_id) REFERENCES searches(id)
);
CREATE INDEX IF NOT EXISTS idx_top_prices_search ON top_prices(search_id);
";

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

/// A search row with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSearch {
    /// Row id, referenced by price rows.
    pub id: i64,
    /// Stored values.
    pub record: SearchRecord,
}

/// SQLite-backed store for past searches.
pub struct SearchStore {
    conn: Connection,
}

impl SearchStore {
    /// Open (creating if needed) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(db_err)?;
        info!(path = %path.display(), "opened search database");
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(db_err)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Store a summary for `search_term`, searched at `timestamp`.
    pub fn save_summary(
        &mut self,
        search_term: &str,
        timestamp: DateTime<Utc>,
        summary: &StatsSummary,
    ) -> Result<i64> {
        let search = summary.search_record(search_term, timestamp);
        self.save_records(&search, &summary.price_records())
    }

    /// Store a search row and its price rows in one transaction.
    pub fn save_records(&mut self, search: &SearchRecord, prices: &[PriceRecord]) -> Result<i64> {
        let total_listings = i64::try_from(search.total_listings).map_err(|_| {
            Error::database(format!(
                "total_listings {} does not fit in an INTEGER column",
                search.total_listings
            ))
        })?;
        let tx = self.conn.transaction().map_err(db_err)?;

        tx.execute(
            "INSERT INTO searches (search_term, timestamp, total_listings, avg_price, min_price, max_price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                search.search_term,
                search.timestamp,
                total_listings,
                search.avg_price,
                search.min_price,
                search.max_price,
            ],
        )
        .map_err(db_err)?;
        let search_id = tx.last_insert_rowid();

        {
            let mut stmt = tx
                .prepare("INSERT INTO top_prices (search_id, price, is_auction) VALUES (?1, ?2, ?3)")
                .map_err(db_err)?;
            for price in prices {
                stmt.execute(params![search_id, price.price, price.is_auction])
                    .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)?;
        info!(
            search_id,
            search_term = %search.search_term,
            prices = prices.len(),
            "stored search"
        );
        Ok(search_id)
    }

    /// Most recent searches first.
    pub fn recent_searches(&self, limit: usize) -> Result<Vec<StoredSearch>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, search_term, timestamp, total_listings, avg_price, min_price, max_price
                 FROM searches ORDER BY id DESC LIMIT ?1",
            )
            .map_err(db_err)?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], stored_search_from_row)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Look up one search by id.
    pub fn search(&self, search_id: i64) -> Result<Option<StoredSearch>> {
        self.conn
            .query_row(
                "SELECT id, search_term, timestamp, total_listings, avg_price, min_price, max_price
                 FROM searches WHERE id = ?1",
                params![search_id],
                stored_search_from_row,
            )
            .optional()
            .map_err(db_err)
    }

    /// Price rows of a search, in insertion order.
    pub fn prices_for(&self, search_id: i64) -> Result<Vec<PriceRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT price, is_auction FROM top_prices WHERE search_id = ?1 ORDER BY rowid")
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![search_id], |row| {
                Ok(PriceRecord {
                    price: row.get(0)?,
                    is_auction: row.get(1)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Number of stored searches.
    pub fn search_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM searches", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }
}

fn stored_search_from_row(row: &Row<'_>) -> rusqlite::Result<StoredSearch> {
    let total: i64 = row.get(3)?;
    Ok(StoredSearch {
        id: row.get(0)?,
        record: SearchRecord {
            search_term: row.get(1)?,
            timestamp: row.get(2)?,
            total_listings: total.max(0) as u64,
            avg_price: row.get(4)?,
            min_price: row.get(5)?,
            max_price: row.get(6)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use listing_core::AuctionEnd;

    fn make_summary() -> StatsSummary {
        let end = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();
        StatsSummary {
            total_listings: 1532,
            avg_price: 45.0,
            min_price: 10.0,
            max_price: 80.0,
            all_prices: vec![10.0, 20.0, 80.0, 70.0],
            top_fixed_price: vec![10.0, 20.0],
            top_auction: vec![80.0, 70.0],
            top_auction_end_times: vec![
                AuctionEnd {
                    raw: "2025-05-10T12:00:00.000Z".to_string(),
                    at: end,
                },
                AuctionEnd {
                    raw: "2025-05-10T13:00:00.000Z".to_string(),
                    at: end + chrono::Duration::hours(1),
                },
            ],
        }
    }

    fn make_ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 9, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_save_and_read_back() {
        let mut store = SearchStore::open_in_memory().unwrap();
        let id = store.save_summary("thinkpad", make_ts(8), &make_summary()).unwrap();

        let stored = store.search(id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.record.search_term, "thinkpad");
        assert_eq!(stored.record.timestamp, make_ts(8));
        assert_eq!(stored.record.total_listings, 1532);
        assert_relative_eq!(stored.record.avg_price, 45.0);
        assert_relative_eq!(stored.record.min_price, 10.0);
        assert_relative_eq!(stored.record.max_price, 80.0);

        let prices = store.prices_for(id).unwrap();
        assert_eq!(
            prices,
            vec![
                PriceRecord { price: 10.0, is_auction: false },
                PriceRecord { price: 20.0, is_auction: false },
                PriceRecord { price: 80.0, is_auction: true },
                PriceRecord { price: 70.0, is_auction: true },
            ]
        );
    }

    #[test]
    fn test_recent_searches_newest_first() {
        let mut store = SearchStore::open_in_memory().unwrap();
        let summary = make_summary();
        for (hour, term) in [(8, "a"), (9, "b"), (10, "c")] {
            store.save_summary(term, make_ts(hour), &summary).unwrap();
        }

        let recent = store.recent_searches(2).unwrap();
        let terms: Vec<&str> = recent.iter().map(|s| s.record.search_term.as_str()).collect();
        assert_eq!(terms, vec!["c", "b"]);
        assert_eq!(store.search_count().unwrap(), 3);
    }

    #[test]
    fn test_prices_scoped_to_search() {
        let mut store = SearchStore::open_in_memory().unwrap();
        let first = store.save_summary("a", make_ts(8), &make_summary()).unwrap();

        let mut other = make_summary();
        other.top_fixed_price = vec![1.0];
        other.top_auction.clear();
        other.top_auction_end_times.clear();
        let second = store.save_summary("b", make_ts(9), &other).unwrap();

        assert_eq!(store.prices_for(first).unwrap().len(), 4);
        assert_eq!(
            store.prices_for(second).unwrap(),
            vec![PriceRecord { price: 1.0, is_auction: false }]
        );
        assert!(store.search(second + 100).unwrap().is_none());
    }

    #[test]
    fn test_oversized_total_rejected() {
        let mut store = SearchStore::open_in_memory().unwrap();
        let mut summary = make_summary();
        summary.total_listings = u64::MAX;

        let result = store.save_summary("huge", make_ts(8), &summary);
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(store.search_count().unwrap(), 0);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");

        {
            let mut store = SearchStore::open(&path).unwrap();
            store.save_summary("persisted", make_ts(8), &make_summary()).unwrap();
        }

        let store = SearchStore::open(&path).unwrap();
        let recent = store.recent_searches(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].record.search_term, "persisted");
    }
}
