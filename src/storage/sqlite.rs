use crate::model::{NewRequest, Request, RequestStatus, StorageError};
use crate::storage::RequestStore;
use crate::utils::parse_datetime;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;

const SELECT_REQUEST: &str = "SELECT id, user_email, natural_language_query, parsed_tags,
        matched_products, notifications_sent, is_fulfilled, status, fulfilled_at,
        created_at, version
     FROM requests";

/// Columns as they come out of SQLite, before JSON and timestamp decoding.
struct RawRequest {
    id: i64,
    user_email: String,
    natural_language_query: String,
    parsed_tags: String,
    matched_products: String,
    notifications_sent: String,
    is_fulfilled: bool,
    status: String,
    fulfilled_at: Option<String>,
    created_at: String,
    version: i64,
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database and creates or migrates the schema.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_email TEXT NOT NULL,
                natural_language_query TEXT NOT NULL,
                parsed_tags TEXT NOT NULL,
                category TEXT,
                matched_products TEXT NOT NULL DEFAULT '[]',
                notifications_sent TEXT NOT NULL DEFAULT '[]',
                is_fulfilled INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                fulfilled_at TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_requests_status ON requests (status, is_fulfilled);
            "
        )?;

        // Databases created before optimistic locking have no version column.
        Self::migrate_add_column_if_missing(&conn, "requests", "version", "INTEGER NOT NULL DEFAULT 0")?;

        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::new(":memory:")
    }

    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    pub fn insert_request(&self, draft: NewRequest) -> Result<Request, StorageError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO requests (user_email, natural_language_query, parsed_tags, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &draft.user_email,
                &draft.natural_language_query,
                serde_json::to_string(&draft.parsed_tags)?,
                &draft.parsed_tags.category,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(Request::from_new(id, draft, created_at))
    }

    /// Optimistic write-back: only succeeds if the stored version is unchanged.
    pub fn save_request(&self, request: &Request) -> Result<u64, StorageError> {
        let changed = self.conn.execute(
            "UPDATE requests SET
                user_email = ?1,
                natural_language_query = ?2,
                parsed_tags = ?3,
                category = ?4,
                matched_products = ?5,
                notifications_sent = ?6,
                is_fulfilled = ?7,
                status = ?8,
                fulfilled_at = ?9,
                version = version + 1
             WHERE id = ?10 AND version = ?11",
            params![
                &request.user_email,
                &request.natural_language_query,
                serde_json::to_string(&request.parsed_tags)?,
                &request.parsed_tags.category,
                serde_json::to_string(&request.matched_products)?,
                serde_json::to_string(&request.notifications_sent)?,
                request.is_fulfilled,
                request.status.as_str(),
                request.fulfilled_at.map(|t| t.to_rfc3339()),
                request.id,
                request.version as i64,
            ],
        )?;

        if changed == 0 {
            let exists = self
                .conn
                .query_row("SELECT 1 FROM requests WHERE id = ?1", params![request.id], |_| Ok(()))
                .optional()?
                .is_some();
            return Err(if exists {
                StorageError::VersionConflict {
                    id: request.id,
                    expected: request.version,
                }
            } else {
                StorageError::NotFound(request.id)
            });
        }

        Ok(request.version + 1)
    }

    pub fn get_request(&self, id: i64) -> Result<Option<Request>, StorageError> {
        let raw = self
            .conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_REQUEST), params![id], Self::read_row)
            .optional()?;
        raw.map(Self::decode).transpose()
    }

    pub fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<Request>, StorageError> {
        let mut stmt;
        let rows = match status {
            Some(status) => {
                stmt = self
                    .conn
                    .prepare(&format!("{} WHERE status = ?1 ORDER BY id DESC", SELECT_REQUEST))?;
                stmt.query_map(params![status.as_str()], Self::read_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                stmt = self.conn.prepare(&format!("{} ORDER BY id DESC", SELECT_REQUEST))?;
                stmt.query_map([], Self::read_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        rows.into_iter().map(Self::decode).collect()
    }

    pub fn find_candidates(&self, product_category: &str) -> Result<Vec<Request>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE status = 'ACTIVE' AND is_fulfilled = 0
                AND category IS NOT NULL AND instr(lower(category), ?1) > 0
             ORDER BY id ASC",
            SELECT_REQUEST
        ))?;
        let rows = stmt
            .query_map(params![product_category.to_lowercase()], Self::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::decode).collect()
    }

    fn read_row(row: &Row) -> Result<RawRequest, rusqlite::Error> {
        Ok(RawRequest {
            id: row.get(0)?,
            user_email: row.get(1)?,
            natural_language_query: row.get(2)?,
            parsed_tags: row.get(3)?,
            matched_products: row.get(4)?,
            notifications_sent: row.get(5)?,
            is_fulfilled: row.get(6)?,
            status: row.get(7)?,
            fulfilled_at: row.get(8)?,
            created_at: row.get(9)?,
            version: row.get(10)?,
        })
    }

    fn decode(raw: RawRequest) -> Result<Request, StorageError> {
        let status = raw.status.parse::<RequestStatus>().map_err(StorageError::InvalidData)?;
        let created_at = parse_datetime(&raw.created_at).ok_or_else(|| {
            StorageError::InvalidData(format!("bad created_at for request {}: {}", raw.id, raw.created_at))
        })?;
        let fulfilled_at = match raw.fulfilled_at.as_deref() {
            Some(text) => Some(parse_datetime(text).ok_or_else(|| {
                StorageError::InvalidData(format!("bad fulfilled_at for request {}: {}", raw.id, text))
            })?),
            None => None,
        };

        Ok(Request {
            id: raw.id,
            user_email: raw.user_email,
            natural_language_query: raw.natural_language_query,
            parsed_tags: serde_json::from_str(&raw.parsed_tags)?,
            matched_products: serde_json::from_str(&raw.matched_products)?,
            notifications_sent: serde_json::from_str(&raw.notifications_sent)?,
            is_fulfilled: raw.is_fulfilled,
            status,
            fulfilled_at,
            created_at,
            version: raw.version.max(0) as u64,
        })
    }
}

/// Async `RequestStore` over a single SQLite connection.
pub struct SqliteStore {
    storage: Mutex<SqliteStorage>,
}

impl SqliteStore {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            storage: Mutex::new(storage),
        }
    }

    pub fn open(db_path: &str) -> Result<Self, StorageError> {
        Ok(Self::new(SqliteStorage::new(db_path)?))
    }
}

#[async_trait::async_trait]
impl RequestStore for SqliteStore {
    async fn insert(&self, draft: NewRequest) -> Result<Request, StorageError> {
        self.storage.lock().await.insert_request(draft)
    }

    async fn save(&self, request: &Request) -> Result<u64, StorageError> {
        self.storage.lock().await.save_request(request)
    }

    async fn get(&self, id: i64) -> Result<Option<Request>, StorageError> {
        self.storage.lock().await.get_request(id)
    }

    async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<Request>, StorageError> {
        self.storage.lock().await.list_requests(status)
    }

    async fn find_candidates(&self, product_category: &str) -> Result<Vec<Request>, StorageError> {
        self.storage.lock().await.find_candidates(product_category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParsedQuery;

    fn draft(email: &str, category: &str, max: Option<u64>) -> NewRequest {
        NewRequest {
            user_email: email.into(),
            natural_language_query: format!("{} please", category),
            parsed_tags: ParsedQuery {
                category: Some(category.into()),
                max_price: max,
                tags: vec!["laptop".into(), "16gb".into()],
                ..ParsedQuery::new("query")
            },
        }
    }

    #[test]
    fn insert_and_read_back() {
        let storage = SqliteStorage::in_memory().unwrap();
        let inserted = storage.insert_request(draft("a@x.io", "Laptops", Some(60_000))).unwrap();
        let loaded = storage.get_request(inserted.id).unwrap().unwrap();
        assert_eq!(loaded.parsed_tags, inserted.parsed_tags);
        assert_eq!(loaded.status, RequestStatus::Active);
        assert_eq!(loaded.version, 0);
        assert!(storage.get_request(999).unwrap().is_none());
    }

    #[test]
    fn save_bumps_version_and_persists_lists() {
        let storage = SqliteStorage::in_memory().unwrap();
        let mut request = storage.insert_request(draft("a@x.io", "Laptops", None)).unwrap();
        let now = Utc::now();
        request.record_match("p1", now);
        request.mark_fulfilled(now);

        let version = storage.save_request(&request).unwrap();
        assert_eq!(version, 1);

        let loaded = storage.get_request(request.id).unwrap().unwrap();
        assert_eq!(loaded.matched_products, vec!["p1"]);
        assert_eq!(loaded.notifications_sent.len(), 1);
        assert_eq!(loaded.status, RequestStatus::Fulfilled);
        assert!(loaded.is_fulfilled);
        assert!(loaded.fulfilled_at.is_some());
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn stale_version_conflicts() {
        let storage = SqliteStorage::in_memory().unwrap();
        let request = storage.insert_request(draft("a@x.io", "Laptops", None)).unwrap();
        storage.save_request(&request).unwrap();
        let err = storage.save_request(&request).unwrap_err();
        assert!(matches!(err, StorageError::VersionConflict { .. }));

        let mut ghost = request.clone();
        ghost.id = 42;
        assert!(matches!(storage.save_request(&ghost), Err(StorageError::NotFound(42))));
    }

    #[test]
    fn candidates_and_listing() {
        let storage = SqliteStorage::in_memory().unwrap();
        let first = storage.insert_request(draft("a@x.io", "Mobile Phones", None)).unwrap();
        storage.insert_request(draft("b@x.io", "Laptops", None)).unwrap();
        let mut done = storage.insert_request(draft("c@x.io", "Mobile Phones", None)).unwrap();
        done.mark_fulfilled(Utc::now());
        storage.save_request(&done).unwrap();

        let candidates = storage.find_candidates("PHONES").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, first.id);

        let all = storage.list_requests(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, done.id);
        let active = storage.list_requests(Some(RequestStatus::Active)).unwrap();
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn candidates_are_filtered_before_decoding() {
        let storage = SqliteStorage::in_memory().unwrap();
        let laptop = storage.insert_request(draft("a@x.io", "Laptops", None)).unwrap();
        // an undecodable row in another category must never be read
        storage
            .conn
            .execute(
                "INSERT INTO requests (user_email, natural_language_query, parsed_tags, category, created_at)
                 VALUES ('b@x.io', 'tv', 'not json', 'Televisions', 'not a date')",
                [],
            )
            .unwrap();

        let candidates = storage.find_candidates("LAPTOP").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, laptop.id);
        assert!(storage.find_candidates("phones").unwrap().is_empty());
    }
}
