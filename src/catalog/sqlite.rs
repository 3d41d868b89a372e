use crate::model::{
    CatalogError, Category, PriceAlert, PriceRecord, Retailer, ShoppingList, ShoppingListItem,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::collections::HashSet;

/// Optional pre-filters for record reads. `search` narrows on the SQL
/// side only; real matching still goes through the normalizer.
#[derive(Debug, Clone, Default)]
pub struct RecordFilters {
    pub category: Option<Category>,
    pub retailer_id: Option<String>,
    pub search: Option<String>,
}

pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Opens the database and runs migrations.
    pub fn new(db_path: &str) -> Result<Self, CatalogError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS retailers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                logo_url TEXT,
                website_url TEXT NOT NULL DEFAULT '',
                prospekt_url TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS price_records (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                original_price REAL,
                category TEXT NOT NULL,
                retailer_id TEXT NOT NULL,
                retailer_name TEXT NOT NULL,
                valid_from TEXT,
                valid_until TEXT,
                extracted_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS price_alerts (
                id TEXT PRIMARY KEY,
                product_name TEXT NOT NULL,
                target_price REAL NOT NULL,
                current_price REAL,
                is_active INTEGER NOT NULL DEFAULT 1,
                triggered INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shopping_lists (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                plz TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shopping_list_items (
                list_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                product_name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                checked INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (list_id, position)
            );
            ",
        )?;

        // Columns added after the initial schema shipped
        Self::migrate_add_column_if_missing(&conn, "price_records", "unit", "TEXT")?;
        Self::migrate_add_column_if_missing(&conn, "price_records", "price_per_unit", "TEXT")?;
        Self::migrate_add_column_if_missing(&conn, "price_records", "prospekt_url", "TEXT")?;
        Self::migrate_add_column_if_missing(
            &conn,
            "price_alerts",
            "retailer_ids",
            "TEXT NOT NULL DEFAULT '[]'",
        )?;

        Ok(Self { conn })
    }

    /// Adds a column to a table unless it already exists.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), CatalogError> {
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

    // ---- retailers ----

    pub fn save_retailer(&self, retailer: &Retailer) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO retailers (
                id, name, logo_url, website_url, prospekt_url, is_active, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &retailer.id,
                &retailer.name,
                &retailer.logo_url,
                &retailer.website_url,
                &retailer.prospekt_url,
                retailer.is_active,
                &retailer.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_retailers(&self) -> Result<Vec<Retailer>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, logo_url, website_url, prospekt_url, is_active, created_at
             FROM retailers ORDER BY name ASC",
        )?;

        let rows = stmt.query_map([], Self::map_retailer)?;
        let mut retailers = Vec::new();
        for retailer in rows {
            retailers.push(retailer?);
        }

        Ok(retailers)
    }

    pub fn list_active_retailer_ids(&self) -> Result<HashSet<String>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM retailers WHERE is_active = 1")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = HashSet::new();
        for id in rows {
            ids.insert(id?);
        }

        Ok(ids)
    }

    /// Flips a retailer in or out of all comparisons.
    pub fn set_retailer_active(&self, retailer_id: &str, active: bool) -> Result<(), CatalogError> {
        let changed = self.conn.execute(
            "UPDATE retailers SET is_active = ?2 WHERE id = ?1",
            params![retailer_id, active],
        )?;
        if changed == 0 {
            return Err(CatalogError::NotFound);
        }
        Ok(())
    }

    // ---- price records ----

    pub fn save_record(&self, record: &PriceRecord) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO price_records (
                id, name, price, original_price, unit, price_per_unit,
                category, retailer_id, retailer_name, prospekt_url,
                valid_from, valid_until, extracted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                &record.id,
                &record.name,
                record.price,
                record.original_price,
                &record.unit,
                &record.price_per_unit,
                record.category.as_str(),
                &record.retailer_id,
                &record.retailer_name,
                &record.prospekt_url,
                record.valid_from.map(|d| d.to_rfc3339()),
                record.valid_until.map(|d| d.to_rfc3339()),
                &record.extracted_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Clears a retailer's records before a fresh flyer import.
    pub fn delete_records_for_retailer(&self, retailer_id: &str) -> Result<(), CatalogError> {
        self.conn.execute(
            "DELETE FROM price_records WHERE retailer_id = ?1",
            params![retailer_id],
        )?;
        Ok(())
    }

    /// The engine's snapshot read: records from active retailers whose
    /// validity window contains `now`, cheapest first.
    pub fn list_active_records(
        &self,
        filters: &RecordFilters,
        now: DateTime<Utc>,
    ) -> Result<Vec<PriceRecord>, CatalogError> {
        let mut sql = String::from(
            "SELECT r.id, r.name, r.price, r.original_price, r.unit, r.price_per_unit,
                    r.category, r.retailer_id, r.retailer_name, r.prospekt_url,
                    r.valid_from, r.valid_until, r.extracted_at
             FROM price_records r
             JOIN retailers s ON s.id = r.retailer_id
             WHERE s.is_active = 1
               AND (r.valid_from IS NULL OR r.valid_from <= ?1)
               AND (r.valid_until IS NULL OR r.valid_until >= ?1)",
        );
        let mut params_vec: Vec<String> = vec![now.to_rfc3339()];

        if let Some(category) = filters.category {
            params_vec.push(category.as_str().to_string());
            sql.push_str(&format!(" AND r.category = ?{}", params_vec.len()));
        }
        if let Some(retailer_id) = &filters.retailer_id {
            params_vec.push(retailer_id.clone());
            sql.push_str(&format!(" AND r.retailer_id = ?{}", params_vec.len()));
        }
        if let Some(search) = &filters.search {
            params_vec.push(search.clone());
            sql.push_str(&format!(
                " AND r.name LIKE '%' || ?{} || '%' COLLATE NOCASE",
                params_vec.len()
            ));
        }
        sql.push_str(" ORDER BY r.price ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params_vec), Self::map_record)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }

    // ---- price alerts ----

    pub fn save_alert(&self, alert: &PriceAlert) -> Result<(), CatalogError> {
        let retailer_ids = serde_json::to_string(&alert.retailer_ids)
            .map_err(|e| CatalogError::InvalidValue(e.to_string()))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO price_alerts (
                id, product_name, target_price, current_price,
                retailer_ids, is_active, triggered, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &alert.id,
                &alert.product_name,
                alert.target_price,
                alert.current_price,
                &retailer_ids,
                alert.is_active,
                alert.triggered,
                &alert.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_alerts(&self) -> Result<Vec<PriceAlert>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_name, target_price, current_price,
                    retailer_ids, is_active, triggered, created_at
             FROM price_alerts ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map([], Self::map_alert)?;
        let mut alerts = Vec::new();
        for alert in rows {
            alerts.push(alert?);
        }

        Ok(alerts)
    }

    /// Writes back an evaluated alert.
    pub fn update_alert(&self, alert: &PriceAlert) -> Result<(), CatalogError> {
        let changed = self.conn.execute(
            "UPDATE price_alerts SET current_price = ?2, triggered = ?3 WHERE id = ?1",
            params![&alert.id, alert.current_price, alert.triggered],
        )?;
        if changed == 0 {
            return Err(CatalogError::NotFound);
        }
        Ok(())
    }

    /// Alerts only disappear through this explicit call.
    pub fn delete_alert(&self, alert_id: &str) -> Result<(), CatalogError> {
        let changed = self
            .conn
            .execute("DELETE FROM price_alerts WHERE id = ?1", params![alert_id])?;
        if changed == 0 {
            return Err(CatalogError::NotFound);
        }
        Ok(())
    }

    // ---- shopping lists ----

    pub fn save_list(&self, list: &ShoppingList) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO shopping_lists (id, name, plz, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &list.id,
                &list.name,
                &list.plz,
                &list.created_at.to_rfc3339(),
                &list.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_shopping_lists(&self) -> Result<Vec<ShoppingList>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, plz, created_at, updated_at
             FROM shopping_lists ORDER BY updated_at DESC",
        )?;

        let rows = stmt.query_map([], Self::map_list)?;
        let mut lists = Vec::new();
        for list in rows {
            lists.push(list?);
        }

        Ok(lists)
    }

    pub fn add_list_item(
        &self,
        list_id: &str,
        item: &ShoppingListItem,
    ) -> Result<(), CatalogError> {
        let position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM shopping_list_items WHERE list_id = ?1",
            params![list_id],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO shopping_list_items (list_id, position, product_name, quantity, checked)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                list_id,
                position,
                &item.product_name,
                item.quantity,
                item.checked,
            ],
        )?;
        self.conn.execute(
            "UPDATE shopping_lists SET updated_at = ?2 WHERE id = ?1",
            params![list_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn list_items(&self, list_id: &str) -> Result<Vec<ShoppingListItem>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT product_name, quantity, checked
             FROM shopping_list_items WHERE list_id = ?1 ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![list_id], |row| {
            Ok(ShoppingListItem {
                product_name: row.get(0)?,
                quantity: row.get(1)?,
                checked: row.get(2)?,
            })
        })?;

        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }

        Ok(items)
    }

    pub fn delete_list(&self, list_id: &str) -> Result<(), CatalogError> {
        self.conn.execute(
            "DELETE FROM shopping_list_items WHERE list_id = ?1",
            params![list_id],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM shopping_lists WHERE id = ?1", params![list_id])?;
        if changed == 0 {
            return Err(CatalogError::NotFound);
        }
        Ok(())
    }

    // ---- row mappers ----

    fn map_retailer(row: &Row) -> Result<Retailer, rusqlite::Error> {
        Ok(Retailer {
            id: row.get(0)?,
            name: row.get(1)?,
            logo_url: row.get(2)?,
            website_url: row.get(3)?,
            prospekt_url: row.get(4)?,
            is_active: row.get(5)?,
            created_at: Self::req_datetime(row, 6)?,
        })
    }

    fn map_record(row: &Row) -> Result<PriceRecord, rusqlite::Error> {
        let category: String = row.get(6)?;
        Ok(PriceRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            original_price: row.get(3)?,
            unit: row.get(4)?,
            price_per_unit: row.get(5)?,
            category: Category::parse(&category),
            retailer_id: row.get(7)?,
            retailer_name: row.get(8)?,
            prospekt_url: row.get(9)?,
            valid_from: Self::opt_datetime(row, 10)?,
            valid_until: Self::opt_datetime(row, 11)?,
            extracted_at: Self::req_datetime(row, 12)?,
        })
    }

    fn map_alert(row: &Row) -> Result<PriceAlert, rusqlite::Error> {
        let retailer_ids_json: String = row.get(4)?;
        let retailer_ids: Vec<String> = serde_json::from_str(&retailer_ids_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(PriceAlert {
            id: row.get(0)?,
            product_name: row.get(1)?,
            target_price: row.get(2)?,
            current_price: row.get(3)?,
            retailer_ids,
            is_active: row.get(5)?,
            triggered: row.get(6)?,
            created_at: Self::req_datetime(row, 7)?,
        })
    }

    fn map_list(row: &Row) -> Result<ShoppingList, rusqlite::Error> {
        Ok(ShoppingList {
            id: row.get(0)?,
            name: row.get(1)?,
            plz: row.get(2)?,
            created_at: Self::req_datetime(row, 3)?,
            updated_at: Self::req_datetime(row, 4)?,
        })
    }

    fn req_datetime(row: &Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
        let text: String = row.get(idx)?;
        text.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    fn opt_datetime(row: &Row, idx: usize) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
        let text: Option<String> = row.get(idx)?;
        match text {
            Some(text) => text.parse().map(Some).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
            None => Ok(None),
        }
    }
}
