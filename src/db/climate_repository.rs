use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::db::DbError;
use crate::reshaper::WideTable;

/// Name of the target table in the SQLite store.
pub const CLIMATE_TABLE: &str = "climate_data";

#[derive(Clone)]
pub struct ClimateRepository {
    pool: SqlitePool,
}

impl ClimateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the climate_data table with the given wide table: drop any
    /// prior table, recreate it with exactly the table's column set, and
    /// insert every row in a single transaction.
    #[instrument(skip(self, table), fields(rows = table.rows.len(), columns = table.columns.len()))]
    pub async fn replace_climate_data(&self, table: &WideTable) -> Result<usize, DbError> {
        debug!("Beginning transaction to replace {}", CLIMATE_TABLE);
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {CLIMATE_TABLE}"))
            .execute(&mut *tx)
            .await?;

        // Column names contain spaces ("Summer_Value Temperature"), so every
        // identifier is quoted. The station column is TEXT, the rest REAL.
        let column_defs: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let sql_type = if i == 0 { "TEXT" } else { "REAL" };
                format!("{} {}", quote_identifier(name), sql_type)
            })
            .collect();
        let create_sql = format!(
            "CREATE TABLE {CLIMATE_TABLE} ({})",
            column_defs.join(", ")
        );
        sqlx::query(&create_sql).execute(&mut *tx).await?;

        let column_list: Vec<String> = table.columns.iter().map(|c| quote_identifier(c)).collect();
        let placeholders: Vec<&str> = table.columns.iter().map(|_| "?").collect();
        let insert_sql = format!(
            "INSERT INTO {CLIMATE_TABLE} ({}) VALUES ({})",
            column_list.join(", "),
            placeholders.join(", ")
        );

        for row in &table.rows {
            let mut query = sqlx::query(&insert_sql).bind(&row.station);
            for value in &row.values {
                query = query.bind(value);
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!(
            "Wrote {} rows with {} columns to {}",
            table.rows.len(),
            table.columns.len(),
            CLIMATE_TABLE
        );
        Ok(table.rows.len())
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
