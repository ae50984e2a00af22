//! SQLite-backed row store.
//!
//! RULE: Only store.rs talks to the database.
//! The ledger reaches it through the `RowSink` trait and never sees SQL.
//!
//! Several named sheets share one `history_row` table; a sink is bound to
//! one sheet name.

use crate::{
    config::SyncConfig,
    error::{PurifierError, SimResult},
    ledger::{LedgerRow, EXPORT_COLUMNS},
    sample::Odor,
    sync::{RowSink, SyncError},
};
use rusqlite::{params, types::Type, Connection, ErrorCode};
use std::time::Duration;

/// Columns the store manages itself, outside the export contract.
const BOOKKEEPING_COLUMNS: [&str; 3] = ["id", "sheet", "synced_at"];

pub struct SqliteRowSink {
    conn:  Connection,
    sheet: String,
}

impl SqliteRowSink {
    /// Open (or create) the row store at `path`, bound to `sheet`.
    pub fn open(path: &str, sheet: &str, busy_timeout: Duration) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // The pragma answers with the mode actually in effect; in-memory
        // databases stay on "memory".
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("store: opened '{path}' for sheet '{sheet}' in {mode} journal mode");
        conn.busy_timeout(busy_timeout)?;
        Ok(Self { conn, sheet: sheet.to_string() })
    }

    /// Open an in-memory row store (used in tests).
    pub fn in_memory(sheet: &str) -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, sheet: sheet.to_string() })
    }

    /// Open, migrate and check the store a sync config points at.
    pub fn from_config(config: &SyncConfig) -> SimResult<Self> {
        let sink = Self::open(
            &config.db_path,
            &config.sheet,
            Duration::from_millis(config.busy_timeout_ms),
        )?;
        sink.migrate()?;
        sink.verify_columns()
            .map_err(|e| PurifierError::InvalidConfig(e.to_string()))?;
        Ok(sink)
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_history.sql"))?;
        Ok(())
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Check that the table carries exactly the export columns.
    pub fn verify_columns(&self) -> Result<(), SyncError> {
        let mut stmt = self.conn.prepare("SELECT name FROM pragma_table_info('history_row')")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let contract: Vec<&str> = columns
            .iter()
            .map(String::as_str)
            .filter(|c| !BOOKKEEPING_COLUMNS.contains(c))
            .collect();
        if contract == EXPORT_COLUMNS {
            Ok(())
        } else {
            Err(SyncError::SchemaMismatch(format!("found {contract:?}")))
        }
    }

    // ── Test / summary helpers ────────────────────────────────────────

    /// Number of rows mirrored to this sheet.
    pub fn row_count(&self) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM history_row WHERE sheet = ?1",
            params![self.sheet],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All rows of this sheet in append order.
    pub fn rows(&self) -> SimResult<Vec<LedgerRow>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT "pH", "Turbidez_NTU", "Coliformes_NMP_100ml", "Metales_ppm", "TDS_mgL",
                      "Olor", "Nivel_contaminacion_%", "Filtro_recomendado",
                      "Purificacion_recomendada_%", "TDS_filtrado_mgL"
               FROM history_row WHERE sheet = ?1 ORDER BY id ASC"#,
        )?;
        let rows = stmt
            .query_map(params![self.sheet], |row| {
                let label: String = row.get(5)?;
                let odor = Odor::from_label(&label).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        Type::Text,
                        format!("unknown odor label '{label}'").into(),
                    )
                })?;
                Ok(LedgerRow {
                    ph:                 row.get(0)?,
                    turbidity_ntu:      row.get(1)?,
                    coliforms:          row.get(2)?,
                    metals_ppm:         row.get(3)?,
                    tds_mg_l:           row.get(4)?,
                    odor,
                    contamination_pct:  row.get(6)?,
                    recommended_filter: row.get(7)?,
                    purification_pct:   row.get(8)?,
                    filtered_tds_mg_l:  row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl RowSink for SqliteRowSink {
    fn name(&self) -> &str {
        &self.sheet
    }

    fn append_row(&mut self, row: &LedgerRow) -> Result<(), SyncError> {
        let synced_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .execute(
                r#"INSERT INTO history_row
                   (sheet, "pH", "Turbidez_NTU", "Coliformes_NMP_100ml", "Metales_ppm", "TDS_mgL",
                    "Olor", "Nivel_contaminacion_%", "Filtro_recomendado",
                    "Purificacion_recomendada_%", "TDS_filtrado_mgL", synced_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
                params![
                    self.sheet,
                    row.ph,
                    row.turbidity_ntu,
                    row.coliforms,
                    row.metals_ppm,
                    row.tds_mg_l,
                    row.odor.label(),
                    row.contamination_pct,
                    row.recommended_filter,
                    row.purification_pct,
                    row.filtered_tds_mg_l,
                    synced_at,
                ],
            )
            .map_err(classify)?;
        Ok(())
    }
}

fn classify(err: rusqlite::Error) -> SyncError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => SyncError::Timeout,
        Some(ErrorCode::PermissionDenied) | Some(ErrorCode::AuthorizationForStatementDenied) => {
            SyncError::Unauthorized
        }
        Some(ErrorCode::CannotOpen) | Some(ErrorCode::ReadOnly) => {
            SyncError::Unavailable(err.to_string())
        }
        _ => SyncError::Backend(err),
    }
}
