use rusqlite::{OptionalExtension, Row};

use super::{RowValues, Store};
use crate::error::{ImportError, ImportResult};
use crate::progress::{ImportRun, RunStatus};
use crate::schema::tables::IMPORT_PROGRESS;

const SELECT_RUN: &str = "SELECT import_id, status, current_step, current_step_index, total_steps,
        current_step_processed, current_step_total, step_details, last_detail_message,
        error_message, started_at, completed_at
     FROM import_progress";

impl Store {
    /// Write the whole run record, creating the row on first save
    pub fn save_import_run(&self, run: &ImportRun) -> ImportResult<()> {
        let details = serde_json::to_string(&run.step_details)?;
        let row = RowValues::new()
            .with("import_id", run.import_id.as_str())
            .with("status", run.status.as_str())
            .with("current_step", run.current_step.as_deref())
            .with("current_step_index", run.current_step_index as i64)
            .with("total_steps", run.total_steps as i64)
            .with("current_step_processed", run.current_step_processed as i64)
            .with("current_step_total", run.current_step_total.map(|t| t as i64))
            .with("step_details", details)
            .with("last_detail_message", run.last_detail_message.as_deref())
            .with("error_message", run.error_message.as_deref())
            .with("started_at", run.started_at.as_deref())
            .with("completed_at", run.completed_at.as_deref());

        self.upsert(&IMPORT_PROGRESS, &row)?;
        Ok(())
    }

    pub fn load_import_run(&self, import_id: &str) -> ImportResult<Option<ImportRun>> {
        let sql = format!("{} WHERE import_id = ?1", SELECT_RUN);
        let raw = self
            .connection()
            .query_row(&sql, [import_id], RawRun::from_row)
            .optional()?;
        raw.map(RawRun::into_run).transpose()
    }

    /// The most recently started run, if any
    pub fn latest_import_run(&self) -> ImportResult<Option<ImportRun>> {
        let sql = format!("{} ORDER BY started_at DESC, id DESC LIMIT 1", SELECT_RUN);
        let raw = self
            .connection()
            .query_row(&sql, [], RawRun::from_row)
            .optional()?;
        raw.map(RawRun::into_run).transpose()
    }
}

/// Column values as stored, before decoding status and JSON
struct RawRun {
    import_id: String,
    status: String,
    current_step: Option<String>,
    current_step_index: i64,
    total_steps: i64,
    current_step_processed: i64,
    current_step_total: Option<i64>,
    step_details: Option<String>,
    last_detail_message: Option<String>,
    error_message: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
}

impl RawRun {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            import_id: row.get("import_id")?,
            status: row.get("status")?,
            current_step: row.get("current_step")?,
            current_step_index: row.get("current_step_index")?,
            total_steps: row.get("total_steps")?,
            current_step_processed: row.get("current_step_processed")?,
            current_step_total: row.get("current_step_total")?,
            step_details: row.get("step_details")?,
            last_detail_message: row.get("last_detail_message")?,
            error_message: row.get("error_message")?,
            started_at: row.get("started_at")?,
            completed_at: row.get("completed_at")?,
        })
    }

    fn into_run(self) -> ImportResult<ImportRun> {
        let status = RunStatus::parse(&self.status)
            .ok_or_else(|| ImportError::format(format!("unknown run status '{}'", self.status)))?;
        let step_details = match self.step_details.as_deref() {
            Some(json) if !json.is_empty() => serde_json::from_str(json)?,
            _ => Vec::new(),
        };

        Ok(ImportRun {
            import_id: self.import_id,
            status,
            current_step: self.current_step,
            current_step_index: self.current_step_index.max(0) as usize,
            total_steps: self.total_steps.max(0) as usize,
            current_step_processed: self.current_step_processed.max(0) as u64,
            current_step_total: self.current_step_total.map(|t| t.max(0) as u64),
            last_detail_message: self.last_detail_message,
            error_message: self.error_message,
            started_at: self.started_at,
            completed_at: self.completed_at,
            step_details,
        })
    }
}
