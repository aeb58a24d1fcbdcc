use crate::column::descriptor::Column;
use crate::column::value::SqlValue;
use crate::error::{CdcError, CdcResult, MissingValueError};
use crate::event::operation::Operation;
use crate::event::payload::{Envelope, Payload, RowImage};
use crate::event::source::SourceInfo;
use crate::schema::envelope::{after_schema, before_schema, envelope_schema};
use crate::schema::field::SchemaField;
use crate::sender::EventSender;
use crate::source::connection::{
    key_alias, CatalogColumn, SnapshotLog, SourceConnection, SourceRow, OPERATION_ALIAS,
    ROW_ID_ALIAS, SEQUENCE_ALIAS, TIMESTAMP_ALIAS, VERSION_ALIAS,
};
use crate::source::dialect::SourceDialect;
use crate::table::sql;
use log::{debug, error, info, warn};

/// Outcome of one poll cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub processed: usize,
    pub emitted: usize,
    pub missed: usize,
}

/// Capture side engine for one master table and its change-log.
#[derive(Debug, Clone)]
pub struct CaptureTable {
    owner: String,
    table_name: String,
    log_table: String,
    columns: Vec<Column>,
    pk_columns: Vec<Column>,
    schema: SchemaField,
    master_select: String,
    log_select: String,
    log_delete: String,
    batch_size: usize,
}

/// What the cycle needs from one change-log row.
struct LogEntry {
    sequence: i64,
    op: Operation,
    row_id: String,
    pk_values: Vec<SqlValue>,
    key_texts: Vec<SqlValue>,
}

fn required<T>(value: Option<T>, field: &str) -> CdcResult<T> {
    value.ok_or_else(|| MissingValueError::new(field).into())
}

fn build_image(columns: &[Column], values: Vec<SqlValue>) -> RowImage {
    columns
        .iter()
        .zip(values)
        .map(|(column, value)| (column.name().to_string(), value.to_json()))
        .collect()
}

impl CaptureTable {
    /// Reads the catalog for `log` and builds the engine.
    pub async fn new<C: SourceConnection>(
        conn: &mut C,
        log: &SnapshotLog,
        batch_size: usize,
    ) -> CdcResult<Self> {
        let catalog = conn.catalog_columns(log).await.map_err(|e| {
            error!(
                "Unable to read catalog for {}.{}: {}",
                log.owner, log.master_table, e
            );
            e
        })?;
        CaptureTable::from_catalog(conn.dialect(), log, &catalog, batch_size)
    }

    pub fn from_catalog(
        dialect: &dyn SourceDialect,
        log: &SnapshotLog,
        catalog: &[CatalogColumn],
        batch_size: usize,
    ) -> CdcResult<Self> {
        let columns: Vec<Column> = catalog.iter().map(Column::from_catalog).collect();
        let pk_columns: Vec<Column> = columns.iter().filter(|c| c.is_part_of_pk()).cloned().collect();

        if columns.is_empty() {
            return Err(CdcError::CatalogError(format!(
                "no supported columns found for {}.{}",
                log.owner, log.master_table
            )));
        }
        if pk_columns.is_empty() {
            return Err(CdcError::CatalogError(format!(
                "{}.{} has no columns in primary key {}",
                log.owner, log.master_table, log.pk_constraint
            )));
        }

        let schema = envelope_schema(
            &log.owner,
            &log.master_table,
            before_schema(
                &log.owner,
                &log.master_table,
                pk_columns.iter().map(Column::schema_field).collect(),
            ),
            after_schema(
                &log.owner,
                &log.master_table,
                columns.iter().map(Column::schema_field).collect(),
            ),
        );

        let master_select = sql::master_select(dialect, &log.owner, &log.master_table, &columns, &pk_columns);
        let batch_size = batch_size.max(1);
        let log_select = sql::log_select(dialect, &log.owner, &log.log_table, &pk_columns, batch_size);
        let log_delete = sql::log_delete(dialect, &log.owner, &log.log_table);
        debug!("{}.{} master select: {}", log.owner, log.master_table, master_select);
        debug!("{}.{} log select: {}", log.owner, log.master_table, log_select);

        info!(
            "Capturing {}.{} from {} with {} columns, key ({})",
            log.owner,
            log.master_table,
            log.log_table,
            columns.len(),
            pk_columns.iter().map(|c| c.name()).collect::<Vec<&str>>().join(",")
        );

        Ok(CaptureTable {
            owner: log.owner.clone(),
            table_name: log.master_table.clone(),
            log_table: log.log_table.clone(),
            columns,
            pk_columns,
            schema,
            master_select,
            log_select,
            log_delete,
            batch_size,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn log_table(&self) -> &str {
        &self.log_table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn pk_columns(&self) -> &[Column] {
        &self.pk_columns
    }

    pub fn schema(&self) -> &SchemaField {
        &self.schema
    }

    pub fn master_select_sql(&self) -> &str {
        &self.master_select
    }

    pub fn log_select_sql(&self) -> &str {
        &self.log_select
    }

    pub fn log_delete_sql(&self) -> &str {
        &self.log_delete
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Drains at most one batch of the change-log, emits an event per row
    /// and removes the consumed rows in a single commit. On failure the
    /// transaction is rolled back and no log row is removed.
    pub async fn poll<C, S>(&self, conn: &mut C, sender: &S) -> CdcResult<PollSummary>
    where
        C: SourceConnection,
        S: EventSender + ?Sized,
    {
        conn.begin().await?;
        match self.cycle(conn, sender).await {
            Ok(summary) => {
                if summary.processed > 0 {
                    debug!(
                        "{}.{}: processed {}, emitted {}, missed {}",
                        self.owner, self.table_name, summary.processed, summary.emitted, summary.missed
                    );
                }
                Ok(summary)
            }
            Err(e) => {
                if let Err(rollback_error) = conn.rollback().await {
                    error!(
                        "Rollback failed for {}.{}: {}",
                        self.owner, self.table_name, rollback_error
                    );
                }
                Err(e)
            }
        }
    }

    fn failed(&self, statement: &str, e: CdcError) -> CdcError {
        error!(
            "Capture of {}.{} failed: {}\nStatement:\n{}",
            self.owner, self.table_name, e, statement
        );
        e
    }

    async fn cycle<C, S>(&self, conn: &mut C, sender: &S) -> CdcResult<PollSummary>
    where
        C: SourceConnection,
        S: EventSender + ?Sized,
    {
        let mut summary = PollSummary::default();
        let log_rows = conn
            .fetch(&self.log_select, &[], self.batch_size)
            .await
            .map_err(|e| self.failed(&self.log_select, e))?;

        let mut consumed: Vec<String> = Vec::with_capacity(log_rows.len());
        for log_row in &log_rows {
            let entry = self
                .read_log_row(log_row)
                .map_err(|e| self.failed(&self.log_select, e))?;

            let envelope = match entry.op {
                Operation::Delete => {
                    let source = self
                        .source_info(log_row)
                        .map_err(|e| self.failed(&self.log_select, e))?;
                    Some(Payload::deleted(build_image(&self.pk_columns, entry.pk_values), source))
                }
                Operation::Create | Operation::Update => {
                    self.correlate(conn, entry.op, &entry.pk_values, &entry.key_texts, &mut summary)
                        .await?
                }
            }
            .map(|payload| Envelope::new(self.schema.clone(), payload));

            if let Some(envelope) = envelope {
                let key = format!("{}.{}-{}", self.owner, self.table_name, entry.sequence);
                sender.send(&key, &envelope).await.map_err(|e| {
                    error!("Unable to send {}: {}", key, e);
                    e
                })?;
                summary.emitted += 1;
            }

            consumed.push(entry.row_id);
            summary.processed += 1;
        }

        for row_id in consumed {
            conn.execute(&self.log_delete, &[SqlValue::Text(row_id)])
                .await
                .map_err(|e| self.failed(&self.log_delete, e))?;
        }
        conn.commit().await?;
        Ok(summary)
    }

    fn read_log_row<R: SourceRow + ?Sized>(&self, log_row: &R) -> CdcResult<LogEntry> {
        let sequence = required(log_row.get_i64(SEQUENCE_ALIAS)?, SEQUENCE_ALIAS)?;
        let op_code = required(log_row.get_string(OPERATION_ALIAS)?, OPERATION_ALIAS)?;
        let op = Operation::from_code(&op_code)?;
        let row_id = required(log_row.get_string(ROW_ID_ALIAS)?, ROW_ID_ALIAS)?;

        let pk_values = self
            .pk_columns
            .iter()
            .map(|c| c.extract(log_row))
            .collect::<CdcResult<Vec<SqlValue>>>()?;
        let key_texts = self
            .pk_columns
            .iter()
            .map(|c| {
                let alias = key_alias(c.name());
                required(log_row.get_string(&alias)?, &alias).map(SqlValue::Text)
            })
            .collect::<CdcResult<Vec<SqlValue>>>()?;

        Ok(LogEntry {
            sequence,
            op,
            row_id,
            pk_values,
            key_texts,
        })
    }

    /// Looks up the current master row for a create or update. The key is
    /// bound in its text form so no precision is lost on the way back.
    async fn correlate<C: SourceConnection>(
        &self,
        conn: &mut C,
        op: Operation,
        pk_values: &[SqlValue],
        key_texts: &[SqlValue],
        summary: &mut PollSummary,
    ) -> CdcResult<Option<Payload>> {
        let master_rows = conn
            .fetch(&self.master_select, key_texts, 1)
            .await
            .map_err(|e| self.failed(&self.master_select, e))?;

        let master_row = match master_rows.first() {
            Some(row) => row,
            None => {
                let predicate = self
                    .pk_columns
                    .iter()
                    .zip(pk_values.iter())
                    .map(|(c, v)| c.predicate_literal(v))
                    .collect::<Vec<String>>()
                    .join(" and ");
                warn!(
                    "Row {} not found in {}.{} for operation '{}', skipping\nStatement:\n{}",
                    predicate, self.owner, self.table_name, op, self.master_select
                );
                summary.missed += 1;
                return Ok(None);
            }
        };

        let values = self
            .columns
            .iter()
            .map(|c| c.extract(master_row))
            .collect::<CdcResult<Vec<SqlValue>>>()
            .map_err(|e| self.failed(&self.master_select, e))?;
        let source = self
            .source_info(master_row)
            .map_err(|e| self.failed(&self.master_select, e))?;
        Ok(Some(Payload::for_operation(op, build_image(&self.columns, values), source)))
    }

    fn source_info<R: SourceRow + ?Sized>(&self, row: &R) -> CdcResult<SourceInfo> {
        let ts_ms = required(row.get_i64(TIMESTAMP_ALIAS)?, TIMESTAMP_ALIAS)?;
        let version = required(row.get_i64(VERSION_ALIAS)?, VERSION_ALIAS)?;
        Ok(SourceInfo::new(&self.owner, &self.table_name).with_commit(ts_ms, version))
    }
}
