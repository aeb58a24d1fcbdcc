use crate::column::value::SqlValue;
use crate::error::CdcResult;
use crate::source::dialect::SourceDialect;
use async_trait::async_trait;
use std::io::Read;

pub const SEQUENCE_ALIAS: &str = "sequence$$";
pub const OPERATION_ALIAS: &str = "optype$$";
pub const VERSION_ALIAS: &str = "version$$";
pub const TIMESTAMP_ALIAS: &str = "timestamp$$";
pub const ROW_ID_ALIAS: &str = "rowid$$";
pub const KEY_ALIAS_SUFFIX: &str = "$$key";

/// Alias of the text form of key column `column` in change-log rows.
pub fn key_alias(column: &str) -> String {
    format!("{}{}", column, KEY_ALIAS_SUFFIX)
}

/// Association between a master table and the change-log table recording
/// its mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLog {
    pub owner: String,
    pub master_table: String,
    pub log_table: String,
    pub pk_constraint: String,
}

impl SnapshotLog {
    pub fn new(owner: &str, master_table: &str, log_table: &str, pk_constraint: &str) -> Self {
        SnapshotLog {
            owner: owner.to_string(),
            master_table: master_table.to_string(),
            log_table: log_table.to_string(),
            pk_constraint: pk_constraint.to_string(),
        }
    }
}

/// One row of the column catalog for a master table, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogColumn {
    pub column_name: String,
    pub data_type: String,
    pub data_length: Option<i32>,
    pub data_precision: Option<i32>,
    pub data_scale: Option<i32>,
    pub nullable: bool,
    pub part_of_pk: bool,
}

/// Typed access to one fetched row. Every getter distinguishes SQL NULL
/// (`Ok(None)`) from a value.
pub trait SourceRow: Send + Sync {
    fn get_i16(&self, column: &str) -> CdcResult<Option<i16>>;
    fn get_i32(&self, column: &str) -> CdcResult<Option<i32>>;
    fn get_i64(&self, column: &str) -> CdcResult<Option<i64>>;
    fn get_f32(&self, column: &str) -> CdcResult<Option<f32>>;
    fn get_f64(&self, column: &str) -> CdcResult<Option<f64>>;
    fn get_string(&self, column: &str) -> CdcResult<Option<String>>;
    fn get_bytes(&self, column: &str) -> CdcResult<Option<Vec<u8>>>;

    fn get_nstring(&self, column: &str) -> CdcResult<Option<String>> {
        self.get_string(column)
    }

    /// Dates are selected as UTC epoch milliseconds.
    fn get_date_millis(&self, column: &str) -> CdcResult<Option<i64>> {
        self.get_i64(column)
    }

    fn get_timestamp_millis(&self, column: &str) -> CdcResult<Option<i64>> {
        self.get_i64(column)
    }

    fn open_blob(&self, column: &str) -> CdcResult<Option<Box<dyn Read + Send + '_>>>;
    fn open_clob(&self, column: &str) -> CdcResult<Option<Box<dyn Read + Send + '_>>>;
}

/// A transactional session against the captured database. One per table.
#[async_trait]
pub trait SourceConnection: Send {
    type Row: SourceRow;

    /// Lists change-log associations whose master has a primary key,
    /// optionally restricted to one owner and a set of master tables.
    async fn snapshot_logs(
        &mut self,
        owner: Option<&str>,
        tables: &[String],
    ) -> CdcResult<Vec<SnapshotLog>>;

    async fn catalog_columns(&mut self, log: &SnapshotLog) -> CdcResult<Vec<CatalogColumn>>;

    fn dialect(&self) -> &dyn SourceDialect;

    async fn begin(&mut self) -> CdcResult<()>;
    async fn commit(&mut self) -> CdcResult<()>;
    async fn rollback(&mut self) -> CdcResult<()>;

    /// Runs a query and returns at most `max_rows` rows.
    async fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        max_rows: usize,
    ) -> CdcResult<Vec<Self::Row>>;

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> CdcResult<u64>;
}
