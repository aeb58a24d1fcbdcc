#![allow(dead_code)]

use async_trait::async_trait;
use snaplog::column::value::SqlValue;
use snaplog::dialect::kind::SinkDialect;
use snaplog::error::{CdcError, CdcResult, MissingValueError};
use snaplog::sink::connection::{SinkConnection, SinkConnector};
use snaplog::source::connection::{
    key_alias, CatalogColumn, SnapshotLog, SourceConnection, SourceRow, OPERATION_ALIAS,
    ROW_ID_ALIAS, SEQUENCE_ALIAS, TIMESTAMP_ALIAS, VERSION_ALIAS,
};
use snaplog::source::dialect::SourceDialect;
use snaplog::source::postgres::dialect::PostgresSourceDialect;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub type Values = BTreeMap<String, SqlValue>;

pub fn values(pairs: &[(&str, SqlValue)]) -> Values {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct FakeRow {
    pub values: Values,
}

impl FakeRow {
    fn value(&self, column: &str) -> CdcResult<&SqlValue> {
        self.values
            .get(column)
            .ok_or_else(|| MissingValueError::new(column).into())
    }
}

fn mismatch(column: &str, value: &SqlValue) -> CdcError {
    CdcError::ConversionError(format!("unexpected {:?} in {}", value, column))
}

impl SourceRow for FakeRow {
    fn get_i16(&self, column: &str) -> CdcResult<Option<i16>> {
        match self.value(column)? {
            SqlValue::Null(_) => Ok(None),
            SqlValue::TinyInt(v) => Ok(Some(i16::from(*v))),
            SqlValue::SmallInt(v) => Ok(Some(*v)),
            other => Err(mismatch(column, other)),
        }
    }

    fn get_i32(&self, column: &str) -> CdcResult<Option<i32>> {
        match self.value(column)? {
            SqlValue::Null(_) => Ok(None),
            SqlValue::Integer(v) => Ok(Some(*v)),
            other => Err(mismatch(column, other)),
        }
    }

    fn get_i64(&self, column: &str) -> CdcResult<Option<i64>> {
        match self.value(column)? {
            SqlValue::Null(_) => Ok(None),
            SqlValue::BigInt(v) | SqlValue::Date(v) | SqlValue::Timestamp(v) => Ok(Some(*v)),
            other => Err(mismatch(column, other)),
        }
    }

    fn get_f32(&self, column: &str) -> CdcResult<Option<f32>> {
        match self.value(column)? {
            SqlValue::Null(_) => Ok(None),
            SqlValue::Float(v) => Ok(Some(*v)),
            other => Err(mismatch(column, other)),
        }
    }

    fn get_f64(&self, column: &str) -> CdcResult<Option<f64>> {
        match self.value(column)? {
            SqlValue::Null(_) => Ok(None),
            SqlValue::Double(v) => Ok(Some(*v)),
            other => Err(mismatch(column, other)),
        }
    }

    fn get_string(&self, column: &str) -> CdcResult<Option<String>> {
        match self.value(column)? {
            SqlValue::Null(_) => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            other => Err(mismatch(column, other)),
        }
    }

    fn get_bytes(&self, column: &str) -> CdcResult<Option<Vec<u8>>> {
        match self.value(column)? {
            SqlValue::Null(_) => Ok(None),
            SqlValue::Bytes(v) => Ok(Some(v.clone())),
            other => Err(mismatch(column, other)),
        }
    }

    fn open_blob(&self, column: &str) -> CdcResult<Option<Box<dyn Read + Send + '_>>> {
        Ok(self
            .get_bytes(column)?
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>))
    }

    fn open_clob(&self, column: &str) -> CdcResult<Option<Box<dyn Read + Send + '_>>> {
        Ok(self
            .get_string(column)?
            .map(|text| Box::new(Cursor::new(text.into_bytes())) as Box<dyn Read + Send>))
    }
}

/// Text form of a key value as the source would render it. Rows that need
/// a finer rendering than the typed value carry their own `<column>$$key`.
pub fn key_text(value: &SqlValue) -> SqlValue {
    let text = match value {
        SqlValue::TinyInt(v) => v.to_string(),
        SqlValue::SmallInt(v) => v.to_string(),
        SqlValue::Integer(v) => v.to_string(),
        SqlValue::BigInt(v) | SqlValue::Date(v) | SqlValue::Timestamp(v) => v.to_string(),
        SqlValue::Float(v) => v.to_string(),
        SqlValue::Double(v) => v.to_string(),
        SqlValue::Text(v) => v.clone(),
        SqlValue::Bytes(v) => format!("{:?}", v),
        SqlValue::Null(_) => String::new(),
    };
    SqlValue::Text(text)
}

/// In-memory snapshot log source. Master rows are keyed by the values of
/// `pk` in order, change-log rows are served in sequence order.
pub struct FakeSource {
    pub dialect: PostgresSourceDialect,
    pub logs: Vec<SnapshotLog>,
    pub catalog: Vec<CatalogColumn>,
    pub pk: Vec<String>,
    pub master: Vec<Values>,
    pub log: Vec<Values>,
    pub pending_deletes: Vec<String>,
    pub fail_on_log_delete: bool,
    pub fail_on_catalog: bool,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub fetched_master_params: Vec<Vec<SqlValue>>,
    pub next_version: i64,
}

impl FakeSource {
    pub fn new(catalog: Vec<CatalogColumn>, pk: &[&str]) -> Self {
        FakeSource {
            dialect: PostgresSourceDialect,
            logs: vec![SnapshotLog::new("SCOTT", "DEPT", "mlog$_DEPT", "PK_DEPT")],
            catalog,
            pk: pk.iter().map(|c| c.to_string()).collect(),
            master: vec![],
            log: vec![],
            pending_deletes: vec![],
            fail_on_log_delete: false,
            fail_on_catalog: false,
            begins: 0,
            commits: 0,
            rollbacks: 0,
            fetched_master_params: vec![],
            next_version: 1000,
        }
    }

    fn with_key_texts(&self, mut row: Values) -> Values {
        for column in &self.pk {
            let alias = key_alias(column);
            if !row.contains_key(&alias) {
                if let Some(value) = row.get(column) {
                    let text = key_text(value);
                    row.insert(alias, text);
                }
            }
        }
        row
    }

    pub fn add_master(&mut self, row: Values) {
        let row = self.with_key_texts(row);
        self.master.push(row);
    }

    /// Appends a change-log row. `marker` is the raw `c`/`u`/`d` code as
    /// produced by the log select.
    pub fn add_log(&mut self, sequence: i64, marker: &str, pk: Values) {
        let mut row = self.with_key_texts(pk);
        row.insert(SEQUENCE_ALIAS.to_string(), SqlValue::BigInt(sequence));
        row.insert(OPERATION_ALIAS.to_string(), SqlValue::Text(marker.to_string()));
        row.insert(VERSION_ALIAS.to_string(), SqlValue::BigInt(sequence * 10));
        row.insert(TIMESTAMP_ALIAS.to_string(), SqlValue::Timestamp(1_600_000_000_000 + sequence));
        row.insert(ROW_ID_ALIAS.to_string(), SqlValue::Text(format!("(0,{})", sequence)));
        self.log.push(row);
    }

    pub fn remaining_sequences(&self) -> Vec<i64> {
        let mut sequences: Vec<i64> = self
            .log
            .iter()
            .filter_map(|row| match row.get(SEQUENCE_ALIAS) {
                Some(SqlValue::BigInt(v)) => Some(*v),
                _ => None,
            })
            .collect();
        sequences.sort();
        sequences
    }

    fn master_matching(&self, params: &[SqlValue]) -> Option<Values> {
        self.master
            .iter()
            .find(|row| {
                self.pk
                    .iter()
                    .zip(params.iter())
                    .all(|(column, text)| row.get(&key_alias(column)) == Some(text))
            })
            .cloned()
    }
}

#[async_trait]
impl SourceConnection for FakeSource {
    type Row = FakeRow;

    async fn snapshot_logs(
        &mut self,
        owner: Option<&str>,
        tables: &[String],
    ) -> CdcResult<Vec<SnapshotLog>> {
        Ok(self
            .logs
            .iter()
            .filter(|log| owner.map(|o| o == log.owner).unwrap_or(true))
            .filter(|log| tables.is_empty() || tables.contains(&log.master_table))
            .cloned()
            .collect())
    }

    async fn catalog_columns(&mut self, _log: &SnapshotLog) -> CdcResult<Vec<CatalogColumn>> {
        if self.fail_on_catalog {
            return Err(CdcError::CatalogError("permission denied for schema".into()));
        }
        Ok(self.catalog.clone())
    }

    fn dialect(&self) -> &dyn SourceDialect {
        &self.dialect
    }

    async fn begin(&mut self) -> CdcResult<()> {
        self.begins += 1;
        self.pending_deletes.clear();
        Ok(())
    }

    async fn commit(&mut self) -> CdcResult<()> {
        self.commits += 1;
        let deletes = std::mem::take(&mut self.pending_deletes);
        self.log.retain(|row| match row.get(ROW_ID_ALIAS) {
            Some(SqlValue::Text(id)) => !deletes.contains(id),
            _ => true,
        });
        Ok(())
    }

    async fn rollback(&mut self) -> CdcResult<()> {
        self.rollbacks += 1;
        self.pending_deletes.clear();
        Ok(())
    }

    async fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        max_rows: usize,
    ) -> CdcResult<Vec<FakeRow>> {
        if sql.contains("mlog$_") {
            let mut rows = self.log.clone();
            rows.sort_by_key(|row| match row.get(SEQUENCE_ALIAS) {
                Some(SqlValue::BigInt(v)) => *v,
                _ => i64::MAX,
            });
            return Ok(rows
                .into_iter()
                .take(max_rows)
                .map(|values| FakeRow { values })
                .collect());
        }

        self.fetched_master_params.push(params.to_vec());
        self.next_version += 1;
        let version = self.next_version;
        Ok(self
            .master_matching(params)
            .map(|mut values| {
                values.insert(VERSION_ALIAS.to_string(), SqlValue::BigInt(version));
                values.insert(TIMESTAMP_ALIAS.to_string(), SqlValue::Timestamp(1_700_000_000_000));
                FakeRow { values }
            })
            .into_iter()
            .take(max_rows)
            .collect())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> CdcResult<u64> {
        if sql.starts_with("delete from") && sql.contains("mlog$_") {
            if self.fail_on_log_delete {
                return Err(CdcError::CatalogError("could not serialize access".into()));
            }
            if let Some(SqlValue::Text(id)) = params.first() {
                self.pending_deletes.push(id.clone());
                return Ok(1);
            }
        }
        Ok(0)
    }
}

/// Parsed shape of the DML produced for replica tables.
#[derive(Debug, Clone, PartialEq)]
enum Dml {
    Insert { table: String, columns: Vec<String> },
    Update { table: String, set: Vec<String>, key: Vec<String> },
    Delete { table: String, key: Vec<String> },
}

fn assigned_names(list: &str, separator: &str) -> Vec<String> {
    list.split(separator)
        .filter_map(|part| part.split('=').next())
        .map(|name| name.trim().to_string())
        .collect()
}

fn parse_dml(sql: &str) -> Option<Dml> {
    if let Some(rest) = sql.strip_prefix("insert into ") {
        let open = rest.find('(')?;
        let close = rest.find(')')?;
        let columns = rest[open + 1..close]
            .split(',')
            .map(|c| c.trim().to_string())
            .collect();
        return Some(Dml::Insert {
            table: rest[..open].trim().to_lowercase(),
            columns,
        });
    }
    if let Some(rest) = sql.strip_prefix("update ") {
        let (table, rest) = rest.split_once(" set ")?;
        let (set, key) = rest.split_once(" where ")?;
        return Some(Dml::Update {
            table: table.trim().to_lowercase(),
            set: assigned_names(set, ","),
            key: assigned_names(key, " and "),
        });
    }
    if let Some(rest) = sql.strip_prefix("delete from ") {
        let (table, key) = rest.split_once(" where ")?;
        return Some(Dml::Delete {
            table: table.trim().to_lowercase(),
            key: assigned_names(key, " and "),
        });
    }
    None
}

fn primary_key_of(ddl: &str) -> Vec<String> {
    ddl.split_once("primary key(")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(list, _)| list.split(',').map(|c| c.trim().to_string()).collect())
        .unwrap_or_default()
}

/// In-memory replication target that interprets the generated DML.
pub struct FakeSink {
    pub dialect: SinkDialect,
    pub tables: HashMap<String, Vec<Values>>,
    pub keys: HashMap<String, Vec<String>>,
    pub ddl: Vec<String>,
    pub prepared: Vec<String>,
    pub executed: Vec<(String, Vec<SqlValue>)>,
    pub closed: usize,
    pub fail_ddl: bool,
    pub fail_exists: bool,
    /// (connection id, sql) for every statement prepared through a handle.
    pub sessions: Vec<(usize, String)>,
}

impl FakeSink {
    pub fn new(dialect: SinkDialect) -> Self {
        FakeSink {
            dialect,
            tables: HashMap::new(),
            keys: HashMap::new(),
            ddl: vec![],
            prepared: vec![],
            executed: vec![],
            closed: 0,
            fail_ddl: false,
            fail_exists: false,
            sessions: vec![],
        }
    }

    pub fn with_table(mut self, table: &str, key: &[&str]) -> Self {
        self.create(table, key.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn create(&mut self, table: &str, key: Vec<String>) {
        self.tables.insert(table.to_lowercase(), vec![]);
        self.keys.insert(table.to_lowercase(), key);
    }

    pub fn rows(&self, table: &str) -> Vec<Values> {
        self.tables.get(&table.to_lowercase()).cloned().unwrap_or_default()
    }

    fn matches(row: &Values, key: &[String], params: &[SqlValue]) -> bool {
        key.iter()
            .zip(params.iter())
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

#[async_trait]
impl SinkConnection for FakeSink {
    type Statement = String;

    fn dialect(&self) -> SinkDialect {
        self.dialect
    }

    async fn table_exists(&mut self, table: &str) -> CdcResult<bool> {
        if self.fail_exists {
            return Err(CdcError::CatalogError("connection reset".into()));
        }
        Ok(self.tables.contains_key(&table.to_lowercase()))
    }

    async fn execute_ddl(&mut self, sql: &str) -> CdcResult<()> {
        if self.fail_ddl {
            return Err(CdcError::CatalogError("permission denied to create table".into()));
        }
        self.ddl.push(sql.to_string());
        let table = sql
            .strip_prefix("create table ")
            .and_then(|rest| rest.split_once('('))
            .map(|(name, _)| name.trim().to_string())
            .ok_or_else(|| CdcError::SchemaError(format!("unexpected ddl {}", sql)))?;
        self.create(&table, primary_key_of(sql));
        Ok(())
    }

    async fn prepare(&mut self, sql: &str) -> CdcResult<String> {
        self.prepared.push(sql.to_string());
        Ok(sql.to_string())
    }

    async fn execute(&mut self, statement: &String, params: &[SqlValue]) -> CdcResult<u64> {
        self.executed.push((statement.clone(), params.to_vec()));
        let dml = parse_dml(statement)
            .ok_or_else(|| CdcError::SchemaError(format!("unexpected statement {}", statement)))?;

        match dml {
            Dml::Insert { table, columns } => {
                let key = self.keys.get(&table).cloned().unwrap_or_default();
                let row: Values = columns.into_iter().zip(params.iter().cloned()).collect();
                let rows = self
                    .tables
                    .get_mut(&table)
                    .ok_or_else(|| CdcError::SchemaError(format!("no table {}", table)))?;
                let key_values: Vec<SqlValue> = key.iter().filter_map(|k| row.get(k).cloned()).collect();
                if rows.iter().any(|r| FakeSink::matches(r, &key, &key_values)) {
                    return Err(CdcError::ConversionError(format!(
                        "duplicate key value violates unique constraint {}_PK",
                        table
                    )));
                }
                rows.push(row);
                Ok(1)
            }
            Dml::Update { table, set, key } => {
                let (set_params, key_params) = params.split_at(set.len());
                let rows = self
                    .tables
                    .get_mut(&table)
                    .ok_or_else(|| CdcError::SchemaError(format!("no table {}", table)))?;
                let mut affected = 0;
                for row in rows.iter_mut().filter(|r| FakeSink::matches(r, &key, key_params)) {
                    for (column, value) in set.iter().zip(set_params.iter()) {
                        row.insert(column.clone(), value.clone());
                    }
                    affected += 1;
                }
                Ok(affected)
            }
            Dml::Delete { table, key } => {
                let rows = self
                    .tables
                    .get_mut(&table)
                    .ok_or_else(|| CdcError::SchemaError(format!("no table {}", table)))?;
                let before = rows.len();
                rows.retain(|r| !FakeSink::matches(r, &key, params));
                Ok((before - rows.len()) as u64)
            }
        }
    }

    async fn close_statement(&mut self, _statement: String) -> CdcResult<()> {
        self.closed += 1;
        Ok(())
    }
}

/// Hands out numbered connections that all write to one shared `FakeSink`.
#[derive(Clone)]
pub struct FakeSinkConnector {
    dialect: SinkDialect,
    shared: Arc<Mutex<FakeSink>>,
    connects: Arc<AtomicUsize>,
}

impl FakeSinkConnector {
    pub fn new(sink: FakeSink) -> Self {
        FakeSinkConnector {
            dialect: sink.dialect,
            shared: Arc::new(Mutex::new(sink)),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn sink(&self) -> MutexGuard<'_, FakeSink> {
        self.shared.lock().await
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SinkConnector for FakeSinkConnector {
    type Connection = FakeSinkHandle;

    fn dialect(&self) -> SinkDialect {
        self.dialect
    }

    async fn connect(&self) -> CdcResult<FakeSinkHandle> {
        let id = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(FakeSinkHandle {
            id,
            dialect: self.dialect,
            shared: self.shared.clone(),
        })
    }
}

pub struct FakeSinkHandle {
    pub id: usize,
    dialect: SinkDialect,
    shared: Arc<Mutex<FakeSink>>,
}

#[async_trait]
impl SinkConnection for FakeSinkHandle {
    type Statement = String;

    fn dialect(&self) -> SinkDialect {
        self.dialect
    }

    async fn table_exists(&mut self, table: &str) -> CdcResult<bool> {
        self.shared.lock().await.table_exists(table).await
    }

    async fn execute_ddl(&mut self, sql: &str) -> CdcResult<()> {
        self.shared.lock().await.execute_ddl(sql).await
    }

    async fn prepare(&mut self, sql: &str) -> CdcResult<String> {
        let mut sink = self.shared.lock().await;
        sink.sessions.push((self.id, sql.to_string()));
        sink.prepare(sql).await
    }

    async fn execute(&mut self, statement: &String, params: &[SqlValue]) -> CdcResult<u64> {
        self.shared.lock().await.execute(statement, params).await
    }

    async fn close_statement(&mut self, statement: String) -> CdcResult<()> {
        self.shared.lock().await.close_statement(statement).await
    }
}

pub fn catalog_column(
    name: &str,
    data_type: &str,
    precision: Option<i32>,
    nullable: bool,
    pk: bool,
) -> CatalogColumn {
    CatalogColumn {
        column_name: name.to_string(),
        data_type: data_type.to_string(),
        data_length: None,
        data_precision: precision,
        data_scale: precision.map(|_| 0),
        nullable,
        part_of_pk: pk,
    }
}

/// SCOTT.DEPT as seen in the source catalog.
pub fn dept_catalog() -> Vec<CatalogColumn> {
    vec![
        catalog_column("DEPTNO", "NUMBER", Some(2), false, true),
        catalog_column("DNAME", "VARCHAR2", None, true, false),
        catalog_column("LOC", "VARCHAR2", None, true, false),
    ]
}

pub fn dept_row(deptno: i8, dname: Option<&str>, loc: Option<&str>) -> Values {
    let text = |value: Option<&str>| match value {
        Some(v) => SqlValue::Text(v.to_string()),
        None => SqlValue::Null(snaplog::column::neutral_type::NeutralType::VarChar),
    };
    values(&[
        ("DEPTNO", SqlValue::TinyInt(deptno)),
        ("DNAME", text(dname)),
        ("LOC", text(loc)),
    ])
}

pub fn dept_key(deptno: i8) -> Values {
    values(&[("DEPTNO", SqlValue::TinyInt(deptno))])
}
