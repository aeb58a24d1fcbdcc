use crate::column::descriptor::Column;
use crate::column::value::SqlValue;
use crate::dialect::type_map::{installed, DialectTypeMap};
use crate::error::{CdcError, CdcResult};
use crate::event::operation::Operation;
use crate::event::payload::{Payload, RowImage};
use crate::event::source::SourceInfo;
use crate::schema::envelope::split_envelope;
use crate::schema::field::SchemaField;
use crate::sink::connection::SinkConnection;
use crate::table::sql;
use log::{debug, error, info, warn};

/// Replication side engine for one destination table. The three DML
/// statements are prepared on first use and kept until `close_cursors`.
pub struct ReplicaTable<C: SinkConnection> {
    owner: String,
    table_name: String,
    pk_columns: Vec<Column>,
    columns: Vec<Column>,
    insert_sql: String,
    update_sql: Option<String>,
    delete_sql: String,
    create_sql: String,
    ready: bool,
    insert: Option<C::Statement>,
    update: Option<C::Statement>,
    delete: Option<C::Statement>,
}

async fn cached<C: SinkConnection>(
    conn: &mut C,
    slot: &mut Option<C::Statement>,
    sql: &str,
) -> CdcResult<C::Statement> {
    if let Some(statement) = slot {
        return Ok(statement.clone());
    }
    let statement = conn.prepare(sql).await.map_err(|e| {
        error!("Unable to prepare statement: {}\n{}", e, sql);
        e
    })?;
    *slot = Some(statement.clone());
    Ok(statement)
}

fn bind_all(columns: &[Column], image: &RowImage, params: &mut Vec<SqlValue>) -> CdcResult<()> {
    for column in columns {
        params.push(column.bind(image)?);
    }
    Ok(())
}

impl<C: SinkConnection> ReplicaTable<C> {
    /// Builds the engine with the process wide type map.
    pub async fn new(
        conn: &mut C,
        source: &SourceInfo,
        envelope_schema: &SchemaField,
        auto_create: bool,
    ) -> CdcResult<Self> {
        let type_map = *installed()?;
        ReplicaTable::with_type_map(conn, source, envelope_schema, auto_create, type_map).await
    }

    pub async fn with_type_map(
        conn: &mut C,
        source: &SourceInfo,
        envelope_schema: &SchemaField,
        auto_create: bool,
        type_map: DialectTypeMap,
    ) -> CdcResult<Self> {
        if conn.dialect() != type_map.dialect() {
            return Err(CdcError::DialectError(format!(
                "sink connection speaks {} but the installed type map is for {}",
                conn.dialect(),
                type_map.dialect()
            )));
        }

        let (before, after) = split_envelope(envelope_schema)?;
        let pk_columns = before
            .children()
            .iter()
            .map(|field| Column::from_schema_field(field, true))
            .collect::<CdcResult<Vec<Column>>>()?;
        let columns = after
            .children()
            .iter()
            .filter(|field| !pk_columns.iter().any(|pk| pk.name() == field.label()))
            .map(|field| Column::from_schema_field(field, false))
            .collect::<CdcResult<Vec<Column>>>()?;

        let table_name = source.table.clone();
        let mut table = ReplicaTable {
            owner: source.owner.clone(),
            insert_sql: sql::replica_insert(&type_map, &table_name, &pk_columns, &columns),
            update_sql: sql::replica_update(&type_map, &table_name, &pk_columns, &columns),
            delete_sql: sql::replica_delete(&type_map, &table_name, &pk_columns),
            create_sql: sql::create_table(&type_map, &table_name, &pk_columns, &columns),
            table_name,
            pk_columns,
            columns,
            ready: false,
            insert: None,
            update: None,
            delete: None,
        };
        table.ready = table.provision(conn, auto_create).await;
        Ok(table)
    }

    /// Checks that the destination exists, creating it when allowed.
    async fn provision(&self, conn: &mut C, auto_create: bool) -> bool {
        match conn.table_exists(&self.table_name).await {
            Ok(true) => true,
            Ok(false) if auto_create => match conn.execute_ddl(&self.create_sql).await {
                Ok(()) => {
                    info!("Created table {}", self.table_name);
                    debug!("{}", self.create_sql);
                    true
                }
                Err(e) => {
                    error!(
                        "Unable to create table {}: {}\nStatement:\n{}",
                        self.table_name, e, self.create_sql
                    );
                    false
                }
            },
            Ok(false) => {
                warn!(
                    "Table {} does not exist and automatic creation is disabled",
                    self.table_name
                );
                false
            }
            Err(e) => {
                error!("Unable to check existence of table {}: {}", self.table_name, e);
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn pk_columns(&self) -> &[Column] {
        &self.pk_columns
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn update_sql(&self) -> Option<&str> {
        self.update_sql.as_deref()
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }

    pub fn create_sql(&self) -> &str {
        &self.create_sql
    }

    pub fn has_open_cursors(&self) -> bool {
        self.insert.is_some() || self.update.is_some() || self.delete.is_some()
    }

    pub async fn apply(&mut self, conn: &mut C, payload: &Payload) -> CdcResult<()> {
        if !self.ready {
            return Err(CdcError::NotReadyError(self.table_name.clone()));
        }
        let image = payload.image()?;
        match payload.op() {
            Operation::Create => self.insert_row(conn, image).await,
            Operation::Update => self.update_row(conn, image).await,
            Operation::Delete => self.delete_row(conn, image).await.map(|_| ()),
        }
    }

    async fn insert_row(&mut self, conn: &mut C, image: &RowImage) -> CdcResult<()> {
        let mut params = Vec::with_capacity(self.pk_columns.len() + self.columns.len());
        bind_all(&self.pk_columns, image, &mut params)?;
        bind_all(&self.columns, image, &mut params)?;

        let statement = cached(conn, &mut self.insert, &self.insert_sql).await?;
        conn.execute(&statement, &params).await.map_err(|e| {
            error!("Insert into {} failed: {}\nStatement:\n{}", self.table_name, e, self.insert_sql);
            e
        })?;
        Ok(())
    }

    async fn update_row(&mut self, conn: &mut C, image: &RowImage) -> CdcResult<()> {
        let update_sql = match &self.update_sql {
            Some(update_sql) => update_sql.clone(),
            None => {
                // key-only table: an update can only move the key
                self.delete_row(conn, image).await?;
                return self.insert_row(conn, image).await;
            }
        };

        let mut params = Vec::with_capacity(self.pk_columns.len() + self.columns.len());
        bind_all(&self.columns, image, &mut params)?;
        bind_all(&self.pk_columns, image, &mut params)?;

        let statement = cached(conn, &mut self.update, &update_sql).await?;
        let affected = conn.execute(&statement, &params).await.map_err(|e| {
            error!("Update of {} failed: {}\nStatement:\n{}", self.table_name, e, update_sql);
            e
        })?;

        if affected == 0 {
            warn!(
                "Primary key not found in {}, executing insert",
                self.table_name
            );
            return self.insert_row(conn, image).await;
        }
        Ok(())
    }

    async fn delete_row(&mut self, conn: &mut C, image: &RowImage) -> CdcResult<u64> {
        let mut params = Vec::with_capacity(self.pk_columns.len());
        bind_all(&self.pk_columns, image, &mut params)?;

        let statement = cached(conn, &mut self.delete, &self.delete_sql).await?;
        let affected = conn.execute(&statement, &params).await.map_err(|e| {
            error!("Delete from {} failed: {}\nStatement:\n{}", self.table_name, e, self.delete_sql);
            e
        })?;
        if affected == 0 {
            debug!("Delete from {} matched no rows", self.table_name);
        }
        Ok(affected)
    }

    /// Releases the prepared statements. Safe to call repeatedly.
    pub async fn close_cursors(&mut self, conn: &mut C) -> CdcResult<()> {
        let mut first_error = None;
        for statement in [self.insert.take(), self.update.take(), self.delete.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = conn.close_statement(statement).await {
                error!("Unable to close statement for {}: {}", self.table_name, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
