use crate::column::value::SqlValue;
use crate::error::CdcResult;
use crate::source::connection::{CatalogColumn, SnapshotLog, SourceConnection};
use crate::source::dialect::SourceDialect;
use crate::source::postgres::config::PostgresSourceConfig;
use crate::source::postgres::dialect::PostgresSourceDialect;
use crate::source::postgres::params::to_postgres_params;
use crate::source::postgres::row::PostgresSourceRow;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use log::{debug, error};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

const SNAPSHOT_LOGS_SQL: &str = "\
select l.table_schema::text as owner,
       substr(l.table_name, 7)::text as master_table,
       l.table_name::text as log_table,
       c.constraint_name::text as pk_constraint
  from information_schema.tables l
  join information_schema.table_constraints c
    on c.table_schema = l.table_schema
   and c.table_name = substr(l.table_name, 7)
   and c.constraint_type = 'PRIMARY KEY'
 where l.table_name like 'mlog$\\_%'
   and ($1::text is null or l.table_schema = $1::text)
   and (cardinality($2::text[]) = 0 or substr(l.table_name, 7) = any($2::text[]))
 order by 1, 2";

const CATALOG_COLUMNS_SQL: &str = "\
select c.column_name::text as column_name,
       c.data_type::text as data_type,
       c.character_maximum_length::int4 as data_length,
       c.numeric_precision::int4 as data_precision,
       c.numeric_scale::int4 as data_scale,
       (c.is_nullable::text = 'YES') as nullable,
       exists(select 1
                from information_schema.key_column_usage k
               where k.constraint_schema = c.table_schema
                 and k.table_name = c.table_name
                 and k.constraint_name = $3::text
                 and k.column_name = c.column_name) as part_of_pk
  from information_schema.columns c
 where c.table_schema = $1::text
   and c.table_name = $2::text
   and c.data_type in ('smallint', 'integer', 'bigint', 'numeric', 'real',
                       'double precision', 'character', 'character varying',
                       'text', 'bytea', 'date', 'timestamp without time zone',
                       'timestamp with time zone')
 order by c.ordinal_position";

pub struct PostgresSourceConnection {
    client: Client,
    dialect: PostgresSourceDialect,
}

impl PostgresSourceConnection {
    pub async fn connect(config: &PostgresSourceConfig) -> CdcResult<Self> {
        let (client, connection) = tokio_postgres::connect(config.endpoint().as_str(), NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Source connection error: {}", e);
            }
        });

        client.batch_execute("SET TIME ZONE 'UTC'").await?;
        debug!("Connected to source {}:{}/{}", config.host, config.port, config.db);

        Ok(PostgresSourceConnection {
            client,
            dialect: PostgresSourceDialect,
        })
    }
}

#[async_trait]
impl SourceConnection for PostgresSourceConnection {
    type Row = PostgresSourceRow;

    async fn snapshot_logs(
        &mut self,
        owner: Option<&str>,
        tables: &[String],
    ) -> CdcResult<Vec<SnapshotLog>> {
        let tables: Vec<String> = tables.to_vec();
        let rows = self
            .client
            .query(SNAPSHOT_LOGS_SQL, &[&owner, &tables])
            .await?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in rows {
            logs.push(SnapshotLog {
                owner: row.try_get("owner")?,
                master_table: row.try_get("master_table")?,
                log_table: row.try_get("log_table")?,
                pk_constraint: row.try_get("pk_constraint")?,
            });
        }
        Ok(logs)
    }

    async fn catalog_columns(&mut self, log: &SnapshotLog) -> CdcResult<Vec<CatalogColumn>> {
        let rows = self
            .client
            .query(
                CATALOG_COLUMNS_SQL,
                &[&log.owner, &log.master_table, &log.pk_constraint],
            )
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            columns.push(CatalogColumn {
                column_name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
                data_length: row.try_get("data_length")?,
                data_precision: row.try_get("data_precision")?,
                data_scale: row.try_get("data_scale")?,
                nullable: row.try_get("nullable")?,
                part_of_pk: row.try_get("part_of_pk")?,
            });
        }
        Ok(columns)
    }

    fn dialect(&self) -> &dyn SourceDialect {
        &self.dialect
    }

    async fn begin(&mut self) -> CdcResult<()> {
        Ok(self.client.batch_execute("BEGIN").await?)
    }

    async fn commit(&mut self) -> CdcResult<()> {
        Ok(self.client.batch_execute("COMMIT").await?)
    }

    async fn rollback(&mut self) -> CdcResult<()> {
        Ok(self.client.batch_execute("ROLLBACK").await?)
    }

    async fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        max_rows: usize,
    ) -> CdcResult<Vec<PostgresSourceRow>> {
        let params = to_postgres_params(params)?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        let stream = self.client.query_raw(sql, param_refs).await?;
        let rows: Vec<tokio_postgres::Row> = stream.take(max_rows).try_collect().await?;
        Ok(rows.into_iter().map(PostgresSourceRow::new).collect())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> CdcResult<u64> {
        let params = to_postgres_params(params)?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        Ok(self.client.execute(sql, &param_refs).await?)
    }
}
