use crate::column::value::SqlValue;
use crate::dialect::kind::SinkDialect;
use crate::error::CdcResult;
use crate::sink::connection::{SinkConnection, SinkConnector};
use crate::sink::postgres::config::PostgresSinkConfig;
use crate::source::postgres::params::to_postgres_params;
use async_trait::async_trait;
use log::{debug, error};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Statement};

const TABLE_EXISTS_SQL: &str = "\
select exists(select 1
                from information_schema.tables
               where table_schema = current_schema()
                 and lower(table_name) = lower($1::text))";

pub struct PostgresSinkConnection {
    client: Client,
}

impl PostgresSinkConnection {
    pub async fn connect(config: &PostgresSinkConfig) -> CdcResult<Self> {
        let (client, connection) = tokio_postgres::connect(config.endpoint().as_str(), NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Sink connection error: {}", e);
            }
        });

        client.batch_execute("SET TIME ZONE 'UTC'").await?;
        debug!("Connected to sink {}:{}/{}", config.host, config.port, config.db);

        Ok(PostgresSinkConnection { client })
    }
}

#[async_trait]
impl SinkConnection for PostgresSinkConnection {
    type Statement = Statement;

    fn dialect(&self) -> SinkDialect {
        SinkDialect::Postgres
    }

    async fn table_exists(&mut self, table: &str) -> CdcResult<bool> {
        let row = self.client.query_one(TABLE_EXISTS_SQL, &[&table]).await?;
        Ok(row.try_get(0)?)
    }

    async fn execute_ddl(&mut self, sql: &str) -> CdcResult<()> {
        Ok(self.client.batch_execute(sql).await?)
    }

    async fn prepare(&mut self, sql: &str) -> CdcResult<Statement> {
        Ok(self.client.prepare(sql).await?)
    }

    async fn execute(&mut self, statement: &Statement, params: &[SqlValue]) -> CdcResult<u64> {
        let params = to_postgres_params(params)?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        Ok(self.client.execute(statement, &param_refs).await?)
    }

    async fn close_statement(&mut self, statement: Statement) -> CdcResult<()> {
        // the server side statement is closed when the last handle is dropped
        drop(statement);
        Ok(())
    }
}

#[async_trait]
impl SinkConnector for PostgresSinkConfig {
    type Connection = PostgresSinkConnection;

    fn dialect(&self) -> SinkDialect {
        SinkDialect::Postgres
    }

    async fn connect(&self) -> CdcResult<PostgresSinkConnection> {
        PostgresSinkConnection::connect(self).await
    }
}
