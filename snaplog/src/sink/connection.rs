use crate::column::value::SqlValue;
use crate::dialect::kind::SinkDialect;
use crate::error::CdcResult;
use async_trait::async_trait;

/// An autocommit session against the replication target.
#[async_trait]
pub trait SinkConnection: Send {
    type Statement: Clone + Send + Sync;

    fn dialect(&self) -> SinkDialect;

    async fn table_exists(&mut self, table: &str) -> CdcResult<bool>;

    async fn execute_ddl(&mut self, sql: &str) -> CdcResult<()>;

    async fn prepare(&mut self, sql: &str) -> CdcResult<Self::Statement>;

    /// Executes a prepared statement and returns the number of affected rows.
    async fn execute(&mut self, statement: &Self::Statement, params: &[SqlValue]) -> CdcResult<u64>;

    async fn close_statement(&mut self, statement: Self::Statement) -> CdcResult<()>;
}

/// Opens sink connections. Every table engine gets a connection of its own.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    type Connection: SinkConnection;

    fn dialect(&self) -> SinkDialect;

    async fn connect(&self) -> CdcResult<Self::Connection>;
}
