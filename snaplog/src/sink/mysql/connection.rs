use crate::column::value::SqlValue;
use crate::dialect::kind::SinkDialect;
use crate::error::{CdcError, CdcResult};
use crate::sink::connection::{SinkConnection, SinkConnector};
use crate::sink::mysql::config::MySqlSinkConfig;
use async_trait::async_trait;
use chrono::{Datelike, TimeZone, Timelike, Utc};
use log::debug;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Params, Statement, Value};

const TABLE_EXISTS_SQL: &str = "\
select count(*)
  from information_schema.tables
 where table_schema = database()
   and lower(table_name) = lower(?)";

pub struct MySqlSinkConnection {
    conn: Conn,
}

/// Options with CLIENT_FOUND_ROWS so an UPDATE that matches a row
/// without changing it still reports one affected row.
fn connect_opts(config: &MySqlSinkConfig) -> CdcResult<Opts> {
    let opts = Opts::from_url(config.url().as_str()).map_err(mysql_async::Error::from)?;
    Ok(OptsBuilder::from_opts(opts).client_found_rows(true).into())
}

impl MySqlSinkConnection {
    /// Opens a single dedicated connection.
    pub async fn connect(config: &MySqlSinkConfig) -> CdcResult<Self> {
        let conn = Conn::new(connect_opts(config)?).await?;
        debug!("Connected to sink {}:{}/{}", config.host, config.port, config.db);
        Ok(MySqlSinkConnection { conn })
    }
}

fn to_mysql_value(value: &SqlValue) -> CdcResult<Value> {
    let converted = match value {
        SqlValue::Null(_) => Value::NULL,
        SqlValue::TinyInt(v) => Value::Int(i64::from(*v)),
        SqlValue::SmallInt(v) => Value::Int(i64::from(*v)),
        SqlValue::Integer(v) => Value::Int(i64::from(*v)),
        SqlValue::BigInt(v) => Value::Int(*v),
        SqlValue::Float(v) => Value::Float(*v),
        SqlValue::Double(v) => Value::Double(*v),
        SqlValue::Text(v) => Value::Bytes(v.clone().into_bytes()),
        SqlValue::Bytes(v) => Value::Bytes(v.clone()),
        SqlValue::Date(ms) | SqlValue::Timestamp(ms) => {
            let datetime = Utc.timestamp_millis_opt(*ms).single().ok_or_else(|| {
                CdcError::ConversionError(format!("{} is not a valid epoch millisecond", ms))
            })?;
            Value::Date(
                u16::try_from(datetime.year()).map_err(|_| {
                    CdcError::ConversionError(format!("year {} out of range", datetime.year()))
                })?,
                datetime.month() as u8,
                datetime.day() as u8,
                datetime.hour() as u8,
                datetime.minute() as u8,
                datetime.second() as u8,
                datetime.timestamp_subsec_micros(),
            )
        }
    };
    Ok(converted)
}

fn to_mysql_params(values: &[SqlValue]) -> CdcResult<Params> {
    if values.is_empty() {
        return Ok(Params::Empty);
    }
    let values = values.iter().map(to_mysql_value).collect::<CdcResult<Vec<Value>>>()?;
    Ok(Params::Positional(values))
}

#[async_trait]
impl SinkConnection for MySqlSinkConnection {
    type Statement = Statement;

    fn dialect(&self) -> SinkDialect {
        SinkDialect::MySql
    }

    async fn table_exists(&mut self, table: &str) -> CdcResult<bool> {
        let count: Option<i64> = self.conn.exec_first(TABLE_EXISTS_SQL, (table,)).await?;
        Ok(count.unwrap_or(0) > 0)
    }

    async fn execute_ddl(&mut self, sql: &str) -> CdcResult<()> {
        Ok(self.conn.query_drop(sql).await?)
    }

    async fn prepare(&mut self, sql: &str) -> CdcResult<Statement> {
        Ok(self.conn.prep(sql).await?)
    }

    async fn execute(&mut self, statement: &Statement, params: &[SqlValue]) -> CdcResult<u64> {
        let params = to_mysql_params(params)?;
        self.conn.exec_drop(statement, params).await?;
        Ok(self.conn.affected_rows())
    }

    async fn close_statement(&mut self, statement: Statement) -> CdcResult<()> {
        Ok(self.conn.close(statement).await?)
    }
}

#[async_trait]
impl SinkConnector for MySqlSinkConfig {
    type Connection = MySqlSinkConnection;

    fn dialect(&self) -> SinkDialect {
        SinkDialect::MySql
    }

    async fn connect(&self) -> CdcResult<MySqlSinkConnection> {
        MySqlSinkConnection::connect(self).await
    }
}
