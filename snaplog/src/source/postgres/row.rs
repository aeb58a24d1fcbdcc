use crate::error::CdcResult;
use crate::source::connection::SourceRow;
use std::io::{Cursor, Read};
use tokio_postgres::Row;

pub struct PostgresSourceRow {
    row: Row,
}

impl PostgresSourceRow {
    pub fn new(row: Row) -> Self {
        PostgresSourceRow { row }
    }
}

impl SourceRow for PostgresSourceRow {
    fn get_i16(&self, column: &str) -> CdcResult<Option<i16>> {
        Ok(self.row.try_get(column)?)
    }

    fn get_i32(&self, column: &str) -> CdcResult<Option<i32>> {
        Ok(self.row.try_get(column)?)
    }

    fn get_i64(&self, column: &str) -> CdcResult<Option<i64>> {
        Ok(self.row.try_get(column)?)
    }

    fn get_f32(&self, column: &str) -> CdcResult<Option<f32>> {
        Ok(self.row.try_get(column)?)
    }

    fn get_f64(&self, column: &str) -> CdcResult<Option<f64>> {
        Ok(self.row.try_get(column)?)
    }

    fn get_string(&self, column: &str) -> CdcResult<Option<String>> {
        Ok(self.row.try_get(column)?)
    }

    fn get_bytes(&self, column: &str) -> CdcResult<Option<Vec<u8>>> {
        Ok(self.row.try_get(column)?)
    }

    fn open_blob(&self, column: &str) -> CdcResult<Option<Box<dyn Read + Send + '_>>> {
        let value: Option<&[u8]> = self.row.try_get(column)?;
        Ok(value.map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send + '_>))
    }

    fn open_clob(&self, column: &str) -> CdcResult<Option<Box<dyn Read + Send + '_>>> {
        let value: Option<&str> = self.row.try_get(column)?;
        Ok(value.map(|text| Box::new(Cursor::new(text.as_bytes())) as Box<dyn Read + Send + '_>))
    }
}
