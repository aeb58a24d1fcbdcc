use crate::column::descriptor::Column;

/// SQL fragments that differ between source databases. Statement assembly
/// lives in `table::sql`, only the engine specific pieces come from here.
pub trait SourceDialect: Send + Sync {
    fn quote(&self, identifier: &str) -> String;

    fn qualified(&self, owner: &str, table: &str) -> String {
        format!("{}.{}", self.quote(owner), self.quote(table))
    }

    /// Select-list expression for a column, aliased back to the column name.
    fn column_expr(&self, column: &Column) -> String;

    /// Select-list expression carrying the lossless text form of a key
    /// column, aliased with `key_alias`.
    fn key_expr(&self, column: &Column) -> String;

    /// Matches a key column against the text produced by `key_expr`,
    /// bound at the 1-based `index`.
    fn key_predicate(&self, column: &Column, index: usize) -> String;

    /// Caps a select at `rows` rows.
    fn limit_clause(&self, rows: usize) -> String;

    fn row_version_expr(&self) -> String;
    fn timestamp_expr(&self) -> String;
    fn row_identity_expr(&self) -> String;
    fn row_identity_predicate(&self, index: usize) -> String;

    /// Change-log columns holding the sequence and the `I`/`U`/`D` marker.
    fn log_sequence_column(&self) -> String;
    /// The sequence column read as a 64 bit integer.
    fn log_sequence_expr(&self) -> String;
    fn log_operation_column(&self) -> String;
}
