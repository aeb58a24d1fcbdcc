use crate::column::descriptor::Column;
use crate::dialect::type_map::DialectTypeMap;
use crate::source::connection::{
    OPERATION_ALIAS, ROW_ID_ALIAS, SEQUENCE_ALIAS, TIMESTAMP_ALIAS, VERSION_ALIAS,
};
use crate::source::dialect::SourceDialect;

fn source_pk_predicate(dialect: &dyn SourceDialect, pk_columns: &[Column]) -> String {
    pk_columns
        .iter()
        .enumerate()
        .map(|(i, c)| dialect.key_predicate(c, i + 1))
        .collect::<Vec<String>>()
        .join(" and ")
}

/// Current image of one master row, looked up by the text form of its key.
pub fn master_select(
    dialect: &dyn SourceDialect,
    owner: &str,
    table: &str,
    columns: &[Column],
    pk_columns: &[Column],
) -> String {
    let mut select_list: Vec<String> = columns.iter().map(|c| dialect.column_expr(c)).collect();
    select_list.push(format!("{} as {}", dialect.row_version_expr(), dialect.quote(VERSION_ALIAS)));
    select_list.push(format!("{} as {}", dialect.timestamp_expr(), dialect.quote(TIMESTAMP_ALIAS)));

    format!(
        "select {} from {} where {}",
        select_list.join(", "),
        dialect.qualified(owner, table),
        source_pk_predicate(dialect, pk_columns)
    )
}

/// At most `batch_size` change-log rows in sequence order, with the marker
/// translated to `c`/`u`/`d`. Key columns come both typed and as key text.
pub fn log_select(
    dialect: &dyn SourceDialect,
    owner: &str,
    log_table: &str,
    pk_columns: &[Column],
    batch_size: usize,
) -> String {
    let mut select_list: Vec<String> = pk_columns.iter().map(|c| dialect.column_expr(c)).collect();
    select_list.extend(pk_columns.iter().map(|c| dialect.key_expr(c)));
    select_list.push(format!("{} as {}", dialect.log_sequence_expr(), dialect.quote(SEQUENCE_ALIAS)));
    select_list.push(format!(
        "case {} when 'I' then 'c' when 'U' then 'u' else 'd' end as {}",
        dialect.log_operation_column(),
        dialect.quote(OPERATION_ALIAS)
    ));
    select_list.push(format!("{} as {}", dialect.row_version_expr(), dialect.quote(VERSION_ALIAS)));
    select_list.push(format!("{} as {}", dialect.timestamp_expr(), dialect.quote(TIMESTAMP_ALIAS)));
    select_list.push(format!("{} as {}", dialect.row_identity_expr(), dialect.quote(ROW_ID_ALIAS)));

    format!(
        "select {} from {} order by {} {}",
        select_list.join(", "),
        dialect.qualified(owner, log_table),
        dialect.log_sequence_column(),
        dialect.limit_clause(batch_size)
    )
}

pub fn log_delete(dialect: &dyn SourceDialect, owner: &str, log_table: &str) -> String {
    format!(
        "delete from {} where {}",
        dialect.qualified(owner, log_table),
        dialect.row_identity_predicate(1)
    )
}

fn names(columns: &[Column]) -> Vec<&str> {
    columns.iter().map(|c| c.name()).collect()
}

fn sink_predicate(map: &DialectTypeMap, columns: &[Column], first_index: usize) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}={}", c.name(), map.placeholder(first_index + i, c.neutral())))
        .collect::<Vec<String>>()
        .join(" and ")
}

/// Binds primary key columns first, then the rest.
pub fn replica_insert(map: &DialectTypeMap, table: &str, pk_columns: &[Column], columns: &[Column]) -> String {
    let mut all = names(pk_columns);
    all.extend(names(columns));
    let placeholders: Vec<String> = pk_columns
        .iter()
        .chain(columns.iter())
        .enumerate()
        .map(|(i, c)| map.placeholder(i + 1, c.neutral()))
        .collect();
    format!(
        "insert into {}({}) values({})",
        table,
        all.join(","),
        placeholders.join(",")
    )
}

/// Binds the non key columns first, then the key. `None` for key-only tables.
pub fn replica_update(map: &DialectTypeMap, table: &str, pk_columns: &[Column], columns: &[Column]) -> Option<String> {
    if columns.is_empty() {
        return None;
    }
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}={}", c.name(), map.placeholder(i + 1, c.neutral())))
        .collect();
    Some(format!(
        "update {} set {} where {}",
        table,
        assignments.join(","),
        sink_predicate(map, pk_columns, columns.len() + 1)
    ))
}

pub fn replica_delete(map: &DialectTypeMap, table: &str, pk_columns: &[Column]) -> String {
    format!("delete from {} where {}", table, sink_predicate(map, pk_columns, 1))
}

pub fn create_table(map: &DialectTypeMap, table: &str, pk_columns: &[Column], columns: &[Column]) -> String {
    let mut lines: Vec<String> = pk_columns
        .iter()
        .map(|c| format!("  {} {} not null", c.name(), map.sql_type(c.neutral())))
        .collect();
    lines.extend(columns.iter().map(|c| {
        if c.is_nullable() {
            format!("  {} {}", c.name(), map.sql_type(c.neutral()))
        } else {
            format!("  {} {} not null", c.name(), map.sql_type(c.neutral()))
        }
    }));
    lines.push(format!(
        "  constraint {}_PK primary key({})",
        table,
        names(pk_columns).join(",")
    ));
    format!("create table {}(\n{}\n)", table, lines.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::neutral_type::NeutralType;
    use crate::dialect::kind::SinkDialect;
    use crate::source::postgres::dialect::PostgresSourceDialect;

    fn dept_pk() -> Vec<Column> {
        vec![Column::new("DEPTNO", NeutralType::TinyInt, false, true)]
    }

    fn dept_columns() -> Vec<Column> {
        vec![
            Column::new("DNAME", NeutralType::VarChar, true, false),
            Column::new("LOC", NeutralType::VarChar, false, false),
        ]
    }

    #[test]
    fn test_master_select() {
        let mut all = dept_pk();
        all.extend(dept_columns());
        let sql = master_select(&PostgresSourceDialect, "SCOTT", "DEPT", &all, &dept_pk());
        assert_eq!(
            sql,
            "select \"DEPTNO\"::int2 as \"DEPTNO\", \"DNAME\"::text as \"DNAME\", \"LOC\"::text as \"LOC\", \
             xmin::text::int8 as \"version$$\", \
             (extract(epoch from clock_timestamp()) * 1000)::int8 as \"timestamp$$\" \
             from \"SCOTT\".\"DEPT\" where \"DEPTNO\" = $1::text::int2"
        );
    }

    #[test]
    fn test_log_select_orders_by_sequence() {
        let sql = log_select(&PostgresSourceDialect, "SCOTT", "mlog$_DEPT", &dept_pk(), 50);
        assert!(sql.starts_with(
            "select \"DEPTNO\"::int2 as \"DEPTNO\", \"DEPTNO\"::text as \"DEPTNO$$key\", \
             \"sequence$$\"::int8 as \"sequence$$\""
        ));
        assert!(sql.contains("case \"dmltype$$\" when 'I' then 'c' when 'U' then 'u' else 'd' end as \"optype$$\""));
        assert!(sql.contains("ctid::text as \"rowid$$\""));
        assert!(sql.ends_with("from \"SCOTT\".\"mlog$_DEPT\" order by \"sequence$$\" limit 50"));
    }

    #[test]
    fn test_log_delete() {
        assert_eq!(
            log_delete(&PostgresSourceDialect, "SCOTT", "mlog$_DEPT"),
            "delete from \"SCOTT\".\"mlog$_DEPT\" where ctid = $1::text::tid"
        );
    }

    #[test]
    fn test_replica_dml_postgres() {
        let map = DialectTypeMap::for_dialect(SinkDialect::Postgres);
        assert_eq!(
            replica_insert(&map, "DEPT", &dept_pk(), &dept_columns()),
            "insert into DEPT(DEPTNO,DNAME,LOC) values($1::smallint,$2::text,$3::text)"
        );
        assert_eq!(
            replica_update(&map, "DEPT", &dept_pk(), &dept_columns()).unwrap(),
            "update DEPT set DNAME=$1::text,LOC=$2::text where DEPTNO=$3::smallint"
        );
        assert_eq!(
            replica_delete(&map, "DEPT", &dept_pk()),
            "delete from DEPT where DEPTNO=$1::smallint"
        );
        assert!(replica_update(&map, "DEPT", &dept_pk(), &[]).is_none());
    }

    #[test]
    fn test_replica_dml_mysql_composite_key() {
        let map = DialectTypeMap::for_dialect(SinkDialect::MySql);
        let pk = vec![
            Column::new("EMPNO", NeutralType::Integer, false, true),
            Column::new("DEPTNO", NeutralType::TinyInt, false, true),
        ];
        assert_eq!(
            replica_delete(&map, "EMP", &pk),
            "delete from EMP where EMPNO=? and DEPTNO=?"
        );
    }

    #[test]
    fn test_create_table() {
        let map = DialectTypeMap::for_dialect(SinkDialect::MySql);
        assert_eq!(
            create_table(&map, "DEPT", &dept_pk(), &dept_columns()),
            "create table DEPT(\n  DEPTNO tinyint not null,\n  DNAME varchar(4002),\n  LOC varchar(4002) not null,\n  constraint DEPT_PK primary key(DEPTNO)\n)"
        );
    }
}
