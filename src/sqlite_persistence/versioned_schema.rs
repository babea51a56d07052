use anyhow::{bail, Result};
use rusqlite::Connection;

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Added to the schema version before it is written to `PRAGMA user_version`,
/// so a database created by something else is not mistaken for version 0.
pub const BASE_DB_VERSION: usize = 51000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
}

/// A column the way `PRAGMA table_info` reports it.
#[derive(Debug, PartialEq, Eq)]
struct ColumnInfo {
    name: String,
    sql_type: String,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

impl Column {
    fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default_value) = self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default_value);
        }
        sql
    }

    fn expected_info(&self) -> ColumnInfo {
        ColumnInfo {
            name: self.name.to_string(),
            sql_type: self.sql_type.as_sql().to_string(),
            non_null: self.non_null,
            default_value: self.default_value.map(unwrap_parentheses),
            is_primary_key: self.is_primary_key,
        }
    }
}

// SQLite may or may not keep the parentheses around a default expression.
fn unwrap_parentheses(s: &str) -> String {
    s.strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(s)
        .to_string()
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let columns: Vec<String> = self.columns.iter().map(Column::definition).collect();
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, columns.join(", ")),
            [],
        )?;
        Ok(())
    }

    fn actual_columns(&self, conn: &Connection) -> Result<Vec<ColumnInfo>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    sql_type: row.get(2)?,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row
                        .get::<_, Option<String>>(4)?
                        .map(|value| unwrap_parentheses(&value)),
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        let actual = self.actual_columns(conn)?;
        if actual.is_empty() {
            bail!("Table {} is missing", self.name);
        }
        if actual.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}",
                self.name,
                actual.len(),
                self.columns.len()
            );
        }
        for (found, column) in actual.iter().zip(self.columns) {
            let expected = column.expected_info();
            if *found != expected {
                bail!(
                    "Table {} column {} mismatch: expected {:?}, found {:?}",
                    self.name,
                    column.name,
                    expected,
                    found
                );
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        self.tables.iter().try_for_each(|table| table.validate(conn))
    }
}
