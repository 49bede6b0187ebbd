use rusqlite::types::{ToSql, ToSqlOutput};

/// A single column value ready for binding
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Null => rusqlite::types::Null.to_sql(),
            SqlValue::Integer(i) => i.to_sql(),
            SqlValue::Text(s) => s.as_str().to_sql(),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Integer(if value { 1 } else { 0 })
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Column/value pairs for one row, in insertion order
#[derive(Debug, Clone, Default)]
pub struct RowValues {
    values: Vec<(&'static str, SqlValue)>,
}

impl RowValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<SqlValue>) {
        let value = value.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(c, _)| *c)
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.values.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_maps_to_null() {
        let missing: Option<i64> = None;
        assert_eq!(SqlValue::from(missing), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(40_i64)), SqlValue::Integer(40));
        assert_eq!(SqlValue::from(true), SqlValue::Integer(1));
    }

    #[test]
    fn test_set_replaces_existing_column() {
        let row = RowValues::new()
            .with("name", "bulbasaur")
            .with("height", 7_i64)
            .with("name", "ivysaur");

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("name"), Some(&SqlValue::Text("ivysaur".into())));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "height"]);
    }
}
