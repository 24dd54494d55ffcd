use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use sqlx::MySqlPool;

/// Bindable value for a dynamic `UPDATE`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Null,
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Builds `UPDATE <table> SET ... WHERE id = ?` from the fields a PATCH-like
/// payload actually carries. Column names are compile-time constants, never
/// taken from the payload.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    /// Sets the column only when a value was provided.
    pub fn set_opt<T: Into<SqlValue>>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `None` when there is nothing to update.
    pub fn build(self, id: u64) -> Option<SqlUpdate> {
        if self.columns.is_empty() {
            return None;
        }

        let set_clause = self
            .columns
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut values = self.values;
        values.push(SqlValue::U64(id));

        Some(SqlUpdate {
            sql: format!("UPDATE {} SET {} WHERE id = ?", self.table, set_clause),
            values,
        })
    }
}

pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// For update payloads: distinguishes an absent field (`None`) from an
/// explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_only_provided_columns() {
        let update = UpdateBuilder::new("services")
            .set_opt("service_name", Some("Finance"))
            .set_opt::<String>("manager", None)
            .set("parent_service_id", None::<u64>)
            .build(7)
            .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE services SET service_name = ?, parent_service_id = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Finance".into()),
                SqlValue::Null,
                SqlValue::U64(7)
            ]
        );
    }

    #[test]
    fn empty_update_builds_nothing() {
        let builder = UpdateBuilder::new("employees").set_opt::<bool>("is_active", None);
        assert!(builder.is_empty());
        assert!(builder.build(1).is_none());
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        parent: Option<Option<u64>>,
    }

    #[test]
    fn double_option_tells_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"parent": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"parent": 3}"#).unwrap();
        assert_eq!(absent.parent, None);
        assert_eq!(null.parent, Some(None));
        assert_eq!(set.parent, Some(Some(3)));
    }
}
