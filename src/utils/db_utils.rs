use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::AppError;

/// SQL bindable value
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Where an UPDATE may write and how the row is addressed.
pub struct UpdateTarget<'a> {
    pub table: &'a str,
    /// Columns a payload may set. Anything else is rejected.
    pub columns: &'a [&'a str],
    /// `(column, value)` pairs ANDed into the WHERE clause.
    pub keys: &'a [(&'a str, u64)],
}

/// Builds a dynamic UPDATE from a JSON object.
///
/// Column names come from `target.columns` only, never from the payload
/// itself, so keys cannot inject SQL.
pub fn build_update_sql(target: &UpdateTarget<'_>, payload: &Value) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(AppError::BadRequest("No fields provided for update".into()));
    }
    if target.keys.is_empty() {
        return Err(AppError::Internal("UPDATE without a key".into()));
    }

    let mut set_clause = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + target.keys.len());

    for (key, value) in obj {
        let column = target
            .columns
            .iter()
            .find(|c| **c == key.as_str())
            .ok_or_else(|| AppError::BadRequest(format!("Field '{key}' cannot be updated")))?;
        set_clause.push(format!("{column} = ?"));

        let bound = match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    SqlValue::Date(d)
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    SqlValue::DateTime(dt)
                } else {
                    SqlValue::String(s.clone())
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    SqlValue::F64(f)
                } else {
                    return Err(AppError::BadRequest(format!("Field '{key}' is out of range")));
                }
            }
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Null => SqlValue::Null,
            _ => return Err(AppError::BadRequest("Unsupported JSON value type".into())),
        };
        values.push(bound);
    }

    let where_clause = target
        .keys
        .iter()
        .map(|(column, _)| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ");
    values.extend(target.keys.iter().map(|(_, v)| SqlValue::U64(*v)));

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        target.table,
        set_clause.join(", "),
        where_clause
    );

    Ok(SqlUpdate { sql, values })
}

pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
