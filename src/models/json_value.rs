use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A JSON document stored in a TEXT column.
///
/// Question arrays, flashcard arrays, attempt results and the profile's
/// list fields are all persisted as one serialized blob and replaced
/// atomically on update; this wrapper is the single place where those
/// blobs cross the database boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct JsonValue(pub serde_json::Value);

impl JsonValue {
    /// Serializes a typed value into a stored JSON blob.
    pub fn encode<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(JsonValue(serde_json::to_value(value)?))
    }

    /// Deserializes the stored blob back into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.0.clone())
    }

    /// An empty JSON array, the initial state for list-valued columns.
    pub fn empty_array() -> Self {
        JsonValue(serde_json::Value::Array(Vec::new()))
    }
}

impl FromSql<Text, Sqlite> for JsonValue {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        let value = serde_json::from_str(&text)?;
        Ok(JsonValue(value))
    }
}

impl ToSql<Text, Sqlite> for JsonValue {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(IsNull::No)
    }
}
