//! Conversions between [`SqliteValue`] and rusqlite's value types.

use welite_core::types::SqliteValue;

/// Owns the data out of a rusqlite [`ValueRef`].
///
/// [`ValueRef`]: rusqlite::types::ValueRef
pub(crate) fn value_from_ref(value: rusqlite::types::ValueRef<'_>) -> SqliteValue {
    match value {
        rusqlite::types::ValueRef::Null => SqliteValue::Null,
        rusqlite::types::ValueRef::Integer(i) => SqliteValue::Integer(i),
        rusqlite::types::ValueRef::Real(r) => SqliteValue::Real(r),
        rusqlite::types::ValueRef::Text(bytes) => {
            SqliteValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
        rusqlite::types::ValueRef::Blob(bytes) => SqliteValue::Blob(bytes.to_vec()),
    }
}
