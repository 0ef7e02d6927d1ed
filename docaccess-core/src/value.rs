//! The loosely-typed value model used for documents, filters and payloads.
//!
//! A [`DataMap`] maps field names to [`Value`]s. The same type is used as an
//! insert payload, an update payload and a query predicate. Values convert
//! losslessly to and from BSON so everything the store hands back can be
//! written again unchanged.
//!
//! Maps are ordered by key, not by insertion. An embedded document written
//! from a [`DataMap`] gets its keys in that order, and an exact-match filter
//! on a whole embedded document (`{"address": {...}}`) only matches stored
//! documents whose keys are in the same order. Filter on dotted paths
//! (`"address.city"`) when other writers may order keys differently.

use std::{collections::BTreeMap, fmt};

use bson::{Bson, Document, oid::ObjectId};
use chrono::{DateTime as ChronoDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

/// A field-name to value mapping, iterated in key order.
pub type DataMap = BTreeMap<String, Value>;

/// A single field value inside a [`DataMap`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit null, also what a missing field compares as.
    #[default]
    Null,
    Bool(bool),
    /// A 32-bit integer.
    Int32(i32),
    /// A 64-bit integer.
    Int64(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(DataMap),
    /// A store-assigned 12-byte identifier.
    ObjectId(ObjectId),
    /// A UTC datetime with millisecond precision, as the store keeps it.
    DateTime(bson::DateTime),
    /// Any other BSON value (binary, decimal, regex, timestamp...), kept as-is.
    Raw(Bson),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string contents of a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the flag of a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns either integer variant widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(i64::from(*i)),
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float for any numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(i) => Some(f64::from(*i)),
            Value::Int64(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the identifier of a [`Value::ObjectId`].
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the instant of a [`Value::DateTime`].
    pub fn as_datetime(&self) -> Option<bson::DateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns the elements of a [`Value::Array`].
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the fields of a [`Value::Map`].
    pub fn as_map(&self) -> Option<&DataMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the fields of a [`Value::Map`] for in-place edits.
    pub fn as_map_mut(&mut self) -> Option<&mut DataMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Renders the value as plain text.
    ///
    /// Strings are returned verbatim, `Null` becomes the empty string,
    /// identifiers become bare hex, datetimes RFC 3339, and compound
    /// values compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int32(i) => i.to_string(),
            Value::Int64(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::ObjectId(id) => id.to_hex(),
            Value::DateTime(dt) => rfc3339(dt),
            Value::Array(_) | Value::Map(_) | Value::Raw(_) => self.to_json().to_string(),
        }
    }

    /// Converts the value to JSON.
    ///
    /// Identifiers use the extended JSON `{"$oid": ...}` form so that
    /// [`Value::from`] on the result restores them.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int32(i) => JsonValue::Number((*i).into()),
            Value::Int64(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => JsonNumber::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<JsonMap<_, _>>(),
            ),
            Value::ObjectId(id) => {
                let mut object = JsonMap::new();
                object.insert("$oid".to_string(), JsonValue::String(id.to_hex()));
                JsonValue::Object(object)
            }
            Value::DateTime(dt) => JsonValue::String(rfc3339(dt)),
            Value::Raw(bson) => serde_json::to_value(bson).unwrap_or_default(),
        }
    }
}

fn rfc3339(dt: &bson::DateTime) -> String {
    dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<Value> for Bson {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Bson::Null,
            Value::Bool(b) => Bson::Boolean(b),
            Value::Int32(i) => Bson::Int32(i),
            Value::Int64(i) => Bson::Int64(i),
            Value::Float(f) => Bson::Double(f),
            Value::String(s) => Bson::String(s),
            Value::Array(items) => Bson::Array(items.into_iter().map(Bson::from).collect()),
            Value::Map(map) => Bson::Document(into_document(map)),
            Value::ObjectId(id) => Bson::ObjectId(id),
            Value::DateTime(dt) => Bson::DateTime(dt),
            Value::Raw(bson) => bson,
        }
    }
}

impl From<Bson> for Value {
    fn from(bson: Bson) -> Self {
        match bson {
            Bson::Null => Value::Null,
            Bson::Boolean(b) => Value::Bool(b),
            Bson::Int32(i) => Value::Int32(i),
            Bson::Int64(i) => Value::Int64(i),
            Bson::Double(f) => Value::Float(f),
            Bson::String(s) => Value::String(s),
            Bson::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Bson::Document(doc) => Value::Map(from_document(doc)),
            Bson::ObjectId(id) => Value::ObjectId(id),
            Bson::DateTime(dt) => Value::DateTime(dt),
            other => Value::Raw(other),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            // JSON has no integer width; use the narrowest that fits.
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => i32::try_from(i).map_or(Value::Int64(i), Value::Int32),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(object) => {
                if let Some(id) = extended_object_id(&object) {
                    return Value::ObjectId(id);
                }

                Value::Map(object.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Recognizes `{"$oid": "<24 hex chars>"}`.
fn extended_object_id(object: &JsonMap<String, JsonValue>) -> Option<ObjectId> {
    if object.len() != 1 {
        return None;
    }

    object
        .get("$oid")
        .and_then(JsonValue::as_str)
        .and_then(|hex| ObjectId::parse_str(hex).ok())
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int64(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::ObjectId(value)
    }
}

/// Truncates to millisecond precision.
impl From<ChronoDateTime<Utc>> for Value {
    fn from(value: ChronoDateTime<Utc>) -> Self {
        Value::DateTime(bson::DateTime::from_chrono(value))
    }
}

impl From<bson::DateTime> for Value {
    fn from(value: bson::DateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<DataMap> for Value {
    fn from(value: DataMap) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

/// Converts a map into a BSON document.
pub fn to_document(map: &DataMap) -> Document {
    into_document(map.clone())
}

/// Converts an owned map into a BSON document.
pub fn into_document(map: DataMap) -> Document {
    map.into_iter()
        .map(|(k, v)| (k, Bson::from(v)))
        .collect()
}

/// Converts a BSON document into a map.
pub fn from_document(document: Document) -> DataMap {
    document
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect()
}

/// Path-based access into nested maps.
pub trait DataMapExt {
    /// Looks up a dotted path such as `"address.city"`.
    ///
    /// Array elements can be addressed by numeric segments (`"tags.0"`).
    fn get_path(&self, path: &str) -> Option<&Value>;
}

impl DataMapExt for DataMap {
    fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;

        for segment in segments {
            current = match current {
                Value::Map(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }
}

/// Builds a [`DataMap`] from `key => value` pairs.
///
/// ```ignore
/// let filter = datamap! { "name" => "Ann", "age" => 30 };
/// ```
#[macro_export]
macro_rules! datamap {
    () => {
        $crate::value::DataMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::DataMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::value::Value::from($value));
        )+
        map
    }};
}
