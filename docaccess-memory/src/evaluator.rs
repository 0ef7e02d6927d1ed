//! Filter evaluation and value ordering for in-memory documents.
//!
//! Filters use the store's query document shape: plain `field: value` pairs
//! are equality tests, a value that is a map of `$`-prefixed keys is a set of
//! operators, and `$and` / `$or` / `$nor` combine sub-filters.

use std::cmp::Ordering;

use bson::Bson;
use docaccess_core::{
    error::{AccessError, AccessResult},
    value::{DataMap, DataMapExt, Value},
};

/// Cross-type ordering rank, following the store's BSON comparison order.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 1,
        Value::Int32(_) | Value::Int64(_) | Value::Float(_) => 2,
        Value::String(_) => 3,
        Value::Map(_) => 4,
        Value::Array(_) => 5,
        Value::Raw(_) => 6,
        Value::ObjectId(_) => 7,
        Value::Bool(_) => 8,
        Value::DateTime(_) => 9,
    }
}

/// Total order over values. Values of different types order by type rank.
pub(crate) fn total_cmp(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (a, b) if a.as_i64().is_some() && b.as_i64().is_some() => a.as_i64().cmp(&b.as_i64()),
        (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Map(a), Value::Map(b)) => a
            .iter()
            .zip(b.iter())
            .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| total_cmp(va, vb)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| total_cmp(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::ObjectId(a), Value::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
        (Value::Raw(a), Value::Raw(b)) => raw_cmp(a, b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (a, b) => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Orders raw BSON values. Timestamps and binaries compare by value; other
/// kinds (decimals, regexes, code...) fall back to their debug rendering, so
/// `Decimal128` values do not sort numerically.
fn raw_cmp(left: &Bson, right: &Bson) -> Ordering {
    match (left, right) {
        (Bson::Timestamp(a), Bson::Timestamp(b)) => (a.time, a.increment).cmp(&(b.time, b.increment)),
        (Bson::Binary(a), Bson::Binary(b)) => a
            .bytes
            .len()
            .cmp(&b.bytes.len())
            .then_with(|| u8::from(a.subtype).cmp(&u8::from(b.subtype)))
            .then_with(|| a.bytes.cmp(&b.bytes)),
        _ => format!("{left:?}").cmp(&format!("{right:?}")),
    }
}

/// Value equality with numeric types unified (`1 == 1.0`).
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    type_rank(left) == type_rank(right) && total_cmp(left, right).is_eq()
}

/// Evaluates filters against documents.
pub(crate) struct FilterEvaluator;

impl FilterEvaluator {
    /// Returns `true` if `document` satisfies every clause of `filter`.
    ///
    /// An empty filter matches every document.
    pub(crate) fn matches(document: &DataMap, filter: &DataMap) -> AccessResult<bool> {
        for (key, condition) in filter {
            let satisfied = match key.as_str() {
                "$and" => {
                    let mut all = true;
                    for clause in Self::clauses(key, condition)? {
                        if !Self::matches(document, clause)? {
                            all = false;
                            break;
                        }
                    }
                    all
                }
                "$or" | "$nor" => {
                    let mut any = false;
                    for clause in Self::clauses(key, condition)? {
                        if Self::matches(document, clause)? {
                            any = true;
                            break;
                        }
                    }
                    if key == "$or" { any } else { !any }
                }
                op if op.starts_with('$') => {
                    return Err(AccessError::Unsupported(format!("top-level operator {op}")));
                }
                path => Self::matches_field(document.get_path(path), condition)?,
            };

            if !satisfied {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Filters `documents`, keeping their order.
    pub(crate) fn filter_documents<'a>(
        documents: impl IntoIterator<Item = &'a DataMap>,
        filter: &DataMap,
    ) -> AccessResult<Vec<&'a DataMap>> {
        let mut matched = Vec::new();
        for document in documents {
            if Self::matches(document, filter)? {
                matched.push(document);
            }
        }
        Ok(matched)
    }

    fn clauses<'a>(key: &str, condition: &'a Value) -> AccessResult<Vec<&'a DataMap>> {
        condition
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| AccessError::InvalidDocument(format!("{key} requires a non-empty array")))?
            .iter()
            .map(|item| {
                item.as_map()
                    .ok_or_else(|| AccessError::InvalidDocument(format!("{key} entries must be documents")))
            })
            .collect()
    }

    fn is_operator_map(map: &DataMap) -> bool {
        !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
    }

    fn matches_field(field: Option<&Value>, condition: &Value) -> AccessResult<bool> {
        match condition {
            Value::Map(ops) if Self::is_operator_map(ops) => {
                for (op, operand) in ops {
                    if !Self::apply(op, field, operand)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            expected => Ok(Self::equals(field, expected)),
        }
    }

    /// Equality as the store sees it: a missing field equals null and an
    /// array field matches when it, or any element, equals the value.
    fn equals(field: Option<&Value>, expected: &Value) -> bool {
        match field {
            None => expected.is_null(),
            Some(value @ Value::Array(items)) => {
                values_equal(value, expected) || items.iter().any(|item| values_equal(item, expected))
            }
            Some(value) => values_equal(value, expected),
        }
    }

    fn compare(field: Option<&Value>, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
        let compatible = |value: &Value| {
            type_rank(value) == type_rank(operand) && accept(total_cmp(value, operand))
        };

        match field {
            None => false,
            Some(value @ Value::Array(items)) => compatible(value) || items.iter().any(compatible),
            Some(value) => compatible(value),
        }
    }

    fn apply(op: &str, field: Option<&Value>, operand: &Value) -> AccessResult<bool> {
        Ok(match op {
            "$eq" => Self::equals(field, operand),
            "$ne" => !Self::equals(field, operand),
            "$gt" => Self::compare(field, operand, Ordering::is_gt),
            "$gte" => Self::compare(field, operand, Ordering::is_ge),
            "$lt" => Self::compare(field, operand, Ordering::is_lt),
            "$lte" => Self::compare(field, operand, Ordering::is_le),
            "$in" | "$nin" => {
                let candidates = operand
                    .as_array()
                    .ok_or_else(|| AccessError::InvalidDocument(format!("{op} needs an array")))?;
                let any = candidates
                    .iter()
                    .any(|candidate| Self::equals(field, candidate));

                if op == "$in" { any } else { !any }
            }
            "$exists" => {
                let should_exist = match operand {
                    Value::Bool(b) => *b,
                    Value::Int32(_) | Value::Int64(_) => operand.as_i64() != Some(0),
                    Value::Null => false,
                    _ => true,
                };
                field.is_some() == should_exist
            }
            other => return Err(AccessError::Unsupported(format!("field operator {other}"))),
        })
    }
}
