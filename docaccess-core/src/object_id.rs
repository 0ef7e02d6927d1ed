//! Object identifier parsing and cleanup.

use bson::oid::ObjectId;

use crate::{
    error::{AccessError, AccessResult},
    value::{DataMap, Value},
};

/// Wrapper prefixes produced by the debug/string form of identifiers.
const WRAPPERS: [&str; 2] = ["ObjectID(", "ObjectId("];

/// Parses a 24-character hexadecimal string into an [`ObjectId`].
///
/// # Errors
///
/// Returns [`AccessError::InvalidObjectId`] for any other input.
pub fn parse_object_id(hex: &str) -> AccessResult<ObjectId> {
    ObjectId::parse_str(hex).map_err(|e| AccessError::InvalidObjectId(hex.to_string(), e.to_string()))
}

/// Strips `ObjectID(...)` style wrapping from an identifier's text form.
///
/// Every wrapper prefix, closing parenthesis and double quote is removed.
/// The remainder is not validated.
pub fn bare_object_id(object_id: &str) -> String {
    let mut bare = object_id.to_string();
    for wrapper in WRAPPERS {
        bare = bare.replace(wrapper, "");
    }
    bare.replace([')', '"'], "")
}

/// Builds the `{"_id": id}` filter.
pub fn id_filter(id: ObjectId) -> DataMap {
    DataMap::from([("_id".to_string(), Value::ObjectId(id))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_hex() {
        let id = ObjectId::new();

        assert_eq!(parse_object_id(&id.to_hex()).unwrap(), id);
        assert_eq!(
            parse_object_id("507F1F77BCF86CD799439011").unwrap().to_hex(),
            "507f1f77bcf86cd799439011",
        );
    }

    #[test]
    fn rejects_everything_else() {
        for input in [
            "",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "507f1f77bcf86cd79943901z",
            "ObjectId(\"507f1f77bcf86cd799439011\")",
        ] {
            assert!(
                matches!(parse_object_id(input), Err(AccessError::InvalidObjectId(ref s, _)) if s == input),
                "{input:?} should not parse",
            );
        }
    }

    #[test]
    fn bare_object_id_strips_wrappers() {
        assert_eq!(bare_object_id("ObjectID(\"507f1f77bcf86cd799439011\")"), "507f1f77bcf86cd799439011");
        assert_eq!(bare_object_id("ObjectId(\"507f1f77bcf86cd799439011\")"), "507f1f77bcf86cd799439011");
        assert_eq!(bare_object_id("507f1f77bcf86cd799439011"), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn bare_object_id_does_not_validate() {
        assert_eq!(bare_object_id("ObjectID(nonsense)"), "nonsense");
    }

    #[test]
    fn id_filter_targets_the_id_field() {
        let id = ObjectId::new();

        assert_eq!(id_filter(id).get("_id"), Some(&Value::ObjectId(id)));
    }
}
