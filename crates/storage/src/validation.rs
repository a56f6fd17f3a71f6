use mongodb::bson::{Bson, Document};

use crate::db_provider::Operation;
use crate::errors::DBError;

/// Unwraps `value` as a document, or reports which operation was misused.
pub fn expect_mapping(operation: Operation, value: Bson) -> Result<Document, DBError> {
    match value {
        Bson::Document(document) => Ok(document),
        other => Err(DBError::Validation(format!(
            "{} expects a mapping, got {:?}",
            operation.name(),
            other.element_type()
        ))),
    }
}

/// Update specs must be made of update operators only (`$set`, `$inc`, ...).
///
/// A bare `{field: value}` document would otherwise be rejected by the
/// driver at call time and surface as a driver error; it is a caller
/// mistake, so it is reported as one.
pub fn expect_update_spec(value: Bson) -> Result<Document, DBError> {
    let spec = expect_mapping(Operation::Update, value)?;

    if spec.is_empty() {
        return Err(DBError::Validation("update expects a non-empty update spec".to_string()));
    }

    if let Some(field) = spec.keys().find(|key| !key.starts_with('$')) {
        return Err(DBError::Validation(format!(
            "update expects an update operator spec (e.g. {{\"$set\": {{...}}}}), found bare field `{}`",
            field
        )));
    }

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{bson, doc, Bson};

    use super::*;

    #[test]
    fn test_document_passes_through() {
        let document = doc! { "name": "Rex", "tags": ["good", "boy"], "owner": { "age": 31 } };
        let result = expect_mapping(Operation::Create, Bson::Document(document.clone())).unwrap();
        assert_eq!(result, document);
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        let inputs = vec![
            Bson::String("Rex".to_string()),
            Bson::Int32(7),
            Bson::Null,
            bson!([{ "name": "Rex" }]),
        ];

        for input in inputs {
            let err = expect_mapping(Operation::Read, input).unwrap_err();
            assert!(err.is_validation());
            assert!(err.to_string().contains("read expects a mapping"));
        }
    }

    #[test]
    fn test_update_spec_accepts_operators() {
        let spec = doc! { "$set": { "species": "Canine" }, "$inc": { "visits": 1 } };
        assert_eq!(expect_update_spec(Bson::Document(spec.clone())).unwrap(), spec);
    }

    #[test]
    fn test_update_spec_rejects_bare_fields() {
        let err = expect_update_spec(Bson::Document(doc! { "species": "Canine" })).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("`species`"));

        let err = expect_update_spec(Bson::Document(doc! { "$set": { "a": 1 }, "b": 2 }))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_spec_rejects_empty_and_non_mapping() {
        assert!(expect_update_spec(Bson::Document(doc! {})).unwrap_err().is_validation());
        assert!(expect_update_spec(Bson::Boolean(true)).unwrap_err().is_validation());
    }
}
