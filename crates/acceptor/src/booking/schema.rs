//! JSON Schema checks for API payloads.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::debug;

use crate::result::{AcceptorError, AcceptorResult};

/// Schema returned by `GET /booking/{id}`
pub const BOOKING_SCHEMA: &str = "booking_schema.json";
/// Schema returned by `POST /booking`
pub const BOOKING_CREATED_SCHEMA: &str = "booking_created_schema.json";
/// Schema returned by `POST /auth`
pub const AUTH_SCHEMA: &str = "auth_schema.json";

/// Loads schemas from a directory and validates values against them.
///
/// Compiled schemas are cached by file name for the life of the store.
pub struct SchemaStore {
    dir: PathBuf,
    compiled: Mutex<HashMap<String, Arc<JSONSchema>>>,
}

impl fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl SchemaStore {
    /// Create a store over `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            compiled: Mutex::new(HashMap::new()),
        }
    }

    /// Directory the schemas are read from
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self, name: &str) -> AcceptorResult<Arc<JSONSchema>> {
        let mut cache = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(schema) = cache.get(name) {
            return Ok(Arc::clone(schema));
        }

        let path = self.dir.join(name);
        debug!(path = %path.display(), "loading schema");
        let text = fs::read_to_string(&path)?;
        let raw: Value = serde_json::from_str(&text)?;
        let schema = JSONSchema::compile(&raw).map_err(|e| AcceptorError::Schema {
            schema: name.to_string(),
            message: format!("invalid schema: {e}"),
        })?;
        let schema = Arc::new(schema);
        cache.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Validate `instance` against the named schema, listing every violation
    pub fn validate(&self, name: &str, instance: &Value) -> AcceptorResult<()> {
        let schema = self.load(name)?;
        let result = schema.validate(instance);
        if let Err(errors) = result {
            let message = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AcceptorError::Schema {
                schema: name.to_string(),
                message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with(name: &str, schema: &Value) -> (TempDir, SchemaStore) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(name), schema.to_string()).unwrap();
        let store = SchemaStore::new(dir.path());
        (dir, store)
    }

    fn booking_schema() -> Value {
        json!({
            "type": "object",
            "required": ["firstname", "totalprice"],
            "properties": {
                "firstname": {"type": "string"},
                "totalprice": {"type": "integer"}
            }
        })
    }

    #[test]
    fn test_valid_instance() {
        let (_dir, store) = store_with(BOOKING_SCHEMA, &booking_schema());
        store
            .validate(BOOKING_SCHEMA, &json!({"firstname": "Jim", "totalprice": 111}))
            .unwrap();
    }

    #[test]
    fn test_every_violation_reported() {
        let (_dir, store) = store_with(BOOKING_SCHEMA, &booking_schema());
        let err = store
            .validate(BOOKING_SCHEMA, &json!({"firstname": 7, "totalprice": "x"}))
            .unwrap_err();
        let AcceptorError::Schema { schema, message } = err else {
            panic!("expected schema error");
        };
        assert_eq!(schema, BOOKING_SCHEMA);
        assert!(message.contains("/firstname"));
        assert!(message.contains("/totalprice"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path());
        let err = store.validate("nope.json", &json!({})).unwrap_err();
        assert!(matches!(err, AcceptorError::Io(_)));
    }

    #[test]
    fn test_bundled_schemas_compile() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schemas");
        let store = SchemaStore::new(dir);
        let booking = json!({
            "firstname": "Jim",
            "lastname": "Brown",
            "totalprice": 111,
            "depositpaid": true,
            "bookingdates": {"checkin": "2018-01-01", "checkout": "2019-01-01"},
            "additionalneeds": "Breakfast"
        });
        store.validate(BOOKING_SCHEMA, &booking).unwrap();
        store
            .validate(BOOKING_CREATED_SCHEMA, &json!({"bookingid": 1, "booking": booking}))
            .unwrap();
        store.validate(AUTH_SCHEMA, &json!({"token": "abc123"})).unwrap();
        assert!(store.validate(AUTH_SCHEMA, &json!({"reason": "Bad credentials"})).is_err());
    }
}
