//! IR interchange document
//!
//! Stage 1 writes and stage 2 reads a JSON document of the shape
//!
//! ```json
//! { "classes": { "pcl::AstrometricMetadata": { "name": "AstrometricMetadata", ... } } }
//! ```
//!
//! The document is the only thing crossing the process boundary between the
//! two stages, so a cached IR can be regenerated without re-parsing.

use crate::error::{WeldError, WeldResult};
use crate::ir::{ClassInfo, IrMap};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const CLASSES_KEY: &str = "classes";

/// Serialize an IR map, pretty-printed with sorted keys
pub fn to_json(classes: &IrMap) -> WeldResult<String> {
    let mut root = serde_json::Map::new();
    root.insert(CLASSES_KEY.to_string(), serde_json::to_value(classes)?);
    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

/// Parse an IR document
///
/// Fails when the text is not JSON or has no `"classes"` object. A single
/// entry that does not deserialize is skipped with a warning. The map key
/// is the qualified name of its entry, whatever the entry itself records.
pub fn from_json(text: &str) -> WeldResult<IrMap> {
    let root: Value = serde_json::from_str(text)?;

    let classes = match root {
        Value::Object(mut map) => match map.remove(CLASSES_KEY) {
            Some(Value::Object(classes)) => classes,
            Some(_) => return Err(WeldError::malformed("\"classes\" is not an object")),
            None => return Err(WeldError::malformed("missing \"classes\" object")),
        },
        _ => return Err(WeldError::malformed("document root is not an object")),
    };

    let mut ir = IrMap::new();
    for (key, entry) in classes {
        match serde_json::from_value::<ClassInfo>(entry) {
            Ok(mut class) => {
                if !class.qualified_name.is_empty() && class.qualified_name != key {
                    warn!(
                        class = %key,
                        recorded = %class.qualified_name,
                        "Entry names another class, using its key"
                    );
                }
                class.qualified_name = key.clone();
                if class.name.is_empty() {
                    class.name = simple_name(&class.qualified_name).to_string();
                }
                ir.insert(key, class);
            }
            Err(e) => warn!(class = %key, error = %e, "Skipping malformed class entry"),
        }
    }

    debug!(count = ir.len(), "Parsed IR document");
    Ok(ir)
}

/// Write an IR map to a file
pub fn write_ir(path: impl AsRef<Path>, classes: &IrMap) -> WeldResult<()> {
    let path = path.as_ref();
    let json = to_json(classes)?;
    fs::write(path, json).map_err(|e| WeldError::io(path, e))
}

/// Read an IR map from a file
pub fn read_ir(path: impl AsRef<Path>) -> WeldResult<IrMap> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| WeldError::io(path, e))?;
    from_json(&text)
}

/// Last path segment of a qualified name
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit("::").next().unwrap_or(qualified)
}
