//! `@type` annotation
//!
//! The document store types every nested object by the key it sits under.
//! Objects inside a list take the list's key.

use serde_json::Value;

pub const TYPE_KEY: &str = "@type";

/// Tag the root with `root_type` and every nested object with its parent key.
/// Existing `@type` members are overwritten. Non-object roots are left as is.
pub fn annotate_types(document: &mut Value, root_type: &str) {
    if let Value::Object(map) = document {
        map.insert(TYPE_KEY.to_string(), Value::String(root_type.to_string()));
        annotate_members(map);
    }
}

fn annotate_members(map: &mut serde_json::Map<String, Value>) {
    for (key, value) in map.iter_mut() {
        if key == TYPE_KEY {
            continue;
        }
        if value.is_object() {
            annotate_types(value, key);
        } else if let Value::Array(items) = value {
            for item in items.iter_mut().filter(|item| item.is_object()) {
                annotate_types(item, key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_take_parent_key() {
        let mut doc = json!({
            "ResourceID": "spase://x",
            "ResourceHeader": {
                "ResourceName": "x",
                "Contact": [{"PersonID": "spase://a"}, {"PersonID": "spase://b"}]
            },
            "Keyword": ["Sun"]
        });
        annotate_types(&mut doc, "DisplayData");

        assert_eq!(doc["@type"], json!("DisplayData"));
        assert_eq!(doc["ResourceHeader"]["@type"], json!("ResourceHeader"));
        assert_eq!(doc["ResourceHeader"]["Contact"][0]["@type"], json!("Contact"));
        assert_eq!(doc["ResourceHeader"]["Contact"][1]["@type"], json!("Contact"));
        assert_eq!(doc["Keyword"], json!(["Sun"]));
        assert_eq!(doc["ResourceID"], json!("spase://x"));
    }

    #[test]
    fn test_existing_type_overwritten() {
        let mut doc = json!({"@type": "Old", "TimeSpan": {"@type": "Old"}});
        annotate_types(&mut doc, "TemporalDescription");
        assert_eq!(
            doc,
            json!({"@type": "TemporalDescription", "TimeSpan": {"@type": "TimeSpan"}})
        );
    }

    #[test]
    fn test_scalar_root_untouched() {
        let mut doc = json!("x");
        annotate_types(&mut doc, "DisplayData");
        assert_eq!(doc, json!("x"));
    }
}
