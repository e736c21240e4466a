use schemars::schema::{RootSchema, Schema};
use schemars::schema_for;
use serde_json::json;

use crate::ApicatConfig;

/// JSON schema for `apicat.toml`, for editor tooling and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    let mut schema = schema_for!(ApicatConfig);
    apply_semantic_constraints(&mut schema);
    schema
}

fn apply_semantic_constraints(schema: &mut RootSchema) {
    // Only checked when `packages.source` is set explicitly; JSON Schema does
    // not apply defaults.
    push_all_of(
        schema,
        json!({
            "if": {
                "required": ["packages"],
                "properties": {
                    "packages": {
                        "required": ["source"],
                        "properties": {
                            "source": { "type": "string", "pattern": "^https?://" }
                        }
                    }
                }
            },
            "then": {
                "properties": {
                    "packages": {
                        "properties": {
                            "source": {
                                "allOf": [
                                    { "pattern": "\\{id\\}" },
                                    { "pattern": "\\{version\\}" }
                                ]
                            }
                        }
                    }
                }
            }
        }),
    );
}

fn push_all_of(root: &mut RootSchema, value: serde_json::Value) {
    let Ok(schema) = serde_json::from_value::<Schema>(value) else {
        return;
    };
    let subschemas = root.schema.subschemas();
    subschemas.all_of.get_or_insert_with(Vec::new).push(schema);
}
