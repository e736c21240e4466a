use apicat_config::json_schema;

#[test]
fn schema_covers_every_section() {
    let schema = serde_json::to_value(json_schema()).unwrap();
    let properties = schema["properties"].as_object().unwrap();
    let mut keys: Vec<_> = properties.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["catalog", "frameworks", "indexer", "logging", "packages"]);
    assert_eq!(schema["additionalProperties"], serde_json::json!(false));
    assert!(schema["allOf"].as_array().is_some_and(|rules| !rules.is_empty()));

    let catalog = &schema["definitions"]["CatalogConfig"]["properties"];
    assert_eq!(catalog["zstd_level"]["maximum"], serde_json::json!(22.0));
}
