use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;

use super::fixtures::{apicat, widget_id, write_widget_catalog};

#[test]
fn help_mentions_core_commands() {
    apicat().arg("--help").assert().success().stdout(
        predicate::str::contains("inspect")
            .and(predicate::str::contains("lookup"))
            .and(predicate::str::contains("resolve"))
            .and(predicate::str::contains("schema")),
    );
}

#[test]
fn inspect_json_reports_counts() {
    let temp = TempDir::new().unwrap();
    let catalog = temp.child("apicat.catalog");
    write_widget_catalog(catalog.path());

    let output = apicat()
        .current_dir(temp.path())
        .args(["inspect", "--json", "--catalog"])
        .arg(catalog.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["compression"], "none");
    assert_eq!(report["stats"]["apis"], 3);
    assert_eq!(report["stats"]["root_apis"], 1);
    assert_eq!(report["stats"]["assemblies"], 1);
    assert_eq!(report["stats"]["declarations"], 3);
    assert_eq!(report["stats"]["packages"], 1);
    assert_eq!(report["frameworks"], serde_json::json!(["net45"]));
}

#[test]
fn inspect_uses_catalog_path_from_config() {
    let temp = TempDir::new().unwrap();
    write_widget_catalog(temp.child("data/widgets.catalog").path());
    temp.child("apicat.toml")
        .write_str("[catalog]\npath = \"data/widgets.catalog\"\n")
        .unwrap();

    apicat()
        .current_dir(temp.path())
        .arg("inspect")
        .assert()
        .success()
        .stdout(predicate::str::contains("apis: 3").and(predicate::str::contains("net45")));
}

#[test]
fn inspect_missing_catalog_fails() {
    let temp = TempDir::new().unwrap();
    apicat()
        .current_dir(temp.path())
        .args(["inspect", "--catalog", "nope.catalog"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to open catalog"));
}

#[test]
fn lookup_by_name_renders_nested_declaration() {
    let temp = TempDir::new().unwrap();
    let catalog = temp.child("apicat.catalog");
    write_widget_catalog(catalog.path());

    let output = apicat()
        .current_dir(temp.path())
        .args(["lookup", "Run()", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["kind"], "method");
    assert_eq!(reports[0]["name"], "Contoso.Widget.Run()");
    assert_eq!(reports[0]["frameworks"], serde_json::json!(["net45"]));
    let declaration = &reports[0]["declarations"][0];
    assert_eq!(declaration["assembly"], "Contoso.Widgets");
    assert_eq!(declaration["assembly_version"], "1.0.0.0");
    assert_eq!(
        declaration["markup"],
        "namespace Contoso\n{\n    public class Widget\n    {\n        public void Run();\n    }\n}\n"
    );
}

#[test]
fn lookup_by_id_prints_declaration() {
    let temp = TempDir::new().unwrap();
    write_widget_catalog(temp.child("apicat.catalog").path());

    apicat()
        .current_dir(temp.path())
        .args(["lookup", &widget_id().to_string()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Contoso.Widget")
                .and(predicate::str::contains("in Contoso.Widgets 1.0.0.0:"))
                .and(predicate::str::contains("public class Widget")),
        );
}

#[test]
fn lookup_of_unknown_api_exits_with_one() {
    let temp = TempDir::new().unwrap();
    write_widget_catalog(temp.child("apicat.catalog").path());

    apicat()
        .current_dir(temp.path())
        .args(["lookup", "Gadget"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no matching apis"));
}

#[test]
fn schema_is_json() {
    let output = apicat().arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(schema["properties"]["catalog"].is_object());
    assert!(schema["properties"]["packages"].is_object());
}

#[test]
fn invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    temp.child("apicat.toml")
        .write_str("[packages]\ntimeout_ms = 0\n")
        .unwrap();

    apicat()
        .current_dir(temp.path())
        .arg("schema")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("packages.timeout_ms"));
}
