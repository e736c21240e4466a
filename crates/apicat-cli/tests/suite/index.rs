use apicat_core::{Accessibility, ApiKind};
use apicat_indexer::{AssemblyInfo, Symbol, SymbolTree};
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;

use super::fixtures::{apicat, publish_package, write_config};

fn widget_manifest() -> Vec<u8> {
    let mut tree = SymbolTree::new(AssemblyInfo {
        name: "Contoso.Widgets".to_string(),
        version: "1.0.0.0".to_string(),
        public_key_token: "b77a5c561934e089".to_string(),
    });
    let ns = tree.push(Symbol {
        kind: ApiKind::Namespace,
        name: "Contoso".to_string(),
        documentation_id: "N:Contoso".to_string(),
        accessibility: Accessibility::Public,
        parent: None,
        declaration: "<k>namespace</k> Contoso".to_string(),
    });
    let widget = tree.push(Symbol {
        kind: ApiKind::Class,
        name: "Widget".to_string(),
        documentation_id: "T:Contoso.Widget".to_string(),
        accessibility: Accessibility::Public,
        parent: Some(ns),
        declaration: "<k>public</k> <k>class</k> Widget".to_string(),
    });
    tree.push(Symbol {
        kind: ApiKind::Method,
        name: "Run()".to_string(),
        documentation_id: "M:Contoso.Widget.Run".to_string(),
        accessibility: Accessibility::Public,
        parent: Some(widget),
        declaration: "<k>public</k> <k>void</k> Run<p>(</p><p>)</p><p>;</p>".to_string(),
    });
    serde_json::to_vec(&tree).unwrap()
}

fn publish_widgets(temp: &TempDir, version: &str) {
    let manifest = widget_manifest();
    publish_package(
        temp.child("feed").path(),
        "Contoso.Widgets",
        version,
        &[],
        &[("lib/net45/Contoso.Widgets.dll", manifest.as_slice())],
    );
}

fn index_json(temp: &TempDir, packages: &[&str]) -> (i32, Value) {
    let output = apicat()
        .current_dir(temp.path())
        .arg("index")
        .args(packages)
        .arg("--json")
        .output()
        .unwrap();
    let code = output.status.code().unwrap();
    assert!(
        code == 0 || code == 1,
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    (code, serde_json::from_slice(&output.stdout).unwrap())
}

#[test]
fn index_creates_catalog_and_reopens_it_for_later_runs() {
    let temp = TempDir::new().unwrap();
    write_config(
        &temp,
        "\n[catalog]\npath = 'widgets.catalog'\ncompression = 'zstd'\n\n[indexer]\nworkers = 2\nqueue_capacity = 1\n",
    );
    publish_widgets(&temp, "1.0.0");
    publish_widgets(&temp, "1.1.0");

    let (code, report) = index_json(&temp, &["Contoso.Widgets@1.0.0"]);
    assert_eq!(code, 0);
    assert_eq!(report["packages"][0]["frameworks"], serde_json::json!(["net45"]));
    assert_eq!(report["merged"]["apis"], 3);
    assert_eq!(report["merged"]["assemblies"], 1);
    assert_eq!(report["merged"]["declarations"], 3);
    temp.child("widgets.catalog").assert(predicate::path::is_file());

    // Same surface in a new version: only availability is added.
    let (code, report) = index_json(&temp, &["Contoso.Widgets@1.1.0"]);
    assert_eq!(code, 0);
    assert_eq!(report["merged"]["apis"], 0);
    assert_eq!(report["merged"]["declarations"], 0);
    assert_eq!(report["merged"]["availability"], 1);

    let output = apicat()
        .current_dir(temp.path())
        .args(["inspect", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let inspect: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(inspect["compression"], "zstd");
    assert_eq!(inspect["stats"]["apis"], 3);
    assert_eq!(inspect["stats"]["packages"], 2);

    apicat()
        .current_dir(temp.path())
        .args(["lookup", "Run()"])
        .assert()
        .success()
        .stdout(predicate::str::contains("public void Run();"));
}

#[test]
fn index_reports_missing_packages_and_exits_with_one() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "");
    publish_widgets(&temp, "1.0.0");

    let (code, report) = index_json(&temp, &["Contoso.Widgets@1.0.0", "Missing.Package@2.0.0"]);
    assert_eq!(code, 1);
    assert_eq!(report["packages"][0]["id"], "Contoso.Widgets");
    assert_eq!(report["failures"][0]["id"], "Missing.Package");
    assert_eq!(report["failures"][0]["version"], "2.0.0");
    temp.child("apicat.catalog").assert(predicate::path::is_file());
}

#[test]
fn index_rejects_malformed_package_arguments() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "");

    apicat()
        .current_dir(temp.path())
        .args(["index", "Contoso.Widgets"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected <ID>@<VERSION>"));
    temp.child("apicat.catalog").assert(predicate::path::missing());
}
