use apicat_catalog::CatalogBuilder;
use apicat_core::{ApiKind, CatalogId};
use apicat_markup::Markup;
use pretty_assertions::assert_eq;

fn id(text: &str) -> CatalogId {
    CatalogId::for_documentation_id(text)
}

fn markup(source: &str) -> Markup {
    Markup::parse(source).unwrap()
}

struct Offsets {
    namespace: u32,
    class: u32,
    method: u32,
    first: u32,
    second: u32,
}

/// `System.Widget.Run()` declared in two assemblies; the second one declares
/// `Run` as virtual.
fn widget_catalog() -> (CatalogBuilder, Offsets) {
    let mut builder = CatalogBuilder::new();
    let namespace = builder
        .insert_api(id("N:System"), ApiKind::Namespace, None, "System")
        .unwrap();
    let class = builder
        .insert_api(id("T:System.Widget"), ApiKind::Class, Some(namespace), "Widget")
        .unwrap();
    let method = builder
        .insert_api(id("M:System.Widget.Run"), ApiKind::Method, Some(class), "Run()")
        .unwrap();

    let (first, _) = builder
        .insert_assembly(CatalogId::hash_bytes(b"first"), "Widgets", "1.0.0.0", "")
        .unwrap();
    let (second, _) = builder
        .insert_assembly(CatalogId::hash_bytes(b"second"), "Widgets", "2.0.0.0", "b77a5c561934e089")
        .unwrap();

    for assembly in [first, second] {
        builder
            .insert_declaration(namespace, assembly, &markup("<k>namespace</k> System"))
            .unwrap();
        builder
            .insert_declaration(class, assembly, &markup("<k>public</k> <k>class</k> Widget"))
            .unwrap();
    }
    builder
        .insert_declaration(
            method,
            first,
            &markup("<k>public</k> <k>void</k> Run<p>(</p><p>)</p><p>;</p>"),
        )
        .unwrap();
    builder
        .insert_declaration(
            method,
            second,
            &markup("<k>public</k> <k>virtual</k> <k>void</k> Run<p>(</p><p>)</p><p>;</p>"),
        )
        .unwrap();

    let package = builder.insert_package("Contoso.Widgets", "1.0.0").unwrap();
    let net45 = builder.insert_framework("net45").unwrap();
    let net6 = builder.insert_framework("net6.0").unwrap();
    builder.add_availability(first, package, net45).unwrap();
    builder.add_availability(second, package, net6).unwrap();

    (
        builder,
        Offsets {
            namespace,
            class,
            method,
            first,
            second,
        },
    )
}

#[test]
fn rendered_declaration_nests_inside_ancestors() {
    let (builder, o) = widget_catalog();
    let view = builder.view();
    let method = view.api(o.method);

    let declaration = view.declaration(method, view.assembly(o.first)).unwrap();
    assert_eq!(
        declaration.render().to_string(),
        "namespace System\n{\n    public class Widget\n    {\n        public void Run();\n    }\n}\n"
    );

    let declaration = view.declaration(method, view.assembly(o.second)).unwrap();
    assert_eq!(
        declaration.render().to_string(),
        "namespace System\n{\n    public class Widget\n    {\n        public virtual void Run();\n    }\n}\n"
    );
}

#[test]
fn tree_navigation() {
    let (builder, o) = widget_catalog();
    let view = builder.view();

    let roots: Vec<_> = view.root_apis().map(|api| api.name()).collect();
    assert_eq!(roots, ["System"]);

    let method = view.api_by_id(id("M:System.Widget.Run")).unwrap();
    assert_eq!(method.offset(), o.method);
    assert_eq!(method.kind(), ApiKind::Method);
    assert_eq!(method.full_name(), "System.Widget.Run()");
    let ancestors: Vec<_> = method.ancestors().map(|api| api.offset()).collect();
    assert_eq!(ancestors, [o.class, o.namespace]);

    assert!(view.api_by_id(id("M:System.Widget.Stop")).is_none());
    assert_eq!(view.apis_named("Widget").count(), 1);
}

#[test]
fn declarations_and_availability() {
    let (builder, o) = widget_catalog();
    let view = builder.view();
    let method = view.api(o.method);

    let assemblies: Vec<_> = method
        .declarations()
        .map(|d| d.assembly().version())
        .collect();
    assert_eq!(assemblies, ["1.0.0.0", "2.0.0.0"]);

    let frameworks: Vec<_> = method.frameworks().into_iter().collect();
    assert_eq!(frameworks, ["net45", "net6.0"]);

    let second = view.assembly(o.second);
    assert_eq!(second.public_key_token(), "b77a5c561934e089");
    let availability: Vec<_> = second
        .availability()
        .map(|a| (a.package().id(), a.package().version(), a.framework().name()))
        .collect();
    assert_eq!(availability, [("Contoso.Widgets", "1.0.0", "net6.0")]);
    assert_eq!(second.root_apis().count(), 1);

    let stats = view.stats();
    assert_eq!(stats.apis, 3);
    assert_eq!(stats.assemblies, 2);
    assert_eq!(stats.declarations, 6);
    // Namespace and class markup is shared between the assemblies.
    assert_eq!(stats.markups, 4);
}
