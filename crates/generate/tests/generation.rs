//! End-to-end generator pipeline tests.
//!
//! Each test declares schema interfaces in a fresh universe, runs the
//! full resolve → cook → immutify pipeline, and checks the produced
//! artifacts (or the collected errors). Registry-touching tests use
//! schema names no other test registers, since the factory registry is
//! process-wide.

use std::sync::Arc;

use grain_core::grain::flags;
use grain_core::reflect::{names, Decl, MethodSig, Type, TypeUniverse};
use grain_core::{factory_for, Value};
use grain_generate::{generate, install, SchemaArtifact, SchemaError, TypePolicy};
use rust_decimal::Decimal;

fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn getter(name: &str, ty: Type) -> MethodSig {
    MethodSig::accessor(name, ty)
}

/// Order/OrderLine: scalars, containers, and a schema-to-schema reference.
fn orders_universe() -> TypeUniverse {
    let mut u = TypeUniverse::with_standard();
    u.declare(
        Decl::schema("Order")
            .with_method(getter("getId", Type::named(names::UUID)))
            .with_method(getter(
                "getLines",
                Type::parameterized(names::LIST, vec![Type::named("OrderLine")]),
            ))
            .with_method(getter("getTotal", Type::named(names::DECIMAL)))
            .with_method(getter("isPriority", Type::named(names::BOOL)))
            .with_method(getter(
                "getTags",
                Type::parameterized(names::SET, vec![Type::named(names::STRING)]),
            )),
    )
    .unwrap();
    u.declare(
        Decl::schema("OrderLine")
            .with_method(getter("getSku", Type::named(names::STRING)))
            .with_method(getter("getQuantity", Type::named(names::INT32)))
            .with_method(getter("getPrice", Type::named(names::DECIMAL))),
    )
    .unwrap();
    u
}

fn artifact<'a>(artifacts: &'a [SchemaArtifact], schema: &str) -> &'a SchemaArtifact {
    artifacts
        .iter()
        .find(|a| a.schema == schema)
        .unwrap_or_else(|| panic!("no artifact for schema '{schema}'"))
}

#[test]
fn pipeline_produces_immutable_artifacts() {
    init_logs();
    let u = orders_universe();
    let policy = TypePolicy::standard(&u);
    let artifacts = generate(&u, &["Order", "OrderLine"], &policy).unwrap();
    assert_eq!(artifacts.len(), 2);

    let order = artifact(&artifacts, "Order");
    assert_eq!(order.grain_name, "OrderGrain");
    let names_in_order: Vec<&str> = order.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names_in_order, ["id", "lines", "total", "priority", "tags"]);

    let lines = &order.properties[1];
    assert_eq!(
        lines.immutable,
        Type::parameterized(names::CONST_LIST, vec![Type::named("OrderLineGrain")])
    );
    assert_eq!(lines.default, Value::Null);

    let total = &order.properties[2];
    assert_eq!(total.immutable, Type::named(names::DECIMAL));
    assert_eq!(total.default, Value::Decimal(Decimal::ZERO));

    let priority = &order.properties[3];
    assert_eq!(priority.flags, flags::IS_PROPERTY);
    assert_eq!(priority.default, Value::Bool(false));

    let tags = &order.properties[4];
    assert_eq!(
        tags.immutable,
        Type::parameterized(names::CONST_SET, vec![Type::named(names::STRING)])
    );

    let line = artifact(&artifacts, "OrderLine");
    assert_eq!(line.properties[1].default, Value::Int(0));
}

#[test]
fn recursive_schema_terminates() {
    let mut u = TypeUniverse::with_standard();
    u.declare(
        Decl::schema("Category")
            .with_method(getter("getName", Type::named(names::STRING)))
            .with_method(getter(
                "getChildren",
                Type::parameterized(names::LIST, vec![Type::named("Category")]),
            )),
    )
    .unwrap();
    let policy = TypePolicy::standard(&u);

    let artifacts = generate(&u, &["Category"], &policy).unwrap();
    let children = &artifact(&artifacts, "Category").properties[1];
    assert_eq!(
        children.immutable,
        Type::parameterized(names::CONST_LIST, vec![Type::named("CategoryGrain")])
    );
}

#[test]
fn narrowest_inherited_type_survives_generation() {
    let mut u = TypeUniverse::with_standard();
    u.declare(Decl::schema("Sized").with_method(getter("getSize", Type::named(names::OBJECT))))
        .unwrap();
    u.declare(Decl::schema("Counted").with_method(getter("getSize", Type::named(names::INT32))))
        .unwrap();
    u.declare(Decl::schema("Measured").with_method(getter("getSize", Type::named(names::NUMBER))))
        .unwrap();
    u.declare(
        Decl::schema("Inventory")
            .extending(Type::named("Sized"))
            .extending(Type::named("Counted"))
            .extending(Type::named("Measured")),
    )
    .unwrap();
    let policy = TypePolicy::standard(&u);

    let artifacts = generate(&u, &["Inventory"], &policy).unwrap();
    let size = &artifact(&artifacts, "Inventory").properties[0];
    assert_eq!(size.name, "size");
    assert_eq!(size.immutable, Type::named(names::INT32));
    assert_eq!(size.default, Value::Int(0));
}

#[test]
fn all_errors_of_a_run_are_collected() {
    let mut u = TypeUniverse::with_standard();
    u.declare(Decl::class("Widget")).unwrap();
    u.declare(
        Decl::schema("Broken")
            .with_method(getter("getData", Type::array(Type::named(names::STRING))))
            .with_method(getter("getWidget", Type::named("Widget")))
            .with_method(getter("getName", Type::named(names::STRING))),
    )
    .unwrap();
    u.declare(
        Decl::schema("AlsoBroken")
            .with_method(getter("getThing", Type::named("Ghost"))),
    )
    .unwrap();
    let policy = TypePolicy::standard(&u);

    let errors = generate(&u, &["Broken", "AlsoBroken", "Broken", "Missing"], &policy).unwrap_err();
    assert_eq!(errors.len(), 5, "errors: {errors:?}");
    assert!(matches!(
        &errors[0],
        SchemaError::DuplicateSchema { name } if name == "Broken"
    ));
    assert!(matches!(
        &errors[1],
        SchemaError::UnknownSchema { name } if name == "Missing"
    ));
    assert!(matches!(
        &errors[2],
        SchemaError::Immutify { schema, property, .. }
            if schema == "Broken" && property == "data"
    ));
    assert!(matches!(
        &errors[3],
        SchemaError::Immutify { schema, property, .. }
            if schema == "Broken" && property == "widget"
    ));
    assert!(matches!(
        &errors[4],
        SchemaError::UnknownTypeInSignature { schema, type_name, .. }
            if schema == "AlsoBroken" && type_name == "Ghost"
    ));
}

#[test]
fn raw_container_property_fails_generation() {
    let mut u = TypeUniverse::with_standard();
    u.declare(
        Decl::schema("Loose").with_method(getter("getItems", Type::named(names::CONST_LIST))),
    )
    .unwrap();
    let policy = TypePolicy::standard(&u);

    let errors = generate(&u, &["Loose"], &policy).unwrap_err();
    assert_eq!(errors.len(), 1);
    // cooking expands the raw use to `ConstList<?>`, whose implicit
    // unbounded element is what has no immutable form
    assert!(matches!(
        &errors[0],
        SchemaError::Immutify { schema, property, .. }
            if schema == "Loose" && property == "items"
    ));
    assert!(errors[0].to_string().contains("open wildcard"));
}

#[test]
fn descriptors_round_trip_and_install_registers_factories() {
    init_logs();
    let mut u = TypeUniverse::with_standard();
    u.declare(
        Decl::schema("Invoice")
            .with_method(getter("getNumber", Type::named(names::STRING)))
            .with_method(getter("getTotal", Type::named(names::DECIMAL)))
            .with_method(getter(
                "getItems",
                Type::parameterized(names::LIST, vec![Type::named("InvoiceItem")]),
            )),
    )
    .unwrap();
    u.declare(
        Decl::schema("InvoiceItem")
            .with_method(getter("getSku", Type::named(names::STRING)))
            .with_method(getter("getCount", Type::named(names::INT64))),
    )
    .unwrap();
    let policy = TypePolicy::standard(&u);
    let artifacts = generate(&u, &["Invoice", "InvoiceItem"], &policy).unwrap();

    for a in &artifacts {
        let restored = SchemaArtifact::from_descriptor(&a.to_descriptor()).unwrap();
        assert_eq!(&restored, a);
    }

    let factories = install(&artifacts).unwrap();
    let invoice = factory_for("Invoice").expect("Invoice registered");
    assert!(Arc::ptr_eq(&factories[0], &invoice));

    let default = invoice.default_grain();
    assert_eq!(default.get("number"), Some(&Value::Null));
    assert_eq!(default.get("total"), Some(&Value::Decimal(Decimal::ZERO)));
    assert_eq!(default.size(), 3);

    let mut builder = invoice.new_builder();
    builder.put("number", "INV-7").put("total", Value::Decimal(Decimal::new(4250, 2)));
    let grain = builder.build();
    assert_eq!(grain.get("number"), Some(&Value::Str("INV-7".into())));
    assert_eq!(grain.schema().grain_name(), "InvoiceGrain");

    // registration is first-wins: a second install observes the originals
    let again = install(&artifacts).unwrap();
    assert!(Arc::ptr_eq(&again[0], &invoice));
}
