//! Exercises the grain data model invariants end to end: partitioned
//! iteration, with/without algebra, builder lifecycle, cursors, views,
//! and factory registration.

use std::sync::Arc;

use grain_core::codec::{wire_entries, EncodeStyle};
use grain_core::error::GrainError;
use grain_core::grain::{flags, register_factory};
use grain_core::reflect::names;
use grain_core::{
    BasicGrainFactory, Grain, GrainFactory, GrainProperty, GrainSchema, Type, Value,
};

fn point_schema(name: &str) -> Arc<GrainSchema> {
    Arc::new(
        GrainSchema::new(
            name,
            format!("{name}Grain"),
            vec![
                GrainProperty::new("x", Type::named(names::INT64)),
                GrainProperty::new("y", Type::named(names::INT64)),
                GrainProperty::new("label", Type::named(names::STRING)),
                GrainProperty::new("visible", Type::named(names::BOOL))
                    .with_flags(flags::IS_PROPERTY),
            ],
            vec![
                Value::Int(0),
                Value::Int(0),
                Value::Null,
                Value::Bool(false),
            ],
        )
        .unwrap(),
    )
}

fn sample_grain(factory: &BasicGrainFactory) -> Grain {
    let mut b = factory.new_builder();
    b.put("x", 3i64)
        .put("y", 4i64)
        .put("label", "origin offset")
        .put("visible", true)
        .put("note", "extension one")
        .put("rank", 7i64);
    b.build()
}

#[test]
fn iteration_yields_basis_then_extensions_in_order() {
    let factory = BasicGrainFactory::new(point_schema("IterPoint"));
    let grain = sample_grain(&factory);
    let keys: Vec<&str> = grain.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["x", "y", "label", "visible", "note", "rank"]);
    assert_eq!(grain.size(), 6);
}

#[test]
fn basis_keys_never_appear_in_extensions() {
    let factory = BasicGrainFactory::new(point_schema("PartitionPoint"));
    let grain = sample_grain(&factory);
    let ext = grain.extensions();
    assert_eq!(ext.len(), 2);
    assert!(!ext.contains_key("x"));
    assert!(ext.contains_key("note"));

    // routing stays stable through the immutable algebra
    let grain = grain.with("x", 99i64).with("note", "rewritten");
    assert_eq!(grain.extensions().len(), 2);
    assert_eq!(grain.get("x"), Some(&Value::Int(99)));
}

#[test]
fn without_on_basis_preserves_size_and_nulls_slot() {
    let factory = BasicGrainFactory::new(point_schema("WithoutBasis"));
    let grain = sample_grain(&factory);
    let cleared = grain.without("x");
    assert_eq!(cleared.size(), grain.size());
    assert_eq!(cleared.get("x"), Some(&Value::Null));
    assert!(cleared.contains_key("x"));
}

#[test]
fn without_on_extension_removes_the_pair() {
    let factory = BasicGrainFactory::new(point_schema("WithoutExt"));
    let grain = sample_grain(&factory);
    let removed = grain.without("note");
    assert_eq!(removed.size(), grain.size() - 1);
    assert_eq!(removed.get("note"), None);
    assert!(!removed.contains_key("note"));
}

#[test]
fn view_noops_share_storage() {
    let factory = BasicGrainFactory::new(point_schema("ViewPoint"));
    let grain = sample_grain(&factory);

    let keys = grain.key_set();
    assert!(keys.with("x".to_owned()).same_storage(&keys));
    assert!(keys.without("absent").same_storage(&keys));

    let entries = grain.entries();
    assert!(entries
        .with("x".to_owned(), Value::Int(3))
        .same_storage(&entries));
    assert!(entries.without("absent").same_storage(&entries));
}

#[test]
fn equality_ignores_extension_order() {
    let factory = BasicGrainFactory::new(point_schema("EqPoint"));
    let mut a = factory.new_builder();
    a.put("x", 1i64).put("first", "1").put("second", "2");
    let mut b = factory.new_builder();
    b.put("second", "2").put("first", "1").put("x", 1i64);
    assert_eq!(a.build(), b.build());

    let mut c = factory.new_builder();
    c.put("x", 1i64).put("first", "1").put("second", "other");
    assert_ne!(a.build(), c.build());
}

#[test]
fn build_snapshots_later_mutation_is_invisible() {
    let factory = BasicGrainFactory::new(point_schema("SnapPoint"));
    let mut builder = factory.new_builder();
    builder.put("x", 1i64).put("tag", "first");
    let first = builder.build();

    builder.put("x", 2i64).put("tag", "second").put("more", true);
    let second = builder.build();

    assert_eq!(first.get("x"), Some(&Value::Int(1)));
    assert_eq!(first.get("tag"), Some(&Value::Str("first".into())));
    assert_eq!(first.get("more"), None);
    assert_ne!(first, second);
}

#[test]
fn round_trip_through_builder_preserves_everything() {
    let factory = BasicGrainFactory::new(point_schema("RoundPoint"));
    let original = sample_grain(&factory);
    let copy = factory.builder_of(&original).build();
    assert_eq!(copy, original);
    assert_eq!(
        copy.iter().map(|(k, _)| k).collect::<Vec<_>>(),
        original.iter().map(|(k, _)| k).collect::<Vec<_>>()
    );
}

#[test]
fn fresh_builder_is_all_null_default_grain_is_not() {
    let factory = BasicGrainFactory::new(point_schema("FreshPoint"));
    let fresh = factory.new_builder().build();
    assert_eq!(fresh.get("x"), Some(&Value::Null));
    assert_eq!(fresh.get("visible"), Some(&Value::Null));

    let default = factory.default_grain();
    assert_eq!(default.get("x"), Some(&Value::Int(0)));
    assert_eq!(default.get("visible"), Some(&Value::Bool(false)));
    assert_eq!(default.get("label"), Some(&Value::Null));
    assert_eq!(default.size(), 4);
}

#[test]
fn grain_cursor_reads_without_lookahead_and_fails_past_end() {
    let factory = BasicGrainFactory::new(point_schema("CursorPoint"));
    let mut b = factory.new_builder();
    b.put("x", 1i64);
    let grain = b.build();

    let mut cursor = grain.cursor();
    assert_eq!(cursor.value(), Err(GrainError::CursorNotPositioned));

    let (k, v) = cursor.next_entry().unwrap();
    assert_eq!((k, v), ("x", &Value::Int(1)));
    assert_eq!(cursor.key(), Ok("x"));
    assert_eq!(cursor.value(), Ok(&Value::Int(1)));

    for _ in 1..grain.size() {
        cursor.next_entry().unwrap();
    }
    assert!(!cursor.has_next());
    assert_eq!(
        cursor.next_entry().unwrap_err(),
        GrainError::IteratorExhausted
    );
}

#[test]
fn builder_cursor_rewrites_and_removes_in_place() {
    let factory = BasicGrainFactory::new(point_schema("MutCursor"));
    let mut builder = factory.new_builder();
    builder
        .put("x", 1i64)
        .put("keep", "yes")
        .put("drop", "no")
        .put("tail", "end");

    let mut cursor = builder.cursor_mut();
    loop {
        match cursor.next_entry() {
            Ok(_) => {}
            Err(GrainError::IteratorExhausted) => break,
            Err(other) => panic!("unexpected cursor error: {other}"),
        }
        let key = cursor.key().unwrap().to_owned();
        match key.as_str() {
            "x" => cursor.set_value(10i64).unwrap(),
            "drop" => cursor.remove().unwrap(),
            _ => {}
        }
    }
    let grain = builder.build();
    assert_eq!(grain.get("x"), Some(&Value::Int(10)));
    assert_eq!(grain.get("drop"), None);
    assert_eq!(grain.get("tail"), Some(&Value::Str("end".into())));
    assert_eq!(grain.get("keep"), Some(&Value::Str("yes".into())));
}

#[test]
fn builder_cursor_remove_on_basis_nulls_the_slot() {
    let factory = BasicGrainFactory::new(point_schema("MutCursorBasis"));
    let mut builder = factory.new_builder();
    builder.put("x", 5i64);
    let mut cursor = builder.cursor_mut();
    cursor.next_entry().unwrap();
    cursor.remove().unwrap();
    // basis removal keeps the cursor positioned on the (now null) slot
    assert_eq!(cursor.key(), Ok("x"));
    assert_eq!(cursor.value(), Ok(&Value::Null));
    let grain = builder.build();
    assert_eq!(grain.size(), 4);
    assert_eq!(grain.get("x"), Some(&Value::Null));
}

#[test]
fn clear_resets_to_fresh_state() {
    let factory = BasicGrainFactory::new(point_schema("ClearPoint"));
    let mut builder = factory.builder_of(&sample_grain(&factory));
    builder.clear();
    let grain = builder.build();
    assert_eq!(grain.size(), 4);
    assert_eq!(grain.get("x"), Some(&Value::Null));
    assert_eq!(grain.get("note"), None);
}

#[test]
fn sparse_wire_entries_of_default_grain_are_empty() {
    let factory = BasicGrainFactory::new(point_schema("SparsePoint"));
    let default = factory.default_grain();
    assert_eq!(wire_entries(&default, EncodeStyle::Sparse).count(), 0);
    assert_eq!(wire_entries(&default, EncodeStyle::Dense).count(), 4);

    let grain = default.with("x", 9i64).with("note", "kept");
    let sparse: Vec<&str> = wire_entries(&grain, EncodeStyle::Sparse)
        .map(|(k, _)| k)
        .collect();
    assert_eq!(sparse, vec!["x", "note"]);
}

#[test]
fn registration_race_loser_observes_winner() {
    let schema = point_schema("RacePoint");
    let first: Arc<dyn GrainFactory> = Arc::new(BasicGrainFactory::new(Arc::clone(&schema)));
    let second: Arc<dyn GrainFactory> = Arc::new(BasicGrainFactory::new(schema));

    let winner = register_factory(Arc::clone(&first));
    let observed = register_factory(Arc::clone(&second));
    assert!(Arc::ptr_eq(&winner, &first));
    assert!(Arc::ptr_eq(&observed, &first));
    assert!(!Arc::ptr_eq(&observed, &second));
}

#[test]
fn concurrent_registration_converges_on_one_factory() {
    let schema = point_schema("ConcurrentPoint");
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let schema = Arc::clone(&schema);
            std::thread::spawn(move || {
                let f: Arc<dyn GrainFactory> = Arc::new(BasicGrainFactory::new(schema));
                register_factory(f)
            })
        })
        .collect();
    let factories: Vec<Arc<dyn GrainFactory>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    for f in &factories[1..] {
        assert!(Arc::ptr_eq(f, &factories[0]));
    }
}

#[test]
fn grains_move_across_threads() {
    let factory = BasicGrainFactory::new(point_schema("SendPoint"));
    let grain = sample_grain(&factory);
    let shared = grain.clone();
    let handle = std::thread::spawn(move || shared.get("x").cloned());
    assert_eq!(handle.join().unwrap(), Some(Value::Int(3)));
    assert_eq!(grain.get("x"), Some(&Value::Int(3)));
}
