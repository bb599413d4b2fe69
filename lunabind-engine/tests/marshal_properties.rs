//! Property tests for host ↔ VM marshaling

use lunabind_engine::prelude::*;
use proptest::prelude::*;

/// Scalars that survive the trip; `Null` only appears at the top level
fn scalar() -> impl Strategy<Value = Variant> {
    prop_oneof![
        any::<bool>().prop_map(Variant::Boolean),
        any::<i64>().prop_map(Variant::Integer),
        (-1.0e9..1.0e9f64).prop_map(Variant::Real),
        "[a-z]{0,8}".prop_map(Variant::String),
    ]
}

/// Nested values without the shapes a table cannot keep: empty lists and
/// `Null` entries
fn nested() -> impl Strategy<Value = Variant> {
    scalar().prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..6).prop_map(Variant::List),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..6).prop_map(Variant::Map),
        ]
    })
}

/// What a value reads back as: every number comes back real
fn normalized(value: &Variant) -> Variant {
    match value {
        Variant::Integer(i) => Variant::Real(*i as f64),
        Variant::List(items) => Variant::List(items.iter().map(normalized).collect()),
        Variant::Map(map) => Variant::Map(
            map.iter()
                .map(|(key, item)| (key.clone(), normalized(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn round_trip(engine: &Engine, value: &Variant) -> Variant {
    let pushed = engine.push_value(value).unwrap();
    engine.pop_value(pushed)
}

/// `levels` maps nested under `child`, the innermost holding `leaf` under `v`
fn chain(levels: usize, leaf: Variant) -> Variant {
    let mut value: Variant = [("v", leaf)].into_iter().collect();
    for _ in 1..levels {
        value = [("child", value)].into_iter().collect();
    }
    value
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pop_of_push_is_identity(value in nested()) {
        let engine = Engine::new();
        prop_assert_eq!(round_trip(&engine, &value), normalized(&value));
        prop_assert_eq!(engine.error(), 0);
    }

    #[test]
    fn host_chains_within_budget_survive(levels in 1usize..=16, leaf in scalar()) {
        let engine = Engine::new();
        let value = chain(levels, leaf);
        prop_assert_eq!(round_trip(&engine, &value), normalized(&value));
    }

    #[test]
    fn host_chains_beyond_budget_are_cut(levels in 17usize..=24, leaf in scalar()) {
        let engine = Engine::new();
        let mut back = round_trip(&engine, &chain(levels, leaf));

        for _ in 1..16 {
            back = back.get("child").unwrap().clone();
        }
        prop_assert_eq!(back.get("child").unwrap(), &Variant::Invalid);
    }
}

#[test]
fn test_top_level_null_survives() {
    let engine = Engine::new();
    assert_eq!(round_trip(&engine, &Variant::Null), Variant::Null);
}

#[test]
fn test_empty_list_reads_back_as_empty_map() {
    let engine = Engine::new();
    assert_eq!(
        round_trip(&engine, &Variant::List(Vec::new())),
        Variant::Map(VariantMap::new())
    );
}

#[test]
fn test_null_in_list_leaves_a_hole() {
    let engine = Engine::new();
    let value = Variant::List(vec![Variant::from(1), Variant::Null, Variant::from(3)]);

    assert_eq!(
        round_trip(&engine, &value),
        Variant::List(vec![Variant::Real(1.0), Variant::Real(3.0)])
    );
}

#[test]
fn test_null_in_map_drops_the_key() {
    let engine = Engine::new();
    let value: Variant = [("a", Variant::Null), ("b", Variant::from(1))].into_iter().collect();

    let expected: Variant = [("b", Variant::Real(1.0))].into_iter().collect();
    assert_eq!(round_trip(&engine, &value), expected);
}

#[test]
fn test_sixteen_host_levels_round_trip() {
    let engine = Engine::new();
    let value = chain(16, Variant::from("leaf"));
    assert_eq!(round_trip(&engine, &value), value);
}

#[test]
fn test_seventeenth_host_level_is_invalid() {
    let engine = Engine::new();
    let mut back = round_trip(&engine, &chain(17, Variant::from("leaf")));

    for _ in 1..16 {
        back = back.get("child").unwrap().clone();
    }
    assert_eq!(back.get("child").unwrap(), &Variant::Invalid);
    assert_eq!(engine.error(), 0);
}
