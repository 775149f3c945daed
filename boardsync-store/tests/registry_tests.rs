use boardsync_model::kinds::BUILTIN_KINDS;
use boardsync_store::{Conversion, EntityStore, KindRegistry, StoreResult};
use boardsync_types::{EntityKind, Record};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn noop(_: &mut EntityStore, record: &Record) -> StoreResult<Conversion> {
    Ok(Conversion::Stale(record.uid.clone()))
}

fn names(registry: &KindRegistry) -> Vec<String> {
    registry
        .kinds_in_order()
        .into_iter()
        .map(|k| k.as_str().to_string())
        .collect()
}

// ── Priority assignment ──────────────────────────────────────────

#[test]
fn builtin_kinds_in_dependency_order() {
    let registry = KindRegistry::with_builtin_kinds();
    assert_eq!(names(&registry), BUILTIN_KINDS.to_vec());
    assert_eq!(registry.priority(&"Grid".into()), Some(0));
    assert_eq!(registry.priority(&"Scene".into()), Some(1));
    assert_eq!(registry.priority(&"TurnOrder".into()), Some(7));
}

#[test]
fn token_data_precedes_tokens() {
    let registry = KindRegistry::with_builtin_kinds();
    let data = registry.sort_key(&"CharacterTokenData".into());
    let token = registry.sort_key(&"CharacterToken".into());
    assert!(data < token);
}

#[test]
fn auto_priority_follows_registration_order() {
    let mut registry = KindRegistry::new();
    assert_eq!(registry.register("A", noop), 0);
    assert_eq!(registry.register("B", noop), 1);
    assert_eq!(registry.register("C", noop), 2);
}

#[test]
fn explicit_priority_shifts_entries_up() {
    let mut registry = KindRegistry::new();
    registry.register("A", noop);
    registry.register("B", noop);
    registry.register("C", noop);

    assert_eq!(registry.register_with_priority("X", 1, noop), 1);
    assert_eq!(names(&registry), vec!["A", "X", "B", "C"]);
    assert_eq!(registry.priority(&"C".into()), Some(3));
}

#[test]
fn explicit_priority_past_end_is_clamped() {
    let mut registry = KindRegistry::new();
    registry.register("A", noop);
    assert_eq!(registry.register_with_priority("B", 99, noop), 1);
}

#[test]
fn reregistering_moves_kind_without_gaps() {
    let mut registry = KindRegistry::new();
    registry.register("A", noop);
    registry.register("B", noop);
    registry.register("C", noop);
    registry.register_with_priority("C", 0, noop);
    assert_eq!(names(&registry), vec!["C", "A", "B"]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn unregister_closes_gap() {
    let mut registry = KindRegistry::new();
    registry.register("A", noop);
    registry.register("B", noop);
    registry.register("C", noop);
    assert!(registry.unregister(&"A".into()));
    assert!(!registry.unregister(&"A".into()));
    assert_eq!(registry.priority(&"B".into()), Some(0));
    assert_eq!(registry.priority(&"C".into()), Some(1));
}

#[test]
fn unknown_kind_sorts_last() {
    let registry = KindRegistry::with_builtin_kinds();
    assert_eq!(registry.sort_key(&"Spaceship".into()), usize::MAX);
    assert!(registry.converter(&"Spaceship".into()).is_none());
}

#[test]
fn sort_records_is_stable_within_kind() {
    let registry = KindRegistry::with_builtin_kinds();
    let mut records = vec![
        Record::tombstone("Scene", "s1".into()),
        Record::tombstone("Mystery", "m".into()),
        Record::tombstone("Grid", "g".into()),
        Record::tombstone("Scene", "s2".into()),
    ];
    registry.sort_records(&mut records);
    let uids: Vec<&str> = records.iter().map(|r| r.uid.as_str()).collect();
    assert_eq!(uids, vec!["g", "s1", "s2", "m"]);
}

// ── Dense ordering invariant ─────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Append(u8),
    Insert(u8, usize),
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12).prop_map(Op::Append),
        (0u8..12, 0usize..16).prop_map(|(k, p)| Op::Insert(k, p)),
        (0u8..12).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn priorities_stay_dense(ops in proptest::collection::vec(op(), 0..40)) {
        let mut registry = KindRegistry::new();
        let kind = |k: u8| EntityKind::new(format!("K{k}"));
        for op in ops {
            match op {
                Op::Append(k) => { registry.register(kind(k), noop); }
                Op::Insert(k, p) => { registry.register_with_priority(kind(k), p, noop); }
                Op::Remove(k) => { registry.unregister(&kind(k)); }
            }
        }
        let mut priorities: Vec<usize> = registry
            .kinds_in_order()
            .iter()
            .filter_map(|k| registry.priority(k))
            .collect();
        priorities.sort_unstable();
        let expected: Vec<usize> = (0..registry.len()).collect();
        prop_assert_eq!(priorities, expected);
    }

    #[test]
    fn explicit_insert_lands_where_asked(existing in 0usize..10, at in 0usize..10) {
        let mut registry = KindRegistry::new();
        for i in 0..existing {
            registry.register(EntityKind::new(format!("K{i}")), noop);
        }
        let got = registry.register_with_priority("New", at, noop);
        prop_assert_eq!(got, at.min(existing));
        prop_assert_eq!(registry.priority(&"New".into()), Some(at.min(existing)));
    }
}
