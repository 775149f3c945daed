use boardsync_model::kinds::{CHARACTER_TOKEN, DECORATION_TOKEN_DATA, GRID, SCENE, TURN_ORDER};
use boardsync_model::{
    Asset, BoardEntity, CharacterData, DecorationData, GameAssets, Grid, Layer, ModelError,
    Position, Replicated, Scene, Token, TokenData, TokenVariant, TurnOrder, should_apply_change,
    write_timestamp,
};
use boardsync_types::{Record, Timestamp, Uid};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

fn grid_record(uid: &str, ts: i64, cell_size: f64) -> Record {
    record(json!({
        "kind": GRID,
        "uid": uid,
        "timestamp": ts,
        "cellSize": cell_size,
        "size": {"width": 1000.0, "height": 800.0},
        "hover": false,
        "position": {"x": 10.0, "y": 20.0},
        "opacity": 0.5,
    }))
}

// ── Last-write-wins rule ─────────────────────────────────────────

#[test]
fn never_applied_accepts_any_timestamp() {
    let r = grid_record("g", 0, 100.0);
    assert!(should_apply_change(None, &r));
}

#[test]
fn equal_timestamp_is_rejected() {
    let r = grid_record("g", 100, 100.0);
    assert!(!should_apply_change(Some(Timestamp::from_millis(100)), &r));
}

#[test]
fn older_timestamp_is_rejected_newer_accepted() {
    let last = Some(Timestamp::from_millis(100));
    assert!(!should_apply_change(last, &grid_record("g", 99, 1.0)));
    assert!(should_apply_change(last, &grid_record("g", 101, 1.0)));
}

#[test]
fn apply_sets_last_applied() {
    let mut grid = Grid::new(Uid::from("g"));
    assert_eq!(grid.last_applied(), None);
    grid.apply_remote_change(&grid_record("g", 42, 150.0)).unwrap();
    assert_eq!(grid.last_applied(), Some(Timestamp::from_millis(42)));
    assert_eq!(grid.cell_size, 150.0);
}

#[test]
fn local_write_rejects_older_remote_changes() {
    let mut grid = Grid::new(Uid::from("g"));
    grid.mark_written(Timestamp::from_millis(200));
    assert!(!grid.should_apply_change(&grid_record("g", 150, 1.0)));
    assert!(grid.should_apply_change(&grid_record("g", 201, 1.0)));

    // An older write never lowers the mark.
    grid.mark_written(Timestamp::from_millis(50));
    assert_eq!(grid.last_applied(), Some(Timestamp::from_millis(200)));
}

#[test]
fn write_timestamp_is_strictly_newer_than_last_applied() {
    let now = Timestamp::from_millis(1_000);
    assert_eq!(write_timestamp(None, now), now);
    assert_eq!(write_timestamp(Some(Timestamp::from_millis(10)), now), now);
    assert_eq!(
        write_timestamp(Some(Timestamp::from_millis(1_000)), now),
        Timestamp::from_millis(1_001)
    );
    assert_eq!(
        write_timestamp(Some(Timestamp::from_millis(5_000)), now),
        Timestamp::from_millis(5_001)
    );
}

#[test]
fn board_entity_forwards_mark_written() {
    let mut entity = BoardEntity::from(Scene::new(Uid::from("s"), "Hall", Uid::from("g")));
    entity.mark_written(Timestamp::from_millis(7));
    assert_eq!(entity.last_applied(), Some(Timestamp::from_millis(7)));
}

proptest! {
    #[test]
    fn lww_gate_is_monotonic(t in 1i64..1_000_000, delta in 1i64..1000) {
        let mut grid = Grid::new(Uid::from("g"));
        grid.apply_remote_change(&grid_record("g", t, 100.0)).unwrap();

        let older = grid_record("g", t - delta, 300.0);
        prop_assert!(!grid.should_apply_change(&older));
        prop_assert_eq!(grid.last_applied(), Some(Timestamp::from_millis(t)));
        prop_assert_eq!(grid.cell_size, 100.0);

        let newer = grid_record("g", t + delta, 300.0);
        prop_assert!(grid.should_apply_change(&newer));
        grid.apply_remote_change(&newer).unwrap();
        prop_assert_eq!(grid.last_applied(), Some(Timestamp::from_millis(t + delta)));
        prop_assert_eq!(grid.cell_size, 300.0);
    }
}

// ── Grid ─────────────────────────────────────────────────────────

#[test]
fn grid_defaults() {
    let grid = Grid::new(Uid::from("g"));
    assert_eq!(grid.cell_size, 200.0);
    assert_eq!(grid.size.width, 6000.0);
    assert_eq!(grid.size.height, 6000.0);
    assert!(grid.hover);
    assert_eq!(grid.opacity, 1.0);
    assert_eq!(grid.cells(), (30, 30));
}

#[test]
fn grid_record_uses_camel_case_and_envelope() {
    let grid = Grid::new(Uid::from("g1"));
    let r = grid.to_record_at(Timestamp::from_millis(7)).unwrap();
    let value = serde_json::to_value(&r).unwrap();
    assert_eq!(value["kind"], "Grid");
    assert_eq!(value["uid"], "g1");
    assert_eq!(value["timestamp"], 7);
    assert_eq!(value["cellSize"], 200.0);
    assert!(value.get("lastApplied").is_none());
}

#[test]
fn grid_from_record_reads_all_fields() {
    let grid = Grid::from_record(&grid_record("g", 5, 50.0)).unwrap();
    assert_eq!(grid.uid(), &Uid::from("g"));
    assert_eq!(grid.cell_size, 50.0);
    assert_eq!(grid.position, Position::new(10.0, 20.0));
    assert!(!grid.hover);
    assert_eq!(grid.opacity, 0.5);
}

#[test]
fn grid_snap_aligns_to_cells() {
    let mut grid = Grid::new(Uid::from("g"));
    grid.cell_size = 100.0;
    assert_eq!(grid.snap(Position::new(250.0, 99.0)), Position::new(200.0, 0.0));
}

#[test]
fn apply_rejects_other_kind() {
    let mut grid = Grid::new(Uid::from("g"));
    let r = record(json!({"kind": SCENE, "uid": "g", "timestamp": 1}));
    let err = grid.apply_remote_change(&r).unwrap_err();
    assert!(matches!(err, ModelError::KindMismatch { .. }));
    assert_eq!(grid.last_applied(), None);
}

// ── Scene ────────────────────────────────────────────────────────

#[test]
fn scene_serializes_name_and_grid_only() {
    let mut scene = Scene::new(Uid::from("s"), "Cave", Uid::from("g"));
    scene.attach_token(Uid::from("t1"));
    let attrs = scene.attributes().unwrap();
    assert_eq!(serde_json::Value::Object(attrs), json!({"name": "Cave", "gridUid": "g"}));
}

#[test]
fn scene_apply_keeps_grid_reference() {
    let mut scene = Scene::new(Uid::from("s"), "Cave", Uid::from("g"));
    let r = record(json!({"kind": SCENE, "uid": "s", "timestamp": 3, "name": "Tomb", "gridUid": "other"}));
    scene.apply_remote_change(&r).unwrap();
    assert_eq!(scene.name, "Tomb");
    assert_eq!(scene.grid_uid(), &Uid::from("g"));
}

#[test]
fn scene_token_list_has_no_duplicates() {
    let mut scene = Scene::new(Uid::from("s"), "", Uid::from("g"));
    assert!(scene.attach_token(Uid::from("t")));
    assert!(!scene.attach_token(Uid::from("t")));
    assert_eq!(scene.tokens().len(), 1);
    assert!(scene.detach_token(&Uid::from("t")));
    assert!(!scene.detach_token(&Uid::from("t")));
}

#[test]
fn scene_turn_order_replacement_returns_previous() {
    let mut scene = Scene::new(Uid::from("s"), "", Uid::from("g"));
    assert_eq!(scene.set_turn_order(Some(Uid::from("a"))), None);
    assert_eq!(scene.set_turn_order(Some(Uid::from("b"))), Some(Uid::from("a")));
    assert_eq!(scene.turn_order(), Some(&Uid::from("b")));
}

// ── Token ────────────────────────────────────────────────────────

#[test]
fn token_round_trip_keeps_references() {
    let mut token = Token::new(
        TokenVariant::Character,
        Uid::from("t"),
        Uid::from("s"),
        Uid::from("d"),
    );
    token.position = Position::new(400.0, 600.0);
    token.layer = Layer::GridBackground;

    let r = token.to_record_at(Timestamp::from_millis(10)).unwrap();
    assert_eq!(r.kind, CHARACTER_TOKEN);
    assert_eq!(r.get_str("sceneUid"), Some("s"));
    assert_eq!(r.get_str("tokenDataUid"), Some("d"));
    assert_eq!(r.get_str("layer"), Some("gridBackground"));

    let rebuilt = Token::from_record(&r, Uid::from("s"), Uid::from("d")).unwrap();
    assert_eq!(rebuilt.position, token.position);
    assert_eq!(rebuilt.layer, Layer::GridBackground);
    assert_eq!(rebuilt.variant(), TokenVariant::Character);
}

#[test]
fn token_variant_accepts_matching_data() {
    assert!(TokenVariant::Character.accepts_data(&"CharacterTokenData".into()));
    assert!(!TokenVariant::Character.accepts_data(&"EmptyTokenData".into()));
    assert!(TokenVariant::Decoration.accepts_data(&"EmptyTokenData".into()));
    assert!(TokenVariant::Decoration.accepts_data(&"DecorationTokenData".into()));
}

#[test]
fn ghost_is_local_only() {
    let token = Token::new(
        TokenVariant::Decoration,
        Uid::from("t"),
        Uid::from("s"),
        Uid::from("d"),
    );
    let ghost = token.ghost(Uid::from("ghost"));
    assert!(ghost.is_local_only());
    assert!(!token.is_local_only());
    assert_eq!(ghost.scene_uid(), token.scene_uid());
}

// ── TokenData ────────────────────────────────────────────────────

#[test]
fn character_data_round_trip() {
    let mut data = CharacterData {
        name: "Goblin".into(),
        image: Some("https://img/goblin.png".into()),
        ..CharacterData::default()
    };
    data.sheet.hit_points.max = 7;
    data.sheet.hit_points.current = 7;
    let token_data = TokenData::character(Uid::from("d"), data.clone());

    let r = token_data.to_record_at(Timestamp::from_millis(1)).unwrap();
    let rebuilt = TokenData::from_record(&r).unwrap();
    assert_eq!(rebuilt.as_character(), Some(&data));
    assert_eq!(rebuilt.asset_urls(), vec!["https://img/goblin.png".to_string()]);
}

#[test]
fn decoration_asset_sets_image() {
    let r = record(json!({
        "kind": DECORATION_TOKEN_DATA,
        "uid": "d",
        "timestamp": 1,
        "name": "Tree",
        "asset": {"name": "tree", "url": "https://img/tree.png"},
    }));
    let data = TokenData::from_record(&r).unwrap();
    assert_eq!(data.image(), Some("https://img/tree.png"));
    assert_eq!(
        data.as_decoration().and_then(|d| d.asset.clone()),
        Some(Asset::new("tree", "https://img/tree.png"))
    );
}

#[test]
fn empty_token_data_has_no_attributes() {
    let data = TokenData::empty(Uid::from("d"));
    assert!(data.attributes().unwrap().is_empty());
    assert!(data.asset_urls().is_empty());
    assert_eq!(data.kind(), "EmptyTokenData");
}

#[test]
fn token_data_rejects_unknown_kind() {
    let r = record(json!({"kind": "Spaceship", "uid": "d", "timestamp": 1}));
    assert!(matches!(
        TokenData::from_record(&r),
        Err(ModelError::UnsupportedKind(_))
    ));
}

#[test]
fn hit_points_damage_drains_temporary_first() {
    let mut hp = boardsync_model::HitPoints::new(10);
    hp.temporary = 3;
    hp.damage(5);
    assert_eq!((hp.current, hp.temporary), (8, 0));
    hp.heal(100);
    assert_eq!(hp.current, 10);
}

#[test]
fn hit_points_saturate_on_extreme_values() {
    let mut hp = boardsync_model::HitPoints::new(i32::MAX);
    hp.current = i32::MIN + 1;
    hp.damage(i32::MAX);
    assert_eq!(hp.current, 0);

    hp.current = i32::MAX - 1;
    hp.heal(i32::MAX);
    assert_eq!(hp.current, i32::MAX);

    hp.temporary = -5;
    hp.damage(-10);
    assert_eq!((hp.current, hp.temporary), (i32::MAX, -5));
}

#[test]
fn decoration_from_asset_names_after_asset() {
    let data = DecorationData::from_asset(Asset::new("rock", "u"));
    assert_eq!(data.name, "rock");
    assert_eq!(data.image.as_deref(), Some("u"));
}

// ── GameAssets ───────────────────────────────────────────────────

#[test]
fn game_assets_replace_by_url() {
    let mut assets = GameAssets::new(Uid::from("a"));
    assets.add_asset(Asset::new("one", "u1"));
    assets.add_asset(Asset::new("renamed", "u1"));
    assets.add_asset(Asset::new("two", "u2"));
    assert_eq!(assets.assets().len(), 2);
    assert_eq!(assets.find("u1").map(|a| a.name.as_str()), Some("renamed"));
    assert_eq!(assets.remove_asset("u2"), Some(Asset::new("two", "u2")));
    assert_eq!(assets.remove_asset("u2"), None);
}

// ── TurnOrder ────────────────────────────────────────────────────

#[test]
fn turn_order_preserves_sequence_through_record() {
    let mut order = TurnOrder::new(Uid::from("o"), Uid::from("s"));
    for uid in ["c", "a", "b"] {
        assert!(order.add_participant(Uid::from(uid)));
    }
    assert!(!order.add_participant(Uid::from("a")));

    let r = order.to_record_at(Timestamp::from_millis(2)).unwrap();
    assert_eq!(r.kind, TURN_ORDER);
    let participants = TurnOrder::participants_of(&r).unwrap();
    assert_eq!(participants, vec![Uid::from("c"), Uid::from("a"), Uid::from("b")]);
}

#[test]
fn turn_order_remove_keeps_order() {
    let mut order = TurnOrder::new(Uid::from("o"), Uid::from("s"));
    for uid in ["a", "b", "c"] {
        order.add_participant(Uid::from(uid));
    }
    assert!(order.remove_participant(&Uid::from("b")));
    assert_eq!(order.participants(), &[Uid::from("a"), Uid::from("c")]);
}

// ── BoardEntity delegation ───────────────────────────────────────

#[test]
fn board_entity_delegates_to_variant() {
    let entity = BoardEntity::from(Scene::new(Uid::from("s"), "Hall", Uid::from("g")));
    assert_eq!(entity.kind(), "Scene");
    assert_eq!(entity.uid(), &Uid::from("s"));
    assert!(entity.as_scene().is_some());
    assert!(entity.as_grid().is_none());
}

#[derive(Debug)]
struct Marker {
    uid: Uid,
    label: String,
    last: Option<Timestamp>,
}

impl Replicated for Marker {
    fn kind(&self) -> boardsync_types::EntityKind {
        "Marker".into()
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }

    fn attributes(&self) -> boardsync_model::ModelResult<boardsync_types::AttributeMap> {
        boardsync_model::to_attribute_map(&json!({"label": self.label}))
    }

    fn apply_remote_change(&mut self, record: &Record) -> boardsync_model::ModelResult<()> {
        self.label = record.get_str("label").unwrap_or_default().to_string();
        self.last = Some(record.timestamp);
        Ok(())
    }

    fn last_applied(&self) -> Option<Timestamp> {
        self.last
    }

    fn mark_written(&mut self, timestamp: Timestamp) {
        self.last = self.last.max(Some(timestamp));
    }
}

#[test]
fn extension_entities_use_default_lww() {
    let marker: Box<dyn Replicated> = Box::new(Marker {
        uid: Uid::from("m"),
        label: "x".into(),
        last: Some(Timestamp::from_millis(10)),
    });
    let mut entity = BoardEntity::from(marker);
    let stale = record(json!({"kind": "Marker", "uid": "m", "timestamp": 9, "label": "y"}));
    assert!(!entity.should_apply_change(&stale));
    let fresh = record(json!({"kind": "Marker", "uid": "m", "timestamp": 11, "label": "y"}));
    assert!(entity.should_apply_change(&fresh));
    entity.apply_remote_change(&fresh).unwrap();
    assert_eq!(entity.attributes().unwrap()["label"], "y");
}
