use chrono::Datelike;
use record_kernel::framework::{
    CastMode, Config, Field, KernelError, Model, Record, RelationKind, Slot,
};
use record_kernel::model::{Shift, Team, User};
use serde_json::json;
use std::sync::Arc;

struct Locked;

impl Model for Locked {
    fn name(&self) -> &'static str {
        "Locked"
    }
}

fn config() -> Arc<Config> {
    Arc::new(Config::new())
}

#[test]
fn test_number_cast_on_write_and_read() {
    let mut shift = Record::new(&Shift, config());
    shift.set_attribute("hours", "42").unwrap();

    let hours = shift.get_attribute("hours").unwrap().unwrap();
    assert_eq!(hours, json!(42));
    assert!(hours.as_value().unwrap().is_number());
}

#[test]
fn test_guarded_fill_drops_and_force_fill_writes() {
    let mut locked = Record::new(&Locked, config());
    locked.fill(json!({ "name": "x" })).unwrap();
    assert!(locked.get_attribute("name").unwrap().is_none());

    locked.force_fill(json!({ "name": "x" })).unwrap();
    assert_eq!(locked.get_attribute("name").unwrap().unwrap(), json!("x"));
}

#[test]
fn test_user_guard_lists() {
    let mut user = Record::new(&User, config());
    user.fill(json!({ "id": 9, "role": "admin", "name": "Bo", "nickname": "b" })).unwrap();
    assert_eq!(user.get_attribute_keys(), ["name", "nickname"]);
    assert!(user.is_guarded("role"));
    assert!(!user.is_guarded("name"));
}

#[test]
fn test_belongs_to_endpoint() {
    let user = Record::hydrate(&User, config(), json!({ "id": 1, "teamId": 5 })).unwrap();
    let team = user.relation("$team").unwrap();
    assert_eq!(team.endpoint(), "teams/5");
    assert_eq!(team.get_name(), "Team");
    assert_eq!(team.relation_kind(), Some(RelationKind::BelongsTo));
}

#[test]
fn test_has_many_relation_from_raw_data() {
    let mut user = Record::hydrate(&User, config(), json!({ "id": 1 })).unwrap();
    user.add_relation("shifts", json!([{ "id": 1, "hours": "4" }, { "id": 2, "hours": 6 }]))
        .unwrap();

    let shifts = user.get_relation("shifts").unwrap();
    let shifts = shifts.as_many().unwrap();
    assert_eq!(shifts.len(), 2);
    for shift in shifts {
        assert_eq!(shift.get_name(), "Shift");
        assert!(shift.is_clean(None));
    }
    assert_eq!(shifts[0].get_attribute("hours").unwrap().unwrap(), json!(4));
    assert_eq!(user.slot("shifts"), Some(Slot::Relation));
}

#[test]
fn test_deleted_key_reported_until_sync() {
    let mut team = Record::hydrate(&Team, config(), json!({ "id": 5, "name": "Night", "size": 4 })).unwrap();
    team.delete_attribute("size");
    assert_eq!(team.get_deleted_attributes(None)["size"], json!(4));

    team.fill(json!({ "name": "Day" })).unwrap();
    assert_eq!(team.get_deleted_attributes(None)["size"], json!(4));

    team.sync_original();
    assert!(!team.get_raw_original().contains_key("size"));
    assert!(team.get_deleted_attributes(None).is_empty());
}

#[test]
fn test_boolean_cast_tokens() {
    let user = Record::new(&User, config());
    for (input, expected) in [("true", true), ("false", false), ("1", true), ("0", false)] {
        let field = user.cast_attribute("active", input, CastMode::Read).unwrap();
        assert_eq!(field, json!(expected));
    }
    assert!(matches!(
        user.cast_attribute("active", "random value", CastMode::Read),
        Err(KernelError::CastFailure { .. })
    ));
}

#[test]
fn test_accessor_and_mutator_on_sample_user() {
    let mut user = Record::new(&User, config());
    user.set("name", "Alice").unwrap();
    user.set("email", "  ALICE@Example.COM ").unwrap();

    assert_eq!(user.get_raw_attributes()["email"], json!("alice@example.com"));
    assert_eq!(
        user.get("displayName").unwrap().unwrap(),
        json!("Alice <alice@example.com>")
    );
    assert_eq!(user.slot("save"), Some(Slot::Method));
}

#[test]
fn test_datetime_and_collection_casts() {
    let mut user = Record::new(&User, config());
    user.set_attribute("joinedAt", "2024-03-01T10:00:00Z").unwrap();
    user.set_attribute("tags", json!(["night", "lead"])).unwrap();

    let joined = user.get_attribute("joinedAt").unwrap().unwrap();
    assert_eq!(joined.as_datetime().unwrap().year(), 2024);
    assert_eq!(user.get_raw_attributes()["joinedAt"], json!("2024-03-01T10:00:00Z"));

    let tags = user.get_attribute("tags").unwrap().unwrap();
    assert_eq!(tags.as_collection().unwrap().len(), 2);
    assert!(matches!(tags, Field::Collection(_)));
}

#[test]
fn test_hydrate_keeps_null_datetime() {
    let shift = Record::hydrate(&Shift, config(), json!({ "id": 1, "startsAt": null })).unwrap();
    assert_eq!(shift.get_raw_attributes()["startsAt"], json!(null));
    assert_eq!(shift.get_attribute("startsAt").unwrap().unwrap(), json!(null));
    assert!(shift.is_clean(None));
}

#[test]
fn test_boolean_cast_integral_floats() {
    let user = Record::new(&User, config());
    assert_eq!(user.cast_attribute("active", json!(1.0), CastMode::Read).unwrap(), json!(true));
    assert_eq!(user.cast_attribute("active", json!(0.0), CastMode::Read).unwrap(), json!(false));
}

#[test]
fn test_unusable_configuration_surfaces_at_use() {
    let mut settings = Config::new();
    settings.set(Config::DATETIME, "moment");
    let mut user = Record::new(&User, Arc::new(settings));

    user.set_attribute("name", "fine").unwrap();
    assert!(matches!(
        user.set_attribute("joinedAt", "2024-03-01"),
        Err(KernelError::Configuration(_))
    ));

    let mut settings = Config::new();
    settings.set(Config::CASING, "kebab");
    assert!(matches!(
        Record::hydrate(&Team, Arc::new(settings), json!({ "id": 1 })),
        Err(KernelError::Configuration(_))
    ));
}

#[test]
fn test_related_records_inherit_config() {
    let settings = Config::from_value(json!({ "attribute-casing": "snake" })).unwrap();
    let user = Record::hydrate(&User, Arc::new(settings), json!({ "id": 2, "teamId": 1 })).unwrap();

    let shifts = user.relation("shifts").unwrap();
    assert_eq!(shifts.query().wheres()[0].column, "user_id");
    assert!(Arc::ptr_eq(shifts.config(), user.config()));
}
