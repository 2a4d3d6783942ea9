#![allow(clippy::float_cmp)]

use super::*;

fn note() -> Item {
    Item {
        id: Uuid::new_v4(),
        kind: ItemKind::Note,
        content: "hello".into(),
        position: Point::new(10.0, 20.0),
        size: Some(Size::new(300.0, 150.0)),
        time_label: Some("9:00".into()),
    }
}

// =============================================================
// ItemKind
// =============================================================

#[test]
fn kind_serde_is_lowercase() {
    assert_eq!(serde_json::to_string(&ItemKind::Note).unwrap(), "\"note\"");
    assert_eq!(serde_json::to_string(&ItemKind::Image).unwrap(), "\"image\"");
    let back: ItemKind = serde_json::from_str("\"image\"").unwrap();
    assert_eq!(back, ItemKind::Image);
}

#[test]
fn default_sizes_by_kind() {
    assert_eq!(ItemKind::Note.default_size(None), Size::new(300.0, 150.0));
    assert_eq!(ItemKind::Image.default_size(None), Size::new(400.0, 300.0));
}

#[test]
fn image_default_size_follows_aspect_ratio() {
    assert_eq!(ItemKind::Image.default_size(Some(2.0)), Size::new(400.0, 200.0));
    assert_eq!(ItemKind::Image.default_size(Some(0.0)), Size::new(400.0, 300.0));
}

#[test]
fn note_default_size_ignores_aspect_ratio() {
    assert_eq!(ItemKind::Note.default_size(Some(2.0)), Size::new(300.0, 150.0));
}

// =============================================================
// Item
// =============================================================

#[test]
fn effective_size_falls_back_to_kind_default() {
    let mut item = note();
    item.size = None;
    assert_eq!(item.effective_size(), Size::new(300.0, 150.0));
}

#[test]
fn effective_size_is_floored() {
    let mut item = note();
    item.size = Some(Size::new(20.0, 20.0));
    assert_eq!(item.effective_size(), Size::new(100.0, 50.0));
}

#[test]
fn apply_only_touches_present_fields() {
    let mut item = note();
    item.apply(&ItemPatch::position(Point::new(1.0, 2.0)));
    assert_eq!(item.position, Point::new(1.0, 2.0));
    assert_eq!(item.content, "hello");
    assert_eq!(item.time_label.as_deref(), Some("9:00"));
}

#[test]
fn apply_empty_time_label_clears_it() {
    let mut item = note();
    item.apply(&ItemPatch::time_label(""));
    assert!(item.time_label.is_none());
}

#[test]
fn item_deserializes_without_optional_fields() {
    let id = Uuid::new_v4();
    let json = format!(r#"{{"id":"{id}","kind":"note","content":"x","position":{{"x":1.0,"y":2.0}}}}"#);
    let item: Item = serde_json::from_str(&json).unwrap();
    assert_eq!(item.id, id);
    assert!(item.size.is_none());
    assert!(item.time_label.is_none());
}

// =============================================================
// ItemPatch
// =============================================================

#[test]
fn empty_patch_is_empty_and_not_urgent() {
    let patch = ItemPatch::default();
    assert!(patch.is_empty());
    assert!(!patch.is_urgent());
}

#[test]
fn urgency_follows_text_fields() {
    assert!(ItemPatch::content("x").is_urgent());
    assert!(ItemPatch::time_label("10:00").is_urgent());
    assert!(!ItemPatch::position(Point::new(0.0, 0.0)).is_urgent());
    assert!(!ItemPatch::geometry(Point::new(0.0, 0.0), Size::new(100.0, 50.0)).is_urgent());
}

#[test]
fn merge_is_last_write_wins_per_field() {
    let mut patch = ItemPatch::position(Point::new(1.0, 1.0));
    patch.merge(ItemPatch::content("a"));
    patch.merge(ItemPatch::position(Point::new(2.0, 2.0)));
    assert_eq!(patch.position, Some(Point::new(2.0, 2.0)));
    assert_eq!(patch.content.as_deref(), Some("a"));
    assert!(patch.size.is_none());
}

#[test]
fn merge_keeps_earlier_fields_absent_from_later() {
    let mut patch = ItemPatch::geometry(Point::new(1.0, 1.0), Size::new(200.0, 100.0));
    patch.merge(ItemPatch::position(Point::new(5.0, 5.0)));
    assert_eq!(patch.size, Some(Size::new(200.0, 100.0)));
}

#[test]
fn patch_serializes_only_present_fields() {
    let json = serde_json::to_value(ItemPatch::content("hi")).unwrap();
    assert_eq!(json, serde_json::json!({ "content": "hi" }));
}

#[test]
fn validate_rejects_below_floor_size() {
    let patch = ItemPatch::geometry(Point::new(0.0, 0.0), Size::new(99.0, 50.0));
    assert!(matches!(patch.validate(), Err(ValidationError::BelowMinimumSize { .. })));
}

#[test]
fn validate_rejects_non_finite_position() {
    let patch = ItemPatch::position(Point::new(f64::NAN, 0.0));
    assert_eq!(patch.validate(), Err(ValidationError::NonFinite("position")));
}

#[test]
fn sanitized_clamps_size_and_drops_bad_position() {
    let patch = ItemPatch::geometry(Point::new(f64::INFINITY, 0.0), Size::new(10.0, 10.0)).sanitized();
    assert!(patch.position.is_none());
    assert_eq!(patch.size, Some(Size::new(100.0, 50.0)));
    assert!(patch.validate().is_ok());
}

// =============================================================
// NewItem
// =============================================================

#[test]
fn new_image_requires_url() {
    let request = NewItem::image("   ", Point::new(0.0, 0.0));
    assert_eq!(request.validate(), Err(ValidationError::MissingField("content")));
}

#[test]
fn new_note_may_be_empty() {
    assert!(NewItem::note("", Point::new(0.0, 0.0)).validate().is_ok());
}

#[test]
fn resolved_size_prefers_explicit_size_floored() {
    let mut request = NewItem::note("x", Point::new(0.0, 0.0));
    request.size = Some(Size::new(50.0, 500.0));
    assert_eq!(request.resolved_size(None), Size::new(100.0, 500.0));
}

#[test]
fn into_item_assigns_id_and_default_size() {
    let id = Uuid::new_v4();
    let item = NewItem::note("x", Point::new(100.0, 100.0)).into_item(id);
    assert_eq!(item.id, id);
    assert_eq!(item.size, Some(Size::new(300.0, 150.0)));
    assert_eq!(item.position, Point::new(100.0, 100.0));
}
