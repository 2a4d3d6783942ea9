#![allow(clippy::float_cmp)]

use super::*;
use crate::geometry::{Point, Size};

#[tokio::test]
async fn create_assigns_id_and_lists_by_board() {
    let store = MemoryStore::new();
    let board = Uuid::new_v4();
    let other = Uuid::new_v4();

    let a = store.create_item(board, NewItem::note("a", Point::new(0.0, 0.0))).await.unwrap();
    store.create_item(other, NewItem::note("b", Point::new(0.0, 0.0))).await.unwrap();

    let listed = store.list_items(board).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, a.id);
    assert_eq!(listed[0].size, Some(Size::new(300.0, 150.0)));
}

#[tokio::test]
async fn list_keeps_creation_order() {
    let store = MemoryStore::new();
    let board = Uuid::new_v4();
    let first = store.create_item(board, NewItem::note("1", Point::new(0.0, 0.0))).await.unwrap();
    let second = store.create_item(board, NewItem::note("2", Point::new(0.0, 0.0))).await.unwrap();

    let ids: Vec<_> = store.list_items(board).await.unwrap().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn update_applies_patch() {
    let store = MemoryStore::new();
    let board = Uuid::new_v4();
    let item = store.create_item(board, NewItem::note("a", Point::new(0.0, 0.0))).await.unwrap();

    let updated = store.update_item(item.id, &ItemPatch::content("b")).await.unwrap();
    assert_eq!(updated.content, "b");
    assert_eq!(store.get(item.id).await.unwrap().content, "b");
}

#[tokio::test]
async fn update_unknown_is_not_found() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    let err = store.update_item(id, &ItemPatch::content("x")).await.unwrap_err();
    assert_eq!(err, PersistenceError::NotFound(id));
}

#[tokio::test]
async fn delete_removes_and_second_delete_fails() {
    let store = MemoryStore::new();
    let board = Uuid::new_v4();
    let item = store.create_item(board, NewItem::note("a", Point::new(0.0, 0.0))).await.unwrap();

    store.delete_item(item.id).await.unwrap();
    assert!(store.get(item.id).await.is_none());
    assert!(matches!(store.delete_item(item.id).await, Err(PersistenceError::NotFound(_))));
}

#[tokio::test]
async fn seed_keeps_ids() {
    let store = MemoryStore::new();
    let board = Uuid::new_v4();
    let item = NewItem::note("seeded", Point::new(5.0, 5.0)).into_item(Uuid::new_v4());
    store.seed(board, vec![item.clone()]).await;
    assert_eq!(store.list_items(board).await.unwrap(), vec![item]);
}
