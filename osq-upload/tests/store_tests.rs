//! Tests for the local stores

mod helpers;

use chrono::Utc;
use helpers::{create_memory_db, make_note};
use osq_common::{ElementKey, ElementType, LatLon};
use osq_upload::db::{note_queue, note_quests, notes, statistics, way_traffic_flow};
use osq_upload::models::{NewPendingNote, NoteQuest, NoteStatus, QuestStatus};

#[tokio::test]
async fn test_note_queue_round_trip() {
    let pool = create_memory_db().await;
    let element = ElementKey::new(ElementType::Relation, 9);
    let new_note = NewPendingNote::for_element(
        "wrong name",
        LatLon::new(52.5, 13.4),
        element,
        Some("What is the name?".to_string()),
    )
    .with_images(vec!["/tmp/a.jpg".to_string()]);

    let id = note_queue::add(&pool, &new_note).await.unwrap();
    let stored = note_queue::get(&pool, id).await.unwrap().unwrap();

    assert_eq!(stored.id, id);
    assert_eq!(stored.text, "wrong name");
    assert_eq!(stored.position, LatLon::new(52.5, 13.4));
    assert_eq!(stored.element, Some(element));
    assert_eq!(stored.quest_title.as_deref(), Some("What is the name?"));
    assert_eq!(stored.image_paths, vec!["/tmp/a.jpg".to_string()]);
}

#[tokio::test]
async fn test_note_queue_order_and_delete() {
    let pool = create_memory_db().await;
    let first = note_queue::add(&pool, &NewPendingNote::new("a", LatLon::new(0.0, 0.0)))
        .await
        .unwrap();
    let second = note_queue::add(&pool, &NewPendingNote::new("b", LatLon::new(0.0, 0.0)))
        .await
        .unwrap();

    let all = note_queue::get_all(&pool).await.unwrap();
    assert_eq!(all.iter().map(|n| n.id).collect::<Vec<_>>(), vec![first, second]);
    assert!(all[0].element.is_none());

    assert!(note_queue::delete(&pool, first).await.unwrap());
    assert!(!note_queue::delete(&pool, first).await.unwrap());
    assert_eq!(note_queue::count(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_partial_element_reference_is_rejected() {
    let pool = create_memory_db().await;

    let result = sqlx::query(
        "INSERT INTO pending_notes (text, latitude, longitude, element_type, created_at)
         VALUES ('x', 0, 0, 'way', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_note_put_is_upsert() {
    let pool = create_memory_db().await;
    let mut note = make_note(2, NoteStatus::Open, "bla bla");

    notes::put(&pool, &note).await.unwrap();
    note.status = NoteStatus::Closed;
    note.closed_at = Some(Utc::now());
    notes::put(&pool, &note).await.unwrap();

    let stored = notes::get(&pool, 2).await.unwrap().unwrap();
    assert_eq!(stored.status, NoteStatus::Closed);
    assert!(stored.closed_at.is_some());
    assert_eq!(stored.opening_text(), Some("bla bla"));
    assert_eq!(notes::count(&pool).await.unwrap(), 1);

    assert!(notes::delete(&pool, 2).await.unwrap());
    assert!(notes::get(&pool, 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_note_quest_replaces_quest_of_same_note() {
    let pool = create_memory_db().await;
    notes::put(&pool, &make_note(2, NoteStatus::Open, "bla")).await.unwrap();

    let mut quest = NoteQuest::contributed(2);
    quest.status = QuestStatus::New;
    let first = note_quests::add(&pool, &quest).await.unwrap();
    let second = note_quests::add(&pool, &NoteQuest::contributed(2)).await.unwrap();
    assert_eq!(first, second);

    let stored = note_quests::get_by_note_id(&pool, 2).await.unwrap().unwrap();
    assert_eq!(stored.id, Some(first));
    assert_eq!(stored.status, QuestStatus::Closed);
    assert!(note_quests::get_by_note_id(&pool, 3).await.unwrap().is_none());
}

#[tokio::test]
async fn test_quest_of_deleted_note_is_removed() {
    let pool = create_memory_db().await;
    notes::put(&pool, &make_note(2, NoteStatus::Open, "bla")).await.unwrap();
    note_quests::add(&pool, &NoteQuest::contributed(2)).await.unwrap();

    notes::delete(&pool, 2).await.unwrap();

    assert!(note_quests::get_by_note_id(&pool, 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_statistics() {
    let pool = create_memory_db().await;
    assert_eq!(statistics::get_note_amount(&pool).await.unwrap(), 0);

    statistics::add_one_note(&pool).await.unwrap();
    statistics::add_one_note(&pool).await.unwrap();
    statistics::add_one(&pool, "AddRoadName").await.unwrap();

    assert_eq!(statistics::get_note_amount(&pool).await.unwrap(), 2);
    assert_eq!(statistics::get_amount(&pool, "AddRoadName").await.unwrap(), 1);
    assert_eq!(statistics::get_amount(&pool, "AddOneway").await.unwrap(), 0);
    assert_eq!(statistics::total(&pool).await.unwrap(), 3);
}

#[tokio::test]
async fn test_way_traffic_flow() {
    let pool = create_memory_db().await;
    assert_eq!(way_traffic_flow::is_forward(&pool, 7).await.unwrap(), None);

    way_traffic_flow::put(&pool, 7, true).await.unwrap();
    assert_eq!(way_traffic_flow::is_forward(&pool, 7).await.unwrap(), Some(true));

    way_traffic_flow::put(&pool, 7, false).await.unwrap();
    assert_eq!(way_traffic_flow::is_forward(&pool, 7).await.unwrap(), Some(false));

    assert!(way_traffic_flow::delete(&pool, 7).await.unwrap());
    assert_eq!(way_traffic_flow::is_forward(&pool, 7).await.unwrap(), None);
}
