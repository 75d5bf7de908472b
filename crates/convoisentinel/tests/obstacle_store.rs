//! Obstacle store behaviour against both storage backends.

use std::collections::HashSet;
use std::sync::Arc;

use convoisentinel::logging::init_test_logging;
use convoisentinel::storage::OBSTACLES_KEY;
use convoisentinel::{
    Error, KeyValueStore, MemoryStore, NewObstacle, ObstacleForm, ObstacleStore, SqliteStore,
};
use tempfile::TempDir;

fn sqlite_store() -> (TempDir, Arc<SqliteStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("store.db")).unwrap();
    (dir, Arc::new(store))
}

async fn check_adds_most_recent_first<S: KeyValueStore + ?Sized>(kv: Arc<S>) {
    let store = ObstacleStore::new(kv);
    let titles = ["Pont bas", "Rond-point", "Travaux", "Ligne EDF"];
    for title in titles {
        store.add(NewObstacle::new(title)).await.unwrap();
    }

    let list = store.get_all().await;
    let got: Vec<_> = list.iter().map(|o| o.title.as_str()).collect();
    assert_eq!(got, ["Ligne EDF", "Travaux", "Rond-point", "Pont bas"]);

    let ids: HashSet<_> = list.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids.len(), titles.len());
}

async fn check_add_round_trip<S: KeyValueStore + ?Sized>(kv: Arc<S>) {
    let store = ObstacleStore::new(kv);
    let added = store
        .add(
            NewObstacle::new("  Pont bas ")
                .description(" Hauteur 3,50 m ")
                .coordinates(48.8566, 2.3522)
                .photo_uri("file:///photos/pont.jpg"),
        )
        .await
        .unwrap();

    let list = store.get_all().await;
    assert_eq!(list.len(), 1);
    let stored = &list[0];
    assert_eq!(stored, &added);
    assert_eq!(stored.title, "Pont bas");
    assert_eq!(stored.description, "Hauteur 3,50 m");
    assert_eq!(stored.coordinates(), Some((48.8566, 2.3522)));
    assert_eq!(stored.photo_uri.as_deref(), Some("file:///photos/pont.jpg"));

    let (millis, suffix) = stored.id.split_once('-').unwrap();
    assert_eq!(millis.parse::<i64>().unwrap(), stored.created_at);
    assert_eq!(suffix.len(), 6);
    assert!(stored.created_at_utc().is_some());
}

async fn check_remove_and_clear<S: KeyValueStore + ?Sized>(kv: Arc<S>) {
    let store = ObstacleStore::new(kv);
    let a = store.add(NewObstacle::new("A")).await.unwrap();
    let b = store.add(NewObstacle::new("B")).await.unwrap();

    store.remove("does-not-exist").await.unwrap();
    assert_eq!(store.count().await, 2);

    store.remove(&a.id).await.unwrap();
    store.remove(&a.id).await.unwrap();
    let list = store.get_all().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, b.id);

    store.clear().await.unwrap();
    assert!(store.get_all().await.is_empty());
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_adds_most_recent_first_memory() {
    check_adds_most_recent_first(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_adds_most_recent_first_sqlite() {
    let (_dir, kv) = sqlite_store();
    check_adds_most_recent_first(kv).await;
}

#[tokio::test]
async fn test_add_round_trip_memory() {
    check_add_round_trip(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_add_round_trip_sqlite() {
    let (_dir, kv) = sqlite_store();
    check_add_round_trip(kv).await;
}

#[tokio::test]
async fn test_remove_and_clear_memory() {
    check_remove_and_clear(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_remove_and_clear_sqlite() {
    let (_dir, kv) = sqlite_store();
    check_remove_and_clear(kv).await;
}

#[tokio::test]
async fn test_list_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let first = {
        let store = ObstacleStore::new(Arc::new(SqliteStore::open(&path).unwrap()));
        store.add(NewObstacle::new("Pont bas")).await.unwrap()
    };

    let store = ObstacleStore::new(Arc::new(SqliteStore::open(&path).unwrap()));
    let found = store.get(&first.id).await;
    assert_eq!(found, Some(first));
}

#[tokio::test]
async fn test_blank_title_and_bad_coordinates_normalized() {
    let store = ObstacleStore::new(Arc::new(MemoryStore::new()));

    let blank = store.add(NewObstacle::new("   ")).await.unwrap();
    assert_eq!(blank.title, "Obstacle");

    let out_of_range = store
        .add(NewObstacle::new("Loin").coordinates(200.0, 2.0))
        .await
        .unwrap();
    assert_eq!(out_of_range.latitude, None);
    assert_eq!(out_of_range.longitude, Some(2.0));

    let nan = store
        .add(NewObstacle::new("NaN").coordinates(f64::NAN, f64::INFINITY))
        .await
        .unwrap();
    assert_eq!(nan.coordinates(), None);
    assert_eq!(nan.latitude, None);
}

#[tokio::test]
async fn test_form_rejects_out_of_range_before_add() {
    let store = ObstacleStore::new(Arc::new(MemoryStore::new()));

    let form = ObstacleForm {
        title: "Pont".to_string(),
        latitude: "91".to_string(),
        ..ObstacleForm::default()
    };
    let err = form.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidLatitude { .. }));

    let form = ObstacleForm {
        title: "Pont".to_string(),
        longitude: "-180,5".to_string(),
        ..ObstacleForm::default()
    };
    let err = form.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidLongitude { .. }));

    assert!(store.get_all().await.is_empty());
}

#[tokio::test]
async fn test_malformed_json_reads_as_empty() {
    init_test_logging();
    for raw in ["not json", "{\"id\":\"x\"}", "42", ""] {
        let kv = Arc::new(MemoryStore::with_entries([(OBSTACLES_KEY, raw)]));
        let store = ObstacleStore::new(kv);
        assert!(store.get_all().await.is_empty(), "value {raw:?}");
    }
}

#[tokio::test]
async fn test_write_failure_leaves_state_unchanged() {
    let kv = Arc::new(MemoryStore::new());
    let store = ObstacleStore::new(Arc::clone(&kv));
    let kept = store.add(NewObstacle::new("Avant")).await.unwrap();

    kv.set_fail_writes(true);
    let err = store.add(NewObstacle::new("Après")).await.unwrap_err();
    assert!(matches!(err, Error::WriteRejected { .. }));
    assert!(store.remove(&kept.id).await.is_err());

    kv.set_fail_writes(false);
    assert_eq!(store.get_all().await, vec![kept]);
}

#[tokio::test]
async fn test_concurrent_adds_keep_everything() {
    let (_dir, kv) = sqlite_store();
    let store = Arc::new(ObstacleStore::new(kv));

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.add(NewObstacle::new(format!("#{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.count().await, 16);
}
