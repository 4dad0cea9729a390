use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use super::*;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn create_test_store() -> (FileGroupStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileGroupStore::new(dir.path().join("groups"));
    (store, dir)
}

#[tokio::test]
async fn test_file_create_and_get() {
    let (store, _dir) = create_test_store();
    let record = GroupRecord::new(42, "Cats", 10);

    let created = store.create(&record, at(0)).await.expect("create");
    let loaded = store.get(42).await.expect("get").expect("present");

    assert_eq!(created, loaded);
    assert_eq!(loaded.record, record);
    assert_eq!(loaded.updated_at, at(0));
}

#[tokio::test]
async fn test_file_get_missing() {
    let (store, _dir) = create_test_store();

    assert!(store.get(1).await.expect("get").is_none());
}

#[tokio::test]
async fn test_file_create_twice_fails() {
    let (store, _dir) = create_test_store();
    let record = GroupRecord::new(1, "a", 1);

    store.create(&record, at(0)).await.expect("first create");
    let err = store.create(&record, at(5)).await.unwrap_err();

    assert!(matches!(err, StoreError::AlreadyExists { id: 1 }));
    let loaded = store.get(1).await.unwrap().unwrap();
    assert_eq!(loaded.updated_at, at(0));
}

#[tokio::test]
async fn test_file_create_leaves_no_temp_files() {
    let (store, _dir) = create_test_store();
    store
        .create(&GroupRecord::new(1, "a", 1), at(0))
        .await
        .unwrap();

    let names: Vec<String> = std::fs::read_dir(store.storage_path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["1.rkyv".to_string()]);
}

#[tokio::test]
async fn test_file_bulk_update_skips_unknown() {
    let (store, _dir) = create_test_store();
    store
        .create(&GroupRecord::new(1, "a", 1), at(0))
        .await
        .unwrap();
    store
        .create(&GroupRecord::new(2, "b", 2), at(0))
        .await
        .unwrap();

    let updated = store
        .bulk_update(
            &[
                GroupRecord::new(1, "a2", 10),
                GroupRecord::new(3, "never created", 30),
            ],
            at(100),
        )
        .await
        .expect("update");

    assert_eq!(updated, 1);
    let one = store.get(1).await.unwrap().unwrap();
    assert_eq!(one.record, GroupRecord::new(1, "a2", 10));
    assert_eq!(one.updated_at, at(100));
    assert_eq!(store.get(2).await.unwrap().unwrap().updated_at, at(0));
    assert!(store.get(3).await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_bulk_update_continues_past_unwritable_row() {
    let (store, _dir) = create_test_store();
    for id in 1..=3 {
        store
            .create(&GroupRecord::new(id, "old", 1), at(0))
            .await
            .unwrap();
    }

    // A non-empty directory at the row path makes the rename fail.
    let blocked = store.storage_path().join("2.rkyv");
    std::fs::remove_file(&blocked).unwrap();
    std::fs::create_dir(&blocked).unwrap();
    std::fs::write(blocked.join("keep"), b"x").unwrap();

    let updated = store
        .bulk_update(
            &[
                GroupRecord::new(1, "new", 10),
                GroupRecord::new(2, "new", 20),
                GroupRecord::new(3, "new", 30),
            ],
            at(100),
        )
        .await
        .expect("per-row failures are not fatal");

    assert_eq!(updated, 2);
    for id in [1, 3] {
        let row = store.get(id).await.unwrap().unwrap();
        assert_eq!(row.record.name, "new");
        assert_eq!(row.updated_at, at(100));
    }

    let leftovers: Vec<String> = std::fs::read_dir(store.storage_path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");
}

#[tokio::test]
async fn test_file_stale_ids() {
    let (store, _dir) = create_test_store();
    for id in 1..=3 {
        store
            .create(&GroupRecord::new(id, "g", id), at(id * 10))
            .await
            .unwrap();
    }

    let mut stale = store.stale_ids(at(20)).await.expect("scan");
    stale.sort();

    assert_eq!(stale, vec![1, 2]);
}

#[tokio::test]
async fn test_file_stale_ids_empty_dir() {
    let (store, _dir) = create_test_store();

    assert!(store.stale_ids(at(0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_corrupt_record_is_error() {
    let (store, _dir) = create_test_store();
    store.ensure_storage_path().unwrap();
    std::fs::write(store.storage_path().join("7.rkyv"), b"garbage").unwrap();

    let err = store.get(7).await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { id: 7, .. }));

    // The scan skips it rather than failing.
    assert!(store.stale_ids(at(0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_ignores_foreign_files() {
    let (store, _dir) = create_test_store();
    store.ensure_storage_path().unwrap();
    std::fs::write(store.storage_path().join("notes.txt"), b"hi").unwrap();
    store
        .put(&StoredGroup::new(GroupRecord::new(5, "g", 1), at(0)))
        .unwrap();

    assert_eq!(store.list_ids().unwrap(), vec![5]);
}

#[tokio::test]
async fn test_memory_create_get_update() {
    let store = MemoryGroupStore::new();
    let record = GroupRecord::new(1, "a", 1);

    store.create(&record, at(0)).await.unwrap();
    assert!(matches!(
        store.create(&record, at(1)).await,
        Err(StoreError::AlreadyExists { id: 1 })
    ));

    let updated = store
        .bulk_update(&[GroupRecord::new(1, "b", 2)], at(50))
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let row = store.get(1).await.unwrap().unwrap();
    assert_eq!(row.record.name, "b");
    assert_eq!(row.updated_at, at(50));
}

#[tokio::test]
async fn test_memory_stale_ids_inclusive_cutoff() {
    let store = MemoryGroupStore::new();
    let cutoff = at(0);
    store.insert(StoredGroup::new(GroupRecord::new(1, "a", 1), cutoff));
    store.insert(StoredGroup::new(
        GroupRecord::new(2, "b", 1),
        cutoff + Duration::seconds(1),
    ));

    assert_eq!(store.stale_ids(cutoff).await.unwrap(), vec![1]);
}
