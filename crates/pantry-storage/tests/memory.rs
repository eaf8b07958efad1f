use pantry_storage::error::StorageError;
use pantry_storage::objects::PutCondition;
use pantry_storage::state::{create_state, load_state, save_state_if_match};
use pantry_storage::store::{MemoryStore, ObjectStore};

#[tokio::test]
async fn get_missing_key_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get("recipes/1.json").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { key } if key == "recipes/1.json"));
}

#[tokio::test]
async fn put_then_get_returns_body_and_etag() {
    let store = MemoryStore::new();
    let etag = store
        .put("recipes/1.json", b"{}".to_vec(), PutCondition::None)
        .await
        .unwrap();

    let output = store.get("recipes/1.json").await.unwrap();
    assert_eq!(output.body, b"{}");
    assert_eq!(output.etag.as_deref(), Some(etag.as_str()));
}

#[tokio::test]
async fn every_write_gets_a_fresh_etag() {
    let store = MemoryStore::new();
    let first = store.put("a", b"1".to_vec(), PutCondition::None).await.unwrap();
    let second = store.put("a", b"2".to_vec(), PutCondition::None).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn if_none_match_only_creates() {
    let store = MemoryStore::new();
    store.put("a", b"1".to_vec(), PutCondition::IfNoneMatch).await.unwrap();

    let err = store
        .put("a", b"2".to_vec(), PutCondition::IfNoneMatch)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::PreconditionFailed { .. }));
    assert_eq!(store.get("a").await.unwrap().body, b"1");
}

#[tokio::test]
async fn if_match_rejects_stale_etag() {
    let store = MemoryStore::new();
    let stale = store.put("a", b"1".to_vec(), PutCondition::None).await.unwrap();
    let fresh = store
        .put("a", b"2".to_vec(), PutCondition::IfMatch(stale.clone()))
        .await
        .unwrap();

    let err = store
        .put("a", b"3".to_vec(), PutCondition::IfMatch(stale))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::PreconditionFailed { .. }));

    store
        .put("a", b"3".to_vec(), PutCondition::IfMatch(fresh))
        .await
        .unwrap();
    assert_eq!(store.get("a").await.unwrap().body, b"3");
}

#[tokio::test]
async fn list_is_prefix_scoped_and_sorted() {
    let store = MemoryStore::new();
    for key in ["recipes/2.json", "recipes/10.json", "recipesx/1.json", "_sequences/recipes.json"] {
        store.put(key, b"{}".to_vec(), PutCondition::None).await.unwrap();
    }

    let keys = store.list("recipes/").await.unwrap();
    assert_eq!(keys, ["recipes/10.json", "recipes/2.json"]);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = MemoryStore::new();
    store.put("a", b"1".to_vec(), PutCondition::None).await.unwrap();
    store.delete("a").await.unwrap();
    store.delete("a").await.unwrap();
    assert!(store.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn state_documents_use_optimistic_locking() {
    let store = MemoryStore::new();
    create_state(&store, "_state/counter.json", &1u64).await.unwrap();
    assert!(create_state(&store, "_state/counter.json", &5u64).await.is_err());

    let (value, etag): (u64, String) = load_state(&store, "_state/counter.json").await.unwrap();
    assert_eq!(value, 1);

    save_state_if_match(&store, "_state/counter.json", &2u64, &etag)
        .await
        .unwrap();
    let err = save_state_if_match(&store, "_state/counter.json", &3u64, &etag)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::PreconditionFailed { .. }));

    let (value, _): (u64, String) = load_state(&store, "_state/counter.json").await.unwrap();
    assert_eq!(value, 2);
}
