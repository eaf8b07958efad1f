use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pantry_core::filter::{Filter, Where};
use pantry_core::schema::{Document, ViolationCode};
use pantry_repository::{CrudRepository, RecipeRepository, RepositoryError};
use pantry_storage::error::StorageError;
use pantry_storage::objects::{PutCondition, StoredObject};
use pantry_storage::store::{MemoryStore, ObjectStore};
use serde_json::{Value, json};

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn recipe(title: &str, cost: u64) -> Document {
    doc(json!({
        "title": title,
        "making_time": "10 min",
        "serves": "2",
        "ingredients": "water, salt",
        "cost": cost
    }))
}

fn repository() -> RecipeRepository {
    RecipeRepository::new(Arc::new(MemoryStore::new()))
}

fn id_of(doc: &Document) -> u64 {
    doc["id"].as_u64().expect("record has an integer id")
}

#[tokio::test]
async fn ids_are_unique_and_never_reused() {
    let repo = repository();
    let first = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());
    let second = id_of(&repo.create(recipe("Stew", 5)).await.unwrap());
    assert_ne!(first, second);

    repo.delete_by_id(second).await.unwrap();
    let third = id_of(&repo.create(recipe("Salad", 4)).await.unwrap());
    assert!(third > second);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    let repo = repository();
    let mut handles = Vec::new();
    for i in 0..4 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.create(recipe(&format!("Dish {i}"), i)).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(id_of(&handle.await.unwrap().unwrap()));
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn find_by_id_after_create_matches_input() {
    let repo = repository();
    let before = jiff::Timestamp::now();
    let created = repo.create(recipe("Soup", 3)).await.unwrap();
    let id = id_of(&created);

    let found = repo.find_by_id(id, None).await.unwrap();
    for (key, value) in recipe("Soup", 3) {
        assert_eq!(found[&key], value, "field {key}");
    }
    for stamp in ["created_at", "updated_at"] {
        let at: jiff::Timestamp = found[stamp].as_str().unwrap().parse().unwrap();
        assert!(at >= before, "{stamp} precedes the create call");
    }
    assert_eq!(found, created);
}

#[tokio::test]
async fn missing_required_fields_fail_create() {
    let repo = repository();
    let err = repo
        .create(doc(json!({"title": "Soup"})))
        .await
        .unwrap_err();
    let details = match err {
        RepositoryError::Validation(e) => e.details,
        other => panic!("expected a validation error, got {other:?}"),
    };
    assert_eq!(details.len(), 4);
}

#[tokio::test]
async fn partial_update_changes_only_patched_fields() {
    let repo = repository();
    let id = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());
    let original = repo.find_by_id(id, None).await.unwrap();

    repo.update_by_id(id, doc(json!({"cost": 5})))
        .await
        .unwrap();

    let updated = repo.find_by_id(id, None).await.unwrap();
    assert_eq!(updated["cost"], json!(5));
    for (key, value) in &original {
        if key != "cost" {
            assert_eq!(&updated[key], value, "field {key} changed");
        }
    }
}

#[tokio::test]
async fn updates_cannot_change_the_id() {
    let repo = repository();
    let id = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());

    let err = repo
        .update_by_id(id, doc(json!({"id": id + 1})))
        .await
        .unwrap_err();
    let details = match err {
        RepositoryError::Validation(e) => e.details,
        other => panic!("expected a validation error, got {other:?}"),
    };
    assert_eq!(details[0].code, ViolationCode::Immutable);

    repo.update_by_id(id, doc(json!({"id": id, "title": "Broth"})))
        .await
        .unwrap();

    assert!(repo.update_all(doc(json!({"id": 99})), None).await.is_err());
}

#[tokio::test]
async fn operations_on_missing_ids_are_not_found() {
    let repo = repository();
    assert!(repo.find_by_id(42, None).await.unwrap_err().is_not_found());
    assert!(
        repo.update_by_id(42, doc(json!({"cost": 1})))
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        repo.replace_by_id(42, recipe("Soup", 3))
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(repo.delete_by_id(42).await.unwrap_err().is_not_found());
    assert!(!repo.exists(42).await.unwrap());
}

#[tokio::test]
async fn delete_then_find_is_not_found() {
    let repo = repository();
    let id = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());
    repo.delete_by_id(id).await.unwrap();

    let err = repo.find_by_id(id, None).await.unwrap_err();
    assert_eq!(err.to_string(), format!("Entity not found: Recipe with id {id}"));
}

#[tokio::test]
async fn find_and_count_agree_on_where() {
    let repo = repository();
    for (title, cost) in [("Soup", 3), ("Curry", 12), ("Stew", 20), ("Salad", 10)] {
        repo.create(recipe(title, cost)).await.unwrap();
    }

    let where_clause = Where::from_value(&json!({"cost": {"gt": 10}})).unwrap();
    let found = repo
        .find(&Filter::with_where(where_clause.clone()))
        .await
        .unwrap();
    assert!(found.iter().all(|d| d["cost"].as_u64().unwrap() > 10));
    assert_eq!(found.len(), 2);

    let count = repo.count(Some(&where_clause)).await.unwrap();
    assert_eq!(count, found.len() as u64);
    assert_eq!(repo.count(None).await.unwrap(), 4);
}

#[tokio::test]
async fn update_all_patches_matching_records() {
    let repo = repository();
    for (title, cost) in [("Soup", 3), ("Curry", 12), ("Stew", 20)] {
        repo.create(recipe(title, cost)).await.unwrap();
    }

    let cheap = Where::from_value(&json!({"cost": {"lt": 15}})).unwrap();
    let updated = repo
        .update_all(doc(json!({"serves": "4"})), Some(&cheap))
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let four = Where::from_value(&json!({"serves": "4"})).unwrap();
    assert_eq!(repo.count(Some(&four)).await.unwrap(), 2);

    assert_eq!(
        repo.update_all(doc(json!({"spicy": true})), None).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn replace_overwrites_all_fields() {
    let repo = repository();
    let mut input = recipe("Soup", 3);
    input.insert("spicy".to_string(), json!(true));
    let id = id_of(&repo.create(input).await.unwrap());

    repo.replace_by_id(id, recipe("Broth", 2)).await.unwrap();

    let replaced = repo.find_by_id(id, None).await.unwrap();
    assert_eq!(replaced["id"], json!(id));
    assert_eq!(replaced["title"], json!("Broth"));
    assert!(replaced.get("spicy").is_none());
    assert!(replaced.contains_key("created_at"));

    let err = repo
        .replace_by_id(id, doc(json!({"title": "Broth"})))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}

#[tokio::test]
async fn extra_fields_survive_round_trips() {
    let repo = repository();
    let mut input = recipe("Soup", 3);
    input.insert("origin".to_string(), json!({"country": "FR"}));
    let id = id_of(&repo.create(input).await.unwrap());

    repo.update_by_id(id, doc(json!({"note": "add pepper"})))
        .await
        .unwrap();

    let found = repo.find_by_id(id, None).await.unwrap();
    assert_eq!(found["origin"], json!({"country": "FR"}));
    assert_eq!(found["note"], json!("add pepper"));
}

#[tokio::test]
async fn find_by_id_applies_projection() {
    let repo = repository();
    let id = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());

    let filter = Filter::excluding_where(&json!({"fields": ["title"]})).unwrap();
    let found = repo.find_by_id(id, Some(&filter)).await.unwrap();
    assert_eq!(found, doc(json!({"title": "Soup"})));
}

#[tokio::test]
async fn records_are_stored_as_documents() {
    let store = Arc::new(MemoryStore::new());
    let repo = RecipeRepository::new(store.clone());
    let id = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());

    let keys = store.list("").await.unwrap();
    assert_eq!(keys, ["_sequences/recipes.json".to_string(), format!("recipes/{id}.json")]);
}

/// Deletes one key right after it is next read, as if a concurrent
/// DELETE landed between a read and the write that follows it.
struct DeleteAfterRead {
    inner: MemoryStore,
    key: String,
    armed: AtomicBool,
}

impl DeleteAfterRead {
    fn new(key: String) -> Self {
        Self {
            inner: MemoryStore::new(),
            key,
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for DeleteAfterRead {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let output = self.inner.get(key).await?;
        if key == self.key && self.armed.swap(false, Ordering::SeqCst) {
            self.inner.delete(key).await?;
        }
        Ok(output)
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        condition: PutCondition,
    ) -> Result<String, StorageError> {
        self.inner.put(key, body, condition).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list(prefix).await
    }
}

async fn racing_repository() -> (RecipeRepository, u64) {
    // The first record always gets id 1.
    let store = Arc::new(DeleteAfterRead::new("recipes/1.json".to_string()));
    let repo = RecipeRepository::new(store.clone());
    let id = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());
    assert_eq!(id, 1);
    store.arm();
    (repo, id)
}

#[tokio::test]
async fn update_does_not_resurrect_a_concurrently_deleted_record() {
    let (repo, id) = racing_repository().await;

    let err = repo
        .update_by_id(id, doc(json!({"cost": 5})))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(repo.find_by_id(id, None).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn replace_does_not_resurrect_a_concurrently_deleted_record() {
    let (repo, id) = racing_repository().await;

    let err = repo
        .replace_by_id(id, recipe("Broth", 2))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!repo.exists(id).await.unwrap());
}

#[tokio::test]
async fn bulk_update_skips_a_concurrently_deleted_record() {
    let (repo, id) = racing_repository().await;

    let updated = repo.update_all(doc(json!({"serves": "4"})), None).await.unwrap();
    assert_eq!(updated, 0);
    assert!(!repo.exists(id).await.unwrap());
    assert_eq!(repo.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn patch_cannot_null_a_timestamp() {
    let repo = repository();
    let id = id_of(&repo.create(recipe("Soup", 3)).await.unwrap());

    let err = repo
        .update_by_id(id, doc(json!({"created_at": null})))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
    assert!(repo.find_by_id(id, None).await.unwrap()["created_at"].is_string());
}
