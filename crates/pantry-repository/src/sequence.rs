use serde::{Deserialize, Serialize};

use pantry_core::keys;
use pantry_storage::error::StorageError;
use pantry_storage::state;
use pantry_storage::store::ObjectStore;

use crate::error::RepositoryError;

/// How many times a lost compare-and-swap on the counter is retried.
pub const MAX_ATTEMPTS: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
struct SequenceState {
    last_id: u64,
}

/// Hand out the next id for `collection`.
///
/// The counter document only ever grows, so an id is never handed out
/// twice, even after the record that held it is deleted.
pub async fn next_id(store: &dyn ObjectStore, collection: &str) -> Result<u64, RepositoryError> {
    let key = keys::sequence(collection);

    for attempt in 1..=MAX_ATTEMPTS {
        let written = match state::load_state::<SequenceState>(store, &key).await {
            Ok((current, etag)) => {
                let next = current.last_id + 1;
                state::save_state_if_match(store, &key, &SequenceState { last_id: next }, &etag)
                    .await
                    .map(|_| next)
            }
            Err(StorageError::NotFound { .. }) => {
                state::create_state(store, &key, &SequenceState { last_id: 1 })
                    .await
                    .map(|_| 1)
            }
            Err(e) => return Err(e.into()),
        };

        match written {
            Ok(id) => return Ok(id),
            Err(StorageError::PreconditionFailed { .. }) => {
                tracing::debug!(collection, attempt, "id sequence moved underneath us, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!(collection, attempts = MAX_ATTEMPTS, "gave up allocating an id");
    Err(RepositoryError::SequenceContention {
        collection: collection.to_string(),
        attempts: MAX_ATTEMPTS,
    })
}
