use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("document does not fit the model: {0}")]
    Decode(#[from] serde_json::Error),
}
