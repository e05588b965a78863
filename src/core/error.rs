use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("state change failed: {0}")]
    Change(#[from] crate::state::change::ChangeError),

    #[error("unit catalog error: {0}")]
    Catalog(#[from] crate::state::unit::CatalogError),

    #[error("persistence error: {0}")]
    Persist(#[from] crate::persist::PersistError),

    #[error("translation error: {0}")]
    Translate(#[from] crate::persist::translate::TranslateError),

    #[error("post error: {0}")]
    Post(#[from] crate::post::PostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
