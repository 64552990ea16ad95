pub mod config;
pub mod coordinates;
pub mod error;
pub mod publish;
pub mod resolve;
pub mod store;
pub mod transform;

pub use config::SourceConfig;
pub use error::PublishError;
pub use publish::{Publisher, DEFAULT_BASE_REMOTE_PATH};
pub use resolve::{remote_path, resolve, SourceIdentity};
