pub mod config;
pub mod error;
pub mod github;
pub mod library;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Config;
pub use error::{ApiError, Result};
pub use github::{GitHubStore, RemoteStore};
pub use library::Library;
pub use routes::{create_router, AppState};
pub use server::{run_server, run_server_with_shutdown};
pub use types::{FileDescriptor, RawDocument, TreeEntry, WriteOutcome};
