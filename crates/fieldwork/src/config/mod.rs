pub mod loader;
pub mod schema;

pub use loader::{
    load_config, load_config_from_str, resolve_base_url, resolve_database_path, validate_config,
    BACKEND_URL_ENV,
};
pub use schema::{Environment, SyncConfig};
