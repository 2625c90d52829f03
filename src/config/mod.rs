pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError, ConfigOrigin};
pub use schema::{
    is_go_identifier, RewriteConfig, RuntimeConfig, ValidationError, ValidationIssue,
    WrapperConfig,
};
