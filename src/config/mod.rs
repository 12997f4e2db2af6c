pub mod loader;
pub mod schema;

pub use loader::{default_config_path, load_from_path, load_from_str, ConfigError};
pub use schema::{
    JobConfig, LogoSection, Markers, Paths, ServiceSection, ThemeSection, ValidationError,
    ValidationIssue,
};
