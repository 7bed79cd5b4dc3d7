//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → [properties] table → properties.rs (TomlPropertySource)
//!     → shared as Arc<dyn PropertySource> with handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Typed property getters fail on a kind mismatch instead of coercing

pub mod loader;
pub mod properties;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, load_config, parse_config};
pub use properties::{
    MapPropertySource, PropertyError, PropertySource, PropertyValue, TomlPropertySource,
};
pub use schema::{
    LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServerConfig, TimeoutConfig,
};
pub use validation::{ValidationError, validate_config};
