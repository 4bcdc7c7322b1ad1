//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! catalog.rs (built-in settings, defaults)
//!     → registry.rs (Settings: typed, validated store)
//!     → CLI binding writes explicit values
//!     → validation.rs (usage checks)
//!     → Arc<Settings> shared read-only with supervisor and agent
//!
//! Pipeline text:
//!     loader.rs (config.path / config.string → text)
//!     → pipeline.rs (structural check)
//!
//! On auto reload:
//!     watcher.rs polls config.path
//!     → ConfigChanged event to the supervisor
//!     → agent reloads its pipeline definition
//! ```
//!
//! # Design Decisions
//! - One explicitly constructed registry, no global lookup
//! - Writes happen during binding, before the agent starts
//! - Validation separates typing (registry) from usage rules (validation.rs)

pub mod catalog;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod setting;
pub mod validation;
pub mod watcher;

pub use catalog::default_settings;
pub use error::{SettingsError, SettingsResult};
pub use loader::{ConfigError, ConfigLoader};
pub use pipeline::PipelineDefinition;
pub use registry::Settings;
pub use setting::{Number, Setting, SettingType, SettingValue};
pub use validation::UsageError;
