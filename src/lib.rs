/// Error types for the pool watcher
pub mod error;

/// Shared event and alert types
pub mod events;

/// Log record classification
pub mod classifier;

/// Collectors that follow the access log
pub mod collectors;

/// Rolling window over recent requests
pub mod window;

/// Pool transition detection
pub mod detector;

/// Per-event processing pipeline
pub mod processor;

/// Alert dispatch, cooldown, and notification transports
pub mod alerts;

/// Configuration management
pub mod config;

/// Watcher composition root
pub mod watcher;

// Re-export commonly used types
pub use config::{Config, MaintenanceScope};
pub use error::{CollectorError, ConfigError, NotifyError};
pub use events::{AlertKind, AlertRequest, LogEvent};
pub use watcher::Watcher;
