//! # Core Runtime
//!
//! Shared runtime services for the Subtune core: configuration and
//! capability wiring, the event bus, structured logging, durable user
//! preferences, and offline-mode coordination.
//!
//! The [`CoreConfig`](config::CoreConfig) builder validates the injected
//! platform bridges up front so a misassembled host fails at startup, not
//! mid-playback. [`EventBus`](events::EventBus) carries
//! [`CoreEvent`](events::CoreEvent)s to any number of UI subscribers over
//! a broadcast channel. [`OfflineCoordinator`](offline::OfflineCoordinator)
//! folds the user's offline preference together with observed network
//! state into a single effective-offline answer.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod offline;
pub mod preferences;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CacheEvent, CoreEvent, EventBus, NetworkEvent, PlaybackEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use offline::OfflineCoordinator;
pub use preferences::Preferences;
