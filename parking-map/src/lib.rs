pub mod config;
pub mod error;
pub mod map;
pub mod services;

pub use config::SyncConfig;
pub use error::{ConfigError, EngineClosed, FetchError, GeocodeError, ReminderError, SurfaceError};
pub use map::engine::{EngineEvent, MapEngine, MapHandle};
pub use map::surface::{RenderSurface, SurfaceOptions, Visibility};
pub use map::sync::SyncStatus;
