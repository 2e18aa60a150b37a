pub mod config;
pub mod envelope;
pub mod logging;
pub mod router;
pub mod state;

pub use config::{Config, ConfigError, StoreBackend};
pub use envelope::Envelope;
pub use router::{route, RouteRequest, RouteResponse};
pub use state::AppState;
