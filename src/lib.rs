pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod presenter;
pub mod provider;
pub mod server;

pub use config::{Config, ProviderConfig};
pub use error::{GatewayError, Result};
pub use models::{BackgroundChange, GenerationRequest, ImageGeneration, PoseGeneration};
pub use provider::ProviderClient;
