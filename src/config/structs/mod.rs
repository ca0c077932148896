mod app;
mod generation;
mod network;

pub use app::{AppConfig, AppSettings};
pub use generation::GenerationConfig;
pub use network::NetworkConfig;
