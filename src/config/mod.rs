pub mod schema;
pub mod setup;

pub use schema::{
    Backend, Config, DefaultConfig, ProviderConfig, ReliabilityConfig, TranslationConfig,
};
pub use setup::{run_setup, PROVIDERS};
