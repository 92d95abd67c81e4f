pub mod compatible;
pub mod gateway;
pub mod local;
pub mod traits;

pub use gateway::{CapabilityGateway, CapabilityKind, RetryConfig};
pub use traits::{
    Availability, CapabilityProvider, DetectionCandidate, DetectorSession, DownloadProgress,
    ProgressMonitor, TranslatorSession,
};

use std::sync::Arc;

use crate::config::{Backend, Config};

/// 根据配置创建能力 Provider 实例
pub fn create_provider(config: &Config) -> Arc<dyn CapabilityProvider> {
    match config.default.backend {
        Backend::Compatible => Arc::new(compatible::CompatibleProvider::new(&config.provider)),
        Backend::Local => Arc::new(local::LocalProvider),
    }
}

/// 根据配置创建 Gateway（含重试策略）
pub fn create_gateway(config: &Config) -> CapabilityGateway {
    let retry = RetryConfig {
        max_retries: config.reliability.max_retries,
        initial_backoff_ms: config.reliability.initial_backoff_ms,
        ..Default::default()
    };
    CapabilityGateway::new(create_provider(config), retry)
}
