use std::future::Future;
use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::traits::{
    Availability, CapabilityProvider, DetectorSession, DownloadProgress, ProgressMonitor,
    TranslatorSession,
};
use crate::error::ChatError;

/// 重试配置（仅作用于会话初始化，Unavailable 不重试）
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 最大重试次数（不含首次尝试）
    pub max_retries: usize,
    /// 初始退避时间（毫秒）
    pub initial_backoff_ms: u64,
    /// 退避乘数（每次失败后乘以该值）
    pub backoff_multiplier: f64,
    /// 最大退避时间上限（毫秒）
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 200,
            backoff_multiplier: 2.0,
            max_backoff_ms: 5_000,
        }
    }
}

/// 要查询的能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind<'a> {
    Detection,
    Translation { source: &'a str, target: &'a str },
}

/// 能力网关：查询可用性、获取就绪的会话
///
/// Provider 以依赖注入方式传入，测试时可替换为 mock。
pub struct CapabilityGateway {
    provider: Arc<dyn CapabilityProvider>,
    retry: RetryConfig,
}

impl CapabilityGateway {
    pub fn new(provider: Arc<dyn CapabilityProvider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// 查询可用性。Provider 异常视同不可用。
    pub async fn check_availability(&self, kind: CapabilityKind<'_>) -> Availability {
        match self.availability(kind).await {
            Ok(a) => a,
            Err(e) => {
                warn!("{}", e);
                Availability::Unavailable
            }
        }
    }

    async fn availability(&self, kind: CapabilityKind<'_>) -> Result<Availability, ChatError> {
        let result = match kind {
            CapabilityKind::Detection => self.provider.detector_availability().await,
            CapabilityKind::Translation { source, target } => {
                self.provider.translator_availability(source, target).await
            }
        };
        result.map_err(|e| {
            ChatError::CapabilityUnavailable(format!(
                "capability provider '{}' unavailable: {:#}",
                self.provider.name(),
                e
            ))
        })
    }

    /// 获取语言识别会话
    pub async fn acquire_detector(&self) -> Result<Box<dyn DetectorSession>, ChatError> {
        let availability = self.availability(CapabilityKind::Detection).await?;
        debug!("detector availability: {:?}", availability);

        let needs_download = match availability {
            Availability::Unavailable => {
                return Err(ChatError::CapabilityUnavailable(
                    "language detection is not supported on this device".to_string(),
                ))
            }
            Availability::Ready => false,
            Availability::NeedsDownload => {
                info!("语言识别模型需要下载，等待就绪");
                true
            }
        };

        let provider = &self.provider;
        let monitor = needs_download.then(|| progress_monitor("detector"));
        self.with_retry("detector", || {
            let monitor = monitor.clone();
            async move {
                let session = provider.create_detector(monitor).await?;
                if needs_download {
                    session.ready().await?;
                }
                Ok::<_, color_eyre::eyre::Report>(session)
            }
        })
        .await
    }

    /// 获取 source → target 翻译会话
    pub async fn acquire_translator(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Box<dyn TranslatorSession>, ChatError> {
        let availability = self
            .availability(CapabilityKind::Translation { source, target })
            .await?;
        debug!("translator {}→{} availability: {:?}", source, target, availability);

        let needs_download = match availability {
            Availability::Unavailable => {
                return Err(ChatError::CapabilityUnavailable(format!(
                    "translation {} → {} is not supported on this device",
                    source, target
                )))
            }
            Availability::Ready => false,
            Availability::NeedsDownload => {
                info!("翻译模型 {}→{} 下载中，等待就绪", source, target);
                true
            }
        };

        let provider = &self.provider;
        let monitor = needs_download.then(|| progress_monitor("translator"));
        self.with_retry("translator", || {
            let monitor = monitor.clone();
            async move {
                let session = provider.create_translator(source, target, monitor).await?;
                if needs_download {
                    session.ready().await?;
                }
                Ok::<_, color_eyre::eyre::Report>(session)
            }
        })
        .await
    }

    /// 会话初始化（含指数退避重试）
    async fn with_retry<T, F, Fut>(&self, label: &str, mut init: F) -> Result<T, ChatError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = color_eyre::eyre::Result<T>>,
    {
        let mut backoff_ms = self.retry.initial_backoff_ms;
        let mut attempt = 0;

        loop {
            match init().await {
                Ok(session) => {
                    if attempt > 0 {
                        debug!("{} 初始化重试成功（第 {} 次尝试）", label, attempt + 1);
                    }
                    return Ok(session);
                }
                Err(e) if attempt >= self.retry.max_retries => {
                    warn!("{} 初始化失败，放弃: {:#}", label, e);
                    return Err(ChatError::InitializationFailure(format!(
                        "{} initialization failed: {:#}",
                        label, e
                    )));
                }
                Err(e) => {
                    warn!(
                        "{} 第 {} 次初始化失败，{} ms 后重试: {:#}",
                        label,
                        attempt + 1,
                        backoff_ms,
                        e
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = ((backoff_ms as f64) * self.retry.backoff_multiplier) as u64;
                    backoff_ms = backoff_ms.min(self.retry.max_backoff_ms);
                    attempt += 1;
                }
            }
        }
    }
}

fn progress_monitor(label: &'static str) -> ProgressMonitor {
    Arc::new(move |p: DownloadProgress| {
        debug!("{}: Downloaded {} of {} bytes.", label, p.loaded, p.total);
    })
}
