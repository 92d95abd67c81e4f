//! 本地能力 Provider
//!
//! 语言识别在本机完成（whatlang 三元组模型），不需要网络或 API Key。
//! 本地没有翻译模型，所有语言对都报告为不可用。

use async_trait::async_trait;
use color_eyre::eyre::{bail, Result};
use tracing::debug;

use crate::i18n;

use super::traits::{
    Availability, CapabilityProvider, DetectionCandidate, DetectorSession, ProgressMonitor,
    TranslatorSession,
};

pub struct LocalProvider;

#[async_trait]
impl CapabilityProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn detector_availability(&self) -> Result<Availability> {
        Ok(Availability::Ready)
    }

    async fn create_detector(
        &self,
        _monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn DetectorSession>> {
        Ok(Box::new(WhatlangDetector))
    }

    async fn translator_availability(&self, _source: &str, _target: &str) -> Result<Availability> {
        Ok(Availability::Unavailable)
    }

    async fn create_translator(
        &self,
        source: &str,
        target: &str,
        _monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn TranslatorSession>> {
        bail!("本地 Provider 不支持翻译 ({} → {})", source, target)
    }
}

struct WhatlangDetector;

#[async_trait]
impl DetectorSession for WhatlangDetector {
    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>> {
        let Some(info) = whatlang::detect(text) else {
            debug!("whatlang 无法识别: {:?}", text);
            return Ok(vec![]);
        };

        Ok(vec![DetectionCandidate {
            detected_language: i18n::normalize_tag(info.lang().code()),
            confidence: info.confidence(),
        }])
    }
}
