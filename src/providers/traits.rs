use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};

/// 能力可用性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// 设备不支持
    #[serde(rename = "no")]
    Unavailable,
    /// 可直接创建会话
    #[serde(rename = "readily")]
    Ready,
    /// 需要先下载模型，会话就绪前需等待
    #[serde(rename = "after-download", alias = "afterDownload")]
    NeedsDownload,
}

/// 下载进度（仅用于观察，不影响控制流）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub loaded: u64,
    pub total: u64,
}

/// 下载进度回调
pub type ProgressMonitor = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// 单个识别候选
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    pub detected_language: String,
    pub confidence: f64,
}

/// 语言识别会话
#[async_trait]
pub trait DetectorSession: Send + Sync {
    /// 等待会话就绪（需要下载时由 Gateway 调用）
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    /// 返回候选列表，最佳候选在前
    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>>;
}

/// 翻译会话（绑定一个 source → target 语言对）
#[async_trait]
pub trait TranslatorSession: Send + Sync {
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn translate(&self, text: &str) -> Result<String>;
}

/// 外部能力 Provider 抽象
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Provider 名称（日志用）
    fn name(&self) -> &str;

    async fn detector_availability(&self) -> Result<Availability>;

    async fn create_detector(
        &self,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn DetectorSession>>;

    async fn translator_availability(&self, source: &str, target: &str) -> Result<Availability>;

    async fn create_translator(
        &self,
        source: &str,
        target: &str,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn TranslatorSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_wire_names() {
        assert_eq!(serde_json::to_string(&Availability::Unavailable).unwrap(), "\"no\"");
        assert_eq!(serde_json::to_string(&Availability::Ready).unwrap(), "\"readily\"");
        assert_eq!(
            serde_json::to_string(&Availability::NeedsDownload).unwrap(),
            "\"after-download\""
        );
    }

    #[test]
    fn availability_accepts_both_download_spellings() {
        let a: Availability = serde_json::from_str("\"after-download\"").unwrap();
        let b: Availability = serde_json::from_str("\"afterDownload\"").unwrap();
        assert_eq!(a, Availability::NeedsDownload);
        assert_eq!(b, Availability::NeedsDownload);
    }
}
