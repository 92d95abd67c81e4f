use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::store::MessageStore;
use super::types::{DetectionStatus, MessageId};
use crate::error::ChatError;
use crate::providers::CapabilityGateway;

/// 语言识别编排器
pub struct DetectionOrchestrator {
    gateway: Arc<CapabilityGateway>,
    timeout: Option<Duration>,
}

impl DetectionOrchestrator {
    pub fn new(gateway: Arc<CapabilityGateway>, timeout: Option<Duration>) -> Self {
        Self { gateway, timeout }
    }

    /// 识别文本语言，返回终态（不会返回 `Pending`）
    pub async fn detect(&self, text: &str) -> DetectionStatus {
        if text.trim().is_empty() {
            return DetectionStatus::error(ChatError::EmptyInput("No text to detect".to_string()));
        }

        // 模型下载/就绪等待不计入超时
        let session = match self.gateway.acquire_detector().await {
            Ok(s) => s,
            Err(e) => {
                warn!("获取识别会话失败: {}", e);
                return DetectionStatus::error(e.with_message("detector unavailable"));
            }
        };

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, session.detect(text)).await {
                Ok(r) => r,
                Err(_) => {
                    warn!("语言识别超时 ({:?})", limit);
                    return DetectionStatus::error(ChatError::OperationFailure(format!(
                        "Detection timed out after {:?}",
                        limit
                    )));
                }
            },
            None => session.detect(text).await,
        };

        let candidates = match result {
            Ok(c) => c,
            Err(e) => {
                warn!("识别调用失败: {:#}", e);
                return DetectionStatus::error(ChatError::OperationFailure(
                    "Detection failed".to_string(),
                ));
            }
        };

        match candidates.into_iter().next() {
            Some(best) => {
                debug!(
                    "识别结果: {} ({:.2})",
                    best.detected_language, best.confidence
                );
                DetectionStatus::Success {
                    detected_language: best.detected_language,
                    confidence: best.confidence,
                }
            }
            None => {
                warn!("识别未返回任何候选");
                DetectionStatus::error(ChatError::OperationFailure("Detection failed".to_string()))
            }
        }
    }

    /// 识别存储中的一条消息并写回结果
    pub async fn detect_message(&self, store: &MessageStore, id: MessageId) -> DetectionStatus {
        let Some(message) = store.get(id) else {
            debug!("消息 {} 已不存在，跳过识别", id);
            return DetectionStatus::error(ChatError::OperationFailure(format!(
                "message {} not found",
                id
            )));
        };

        let status = self.detect(&message.text).await;
        match store.update_detection(id, status.clone()) {
            Ok(()) => info!("消息 {} 识别完成: {:?}", id, status),
            Err(e) => debug!("识别结果未写入: {}", e),
        }
        status
    }
}
