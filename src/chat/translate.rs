use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::store::MessageStore;
use super::types::{MessageId, TranslationAttempt};
use crate::error::ChatError;
use crate::i18n::TargetLanguage;
use crate::providers::CapabilityGateway;

/// 语言对不可用时写入历史的错误信息
pub const PAIR_UNAVAILABLE: &str = "Translation not possible on device";

/// 翻译编排器
pub struct TranslationOrchestrator {
    gateway: Arc<CapabilityGateway>,
    timeout: Option<Duration>,
}

impl TranslationOrchestrator {
    pub fn new(gateway: Arc<CapabilityGateway>, timeout: Option<Duration>) -> Self {
        Self { gateway, timeout }
    }

    /// 翻译一段文本，返回已完成的翻译记录（成功或失败）
    pub async fn translate(
        &self,
        request_id: u64,
        text: &str,
        source: &str,
        target: TargetLanguage,
    ) -> TranslationAttempt {
        match self.run(text, source, target).await {
            Ok(translated) => TranslationAttempt::success(request_id, source, target, translated),
            Err(e) => TranslationAttempt::failure(request_id, source, target, e),
        }
    }

    async fn run(&self, text: &str, source: &str, target: TargetLanguage) -> Result<String, ChatError> {
        // 模型下载/就绪等待不计入超时
        let session = self
            .gateway
            .acquire_translator(source, target.code())
            .await
            .map_err(|e| match e {
                ChatError::CapabilityUnavailable(reason) => {
                    warn!("{}: {}", PAIR_UNAVAILABLE, reason);
                    ChatError::CapabilityUnavailable(PAIR_UNAVAILABLE.to_string())
                }
                other => other,
            })?;

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, session.translate(text))
                .await
                .map_err(|_| {
                    warn!("翻译 {}→{} 超时 ({:?})", source, target, limit);
                    ChatError::OperationFailure(format!(
                        "Translation timed out after {:?}",
                        limit
                    ))
                })?,
            None => session.translate(text).await,
        };

        result.map_err(|e| {
            warn!("翻译调用失败: {:#}", e);
            ChatError::OperationFailure(format!("{:#}", e))
        })
    }

    /// 翻译存储中的一条消息并把结果追加到其翻译历史
    ///
    /// `source` 为发起请求时消息的识别语言。`keep` 在追加前调用，
    /// 返回 false 时丢弃结果（用于淘汰已被新请求取代的旧请求）。
    pub async fn translate_message<F>(
        &self,
        store: &MessageStore,
        id: MessageId,
        request_id: u64,
        source: &str,
        target: TargetLanguage,
        keep: F,
    ) -> Option<TranslationAttempt>
    where
        F: FnOnce(&TranslationAttempt) -> bool,
    {
        let Some(message) = store.get(id) else {
            debug!("消息 {} 已不存在，跳过翻译", id);
            return None;
        };

        let attempt = self.translate(request_id, &message.text, source, target).await;
        if !keep(&attempt) {
            debug!("请求 #{} 已被取代，丢弃结果", request_id);
            return None;
        }

        match store.append_translation(id, attempt.clone()) {
            Ok(position) => {
                info!(
                    "消息 {} 翻译 {}→{} 完成 ({:?}, 历史第 {} 条)",
                    id,
                    source,
                    target,
                    attempt.status(),
                    position + 1
                );
                Some(attempt)
            }
            Err(e) => {
                debug!("翻译结果未写入: {}", e);
                None
            }
        }
    }
}
