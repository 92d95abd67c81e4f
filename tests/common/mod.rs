//! 集成测试公共辅助函数

// 每个集成测试文件只使用 common 的一部分，未用到的辅助函数属于预期 dead_code
#![allow(dead_code)]

pub mod mock_provider;
pub use mock_provider::{count, Calls, MockProvider};

use std::sync::Arc;
use std::time::Duration;

use lingochat::chat::{ChatMessage, ChatSession, MessageId, SessionOptions};
use lingochat::providers::{CapabilityGateway, RetryConfig};

/// 不等待的重试策略（只重试一次，退避 0ms）
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 1,
        initial_backoff_ms: 0,
        ..Default::default()
    }
}

pub fn mock_gateway(mock: MockProvider) -> (Arc<CapabilityGateway>, Arc<Calls>) {
    let calls = mock.calls.clone();
    (
        Arc::new(CapabilityGateway::new(Arc::new(mock), fast_retry())),
        calls,
    )
}

/// 用 mock 构造会话，返回会话和调用计数
pub fn session_with(mock: MockProvider, options: SessionOptions) -> (ChatSession, Arc<Calls>) {
    let (gateway, calls) = mock_gateway(mock);
    (ChatSession::new(gateway, options), calls)
}

pub fn session(mock: MockProvider) -> (ChatSession, Arc<Calls>) {
    session_with(mock, SessionOptions::default())
}

/// 提交并等待识别结束
pub async fn submit_detected(session: &ChatSession, text: &str) -> MessageId {
    let id = session.submit(text).expect("submit should succeed");
    session.settle().await;
    id
}

pub fn message(session: &ChatSession, id: MessageId) -> ChatMessage {
    session.store().get(id).expect("message should exist")
}

/// 轮询直到消息的翻译历史达到 `n` 条（最多等 2 秒）
pub async fn wait_for_translations(session: &ChatSession, id: MessageId, n: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while message(session, id).status.translations.len() < n {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {} translations",
            n
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
