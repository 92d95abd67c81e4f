//! 聊天会话：输入组件 + 请求跟踪
//!
//! 负责校验输入、为每条消息启动识别任务、在识别成功后放行翻译请求，
//! 并在内存中临时记录进行中的翻译（不写入消息历史）。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::detect::DetectionOrchestrator;
use super::store::{MessageStore, StoreError};
use super::translate::TranslationOrchestrator;
use super::types::{ChatMessage, DetectionStatus, MessageId, TranslationAttempt};
use crate::config::Config;
use crate::i18n::TargetLanguage;
use crate::providers::{self, CapabilityGateway};

/// 会话被拒绝的请求
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Empty field. Fill something in")]
    EmptyInput,
    #[error("message not found")]
    NotFound,
    #[error("language detection is still running")]
    DetectionPending,
    #[error("language detection failed: {0}")]
    DetectionFailed(String),
    #[error("message is already in {}", .0.display_name())]
    SameLanguage(TargetLanguage),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 一条消息的翻译控件状态
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationControl {
    /// 消息不存在
    Hidden,
    /// 识别未完成或失败
    Disabled { reason: String },
    /// 可选目标语言（已排除源语言）
    Enabled {
        source: String,
        options: Vec<TargetLanguage>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// 单次请求超时
    pub timeout: Option<Duration>,
    /// 丢弃已被同一消息的新请求取代的结果
    pub supersede_stale: bool,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout(),
            supersede_stale: config.translation.supersede_stale,
        }
    }
}

/// 进行中的翻译请求 + 每条消息最新的请求号
#[derive(Default)]
struct RequestTracker {
    in_flight: HashMap<MessageId, Vec<(u64, TargetLanguage)>>,
    latest: HashMap<MessageId, u64>,
}

impl RequestTracker {
    fn start(&mut self, id: MessageId, request_id: u64, target: TargetLanguage) {
        self.in_flight.entry(id).or_default().push((request_id, target));
        self.latest.insert(id, request_id);
    }

    fn finish(&mut self, id: MessageId, request_id: u64) {
        if let Some(pending) = self.in_flight.get_mut(&id) {
            pending.retain(|(r, _)| *r != request_id);
            if pending.is_empty() {
                self.in_flight.remove(&id);
            }
        }
    }

    fn is_latest(&self, id: MessageId, request_id: u64) -> bool {
        self.latest.get(&id) == Some(&request_id)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct ChatSession {
    store: Arc<MessageStore>,
    detector: Arc<DetectionOrchestrator>,
    translator: Arc<TranslationOrchestrator>,
    supersede_stale: bool,
    next_request: AtomicU64,
    tracker: Arc<Mutex<RequestTracker>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ChatSession {
    pub fn new(gateway: Arc<CapabilityGateway>, options: SessionOptions) -> Self {
        Self {
            store: Arc::new(MessageStore::new()),
            detector: Arc::new(DetectionOrchestrator::new(gateway.clone(), options.timeout)),
            translator: Arc::new(TranslationOrchestrator::new(gateway, options.timeout)),
            supersede_stale: options.supersede_stale,
            next_request: AtomicU64::new(0),
            tracker: Arc::new(Mutex::new(RequestTracker::default())),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// 按配置创建 Provider、Gateway 和会话
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(providers::create_gateway(config)),
            SessionOptions::from_config(config),
        )
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    /// 提交一条消息：去除首尾空白，追加到存储并在后台启动识别
    pub fn submit(&self, text: &str) -> Result<MessageId, RequestError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RequestError::EmptyInput);
        }

        self.enqueue(ChatMessage::new(text))
    }

    /// 追加消息并启动识别
    fn enqueue(&self, message: ChatMessage) -> Result<MessageId, RequestError> {
        let id = message.id;
        self.store.append(message).inspect_err(|e| warn!("追加消息失败: {}", e))?;

        let store = self.store.clone();
        let detector = self.detector.clone();
        self.track(tokio::spawn(async move {
            detector.detect_message(&store, id).await;
        }));
        Ok(id)
    }

    /// 为一条已识别成功的消息发起翻译，返回请求号
    pub fn request_translation(
        &self,
        id: MessageId,
        target: TargetLanguage,
    ) -> Result<u64, RequestError> {
        let message = self.store.get(id).ok_or(RequestError::NotFound)?;
        let source = match message.status.language_detection {
            DetectionStatus::Pending => return Err(RequestError::DetectionPending),
            DetectionStatus::Error { error } => {
                return Err(RequestError::DetectionFailed(error.message().to_string()))
            }
            DetectionStatus::Success {
                detected_language, ..
            } => detected_language,
        };
        if target.matches(&source) {
            debug!("消息 {} 已是 {}，不发起翻译", id, target);
            return Err(RequestError::SameLanguage(target));
        }

        let request_id = self.next_request.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.tracker).start(id, request_id, target);
        debug!("请求 #{}: 消息 {} {}→{}", request_id, id, source, target);

        let store = self.store.clone();
        let translator = self.translator.clone();
        let tracker = self.tracker.clone();
        let supersede_stale = self.supersede_stale;
        self.track(tokio::spawn(async move {
            let keep_tracker = tracker.clone();
            let keep = move |_: &TranslationAttempt| {
                let mut t = lock(&keep_tracker);
                t.finish(id, request_id);
                !supersede_stale || t.is_latest(id, request_id)
            };
            translator
                .translate_message(&store, id, request_id, &source, target, keep)
                .await;
            lock(&tracker).finish(id, request_id);
        }));
        Ok(request_id)
    }

    /// 翻译控件状态：识别成功前禁用
    pub fn translation_control(&self, id: MessageId) -> TranslationControl {
        let Some(message) = self.store.get(id) else {
            return TranslationControl::Hidden;
        };
        match message.status.language_detection {
            DetectionStatus::Pending => TranslationControl::Disabled {
                reason: "detecting language…".to_string(),
            },
            DetectionStatus::Error { error } => TranslationControl::Disabled {
                reason: error.message().to_string(),
            },
            DetectionStatus::Success {
                detected_language, ..
            } => TranslationControl::Enabled {
                options: TargetLanguage::ALL
                    .into_iter()
                    .filter(|t| !t.matches(&detected_language))
                    .collect(),
                source: detected_language,
            },
        }
    }

    /// 消息进行中的翻译目标（按发起顺序）
    pub fn in_flight(&self, id: MessageId) -> Vec<TargetLanguage> {
        lock(&self.tracker)
            .in_flight
            .get(&id)
            .map(|pending| pending.iter().map(|(_, t)| *t).collect())
            .unwrap_or_default()
    }

    /// 等待所有后台任务结束
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *lock(&self.tasks));
            if handles.is_empty() {
                break;
            }
            for result in futures_util::future::join_all(handles).await {
                if let Err(e) = result {
                    warn!("后台任务异常退出: {}", e);
                }
            }
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = lock(&self.tasks);
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }
}
