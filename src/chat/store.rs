//! 消息存储
//!
//! 所有消息及其状态的唯一数据源。识别/翻译编排器和输入组件只能通过
//! 按 ID 的增量接口修改它，不能整体替换其他消息的状态。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;

use super::types::{ChatMessage, DetectionStatus, MessageId, TranslationAttempt};

/// 事件通道容量；订阅方落后太多时收到 Lagged，不会阻塞写入
const EVENT_CAPACITY: usize = 256;

/// 存储变更事件（展示层据此重新渲染）
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    MessageAppended { id: MessageId, index: usize },
    DetectionUpdated { id: MessageId },
    TranslationAppended { id: MessageId, position: usize },
}

impl StoreEvent {
    pub fn id(&self) -> MessageId {
        match self {
            Self::MessageAppended { id, .. }
            | Self::DetectionUpdated { id }
            | Self::TranslationAppended { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("message {0} not found")]
    NotFound(MessageId),
    #[error("message {0} already exists")]
    DuplicateId(MessageId),
    #[error("language detection for message {0} has already resolved")]
    DetectionAlreadyResolved(MessageId),
    #[error("detection status for message {0} must be terminal")]
    PendingDetection(MessageId),
}

#[derive(Default)]
struct Inner {
    messages: Vec<ChatMessage>,
    index: HashMap<MessageId, usize>,
}

pub struct MessageStore {
    inner: Mutex<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // 锁内只有同步的字段更新，不会 panic 到一半；中毒时沿用内部数据
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: StoreEvent) {
        // 没有订阅者时 send 返回 Err，属正常情况
        let _ = self.events.send(event);
    }

    /// 订阅变更事件
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// 追加新消息，返回其序号
    pub fn append(&self, message: ChatMessage) -> Result<usize, StoreError> {
        let id = message.id;
        let index = {
            let mut inner = self.lock();
            if inner.index.contains_key(&id) {
                return Err(StoreError::DuplicateId(id));
            }
            let index = inner.messages.len();
            inner.messages.push(message);
            inner.index.insert(id, index);
            index
        };
        debug!("消息 {} 已追加 (#{})", id, index + 1);
        self.emit(StoreEvent::MessageAppended { id, index });
        Ok(index)
    }

    /// 写入识别结果。只允许 pending → 终态一次
    pub fn update_detection(&self, id: MessageId, status: DetectionStatus) -> Result<(), StoreError> {
        if status.is_pending() {
            return Err(StoreError::PendingDetection(id));
        }
        {
            let mut inner = self.lock();
            let message = find_mut(&mut inner, id)?;
            if message.status.language_detection.is_terminal() {
                return Err(StoreError::DetectionAlreadyResolved(id));
            }
            message.status.language_detection = status;
        }
        self.emit(StoreEvent::DetectionUpdated { id });
        Ok(())
    }

    /// 追加翻译结果到历史末尾，返回其位置
    pub fn append_translation(
        &self,
        id: MessageId,
        attempt: TranslationAttempt,
    ) -> Result<usize, StoreError> {
        let position = {
            let mut inner = self.lock();
            let message = find_mut(&mut inner, id)?;
            message.status.translations.push(attempt);
            message.status.translations.len() - 1
        };
        self.emit(StoreEvent::TranslationAppended { id, position });
        Ok(position)
    }

    /// 消息快照
    pub fn get(&self, id: MessageId) -> Option<ChatMessage> {
        let inner = self.lock();
        inner.index.get(&id).map(|&i| inner.messages[i].clone())
    }

    /// 消息在列表中的序号（从 0 开始）
    pub fn position(&self, id: MessageId) -> Option<usize> {
        self.lock().index.get(&id).copied()
    }

    /// 按序号取消息快照
    pub fn get_by_index(&self, index: usize) -> Option<ChatMessage> {
        self.lock().messages.get(index).cloned()
    }

    /// 全部消息快照（按提交顺序）
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn find_mut(inner: &mut Inner, id: MessageId) -> Result<&mut ChatMessage, StoreError> {
    let index = *inner.index.get(&id).ok_or(StoreError::NotFound(id))?;
    Ok(&mut inner.messages[index])
}
