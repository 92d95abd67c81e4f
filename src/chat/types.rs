use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChatError;
use crate::i18n::TargetLanguage;

/// 消息 ID（提交时生成，消息存活期内不变，不复用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 语言识别状态：`Pending` → `Success | Error`，只转换一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionStatus {
    Pending,
    Success {
        detected_language: String,
        confidence: f64,
    },
    Error {
        error: ChatError,
    },
}

impl DetectionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// 识别成功时返回语言标签
    pub fn detected_language(&self) -> Option<&str> {
        match self {
            Self::Success {
                detected_language, ..
            } => Some(detected_language),
            _ => None,
        }
    }

    pub fn error(error: ChatError) -> Self {
        Self::Error { error }
    }

    /// 识别失败时返回错误
    pub fn failure(&self) -> Option<&ChatError> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// 翻译尝试的状态。`Pending` 只用于展示进行中的请求，不会存入历史
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Success,
    Error,
}

/// 翻译结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success { text: String },
    Error { error: ChatError },
}

/// 一次已完成的翻译请求，永久保留在消息的翻译历史中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationAttempt {
    pub request_id: u64,
    /// 发起请求时消息的识别语言
    pub source_language: String,
    pub target_language: TargetLanguage,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub completed_at: DateTime<Utc>,
}

impl TranslationAttempt {
    pub fn success(
        request_id: u64,
        source_language: impl Into<String>,
        target_language: TargetLanguage,
        text: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            source_language: source_language.into(),
            target_language,
            outcome: AttemptOutcome::Success { text: text.into() },
            completed_at: Utc::now(),
        }
    }

    pub fn failure(
        request_id: u64,
        source_language: impl Into<String>,
        target_language: TargetLanguage,
        error: ChatError,
    ) -> Self {
        Self {
            request_id,
            source_language: source_language.into(),
            target_language,
            outcome: AttemptOutcome::Error { error },
            completed_at: Utc::now(),
        }
    }

    pub fn status(&self) -> AttemptStatus {
        match self.outcome {
            AttemptOutcome::Success { .. } => AttemptStatus::Success,
            AttemptOutcome::Error { .. } => AttemptStatus::Error,
        }
    }

    /// 翻译文本（仅成功时存在）
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            AttemptOutcome::Success { text } => Some(text),
            AttemptOutcome::Error { .. } => None,
        }
    }

    /// 错误信息（仅失败时存在）
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            AttemptOutcome::Success { .. } => None,
            AttemptOutcome::Error { error } => Some(error.message()),
        }
    }
}

/// 消息的嵌套状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStatus {
    pub language_detection: DetectionStatus,
    /// 按完成顺序追加，只增不改
    pub translations: Vec<TranslationAttempt>,
}

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub status: MessageStatus,
}

impl ChatMessage {
    /// 新消息：识别状态为 pending，翻译历史为空。
    /// 文本应已去除首尾空白且非空（由 [`ChatSession::submit`](super::ChatSession::submit) 保证）
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            created_at: Utc::now(),
            status: MessageStatus {
                language_detection: DetectionStatus::Pending,
                translations: Vec::new(),
            },
        }
    }

    pub fn detected_language(&self) -> Option<&str> {
        self.status.language_detection.detected_language()
    }
}
