use serde::{Deserialize, Serialize};

/// 消息状态中记录的错误
///
/// 所有识别/翻译失败都在编排层转换为该类型并写入消息状态，
/// 不会抛给展示层。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ChatError {
    /// 设备/Provider 不支持该能力
    #[error("{0}")]
    CapabilityUnavailable(String),
    /// 下载或会话初始化失败
    #[error("{0}")]
    InitializationFailure(String),
    /// 没有可处理的文本
    #[error("{0}")]
    EmptyInput(String),
    /// detect/translate 调用失败或没有可用结果
    #[error("{0}")]
    OperationFailure(String),
}

impl ChatError {
    /// 人类可读的错误信息
    pub fn message(&self) -> &str {
        match self {
            Self::CapabilityUnavailable(m)
            | Self::InitializationFailure(m)
            | Self::EmptyInput(m)
            | Self::OperationFailure(m) => m,
        }
    }

    /// 错误类别标识（日志和 JSON 输出用）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapabilityUnavailable(_) => "capability_unavailable",
            Self::InitializationFailure(_) => "initialization_failure",
            Self::EmptyInput(_) => "empty_input",
            Self::OperationFailure(_) => "operation_failure",
        }
    }

    /// 保留错误类别，替换错误信息
    pub fn with_message(&self, message: impl Into<String>) -> Self {
        let message = message.into();
        match self {
            Self::CapabilityUnavailable(_) => Self::CapabilityUnavailable(message),
            Self::InitializationFailure(_) => Self::InitializationFailure(message),
            Self::EmptyInput(_) => Self::EmptyInput(message),
            Self::OperationFailure(_) => Self::OperationFailure(message),
        }
    }
}
