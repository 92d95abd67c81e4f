//! 纯文本渲染（不做任何 IO，便于测试）

use crate::chat::{
    AttemptOutcome, ChatMessage, DetectionStatus, TranslationAttempt, TranslationControl,
};
use crate::i18n::{self, TargetLanguage};

const INDENT: &str = "    ";

/// 识别状态一行：成功显示语言名，失败显示原始错误文本
pub fn render_detection(status: &DetectionStatus) -> String {
    match status {
        DetectionStatus::Pending => "detecting language…".to_string(),
        DetectionStatus::Success {
            detected_language,
            confidence,
        } => format!(
            "{} ({}, {:.2})",
            i18n::display_name(detected_language),
            detected_language,
            confidence
        ),
        DetectionStatus::Error { error } => error.message().to_string(),
    }
}

/// 单条翻译记录
pub fn render_attempt(attempt: &TranslationAttempt) -> String {
    match &attempt.outcome {
        AttemptOutcome::Success { text } => {
            format!("→ {}: {}", attempt.target_language.display_name(), text)
        }
        AttemptOutcome::Error { error } => format!(
            "✗ {} → {}: {}",
            attempt.source_language,
            attempt.target_language,
            error.message()
        ),
    }
}

/// 翻译控件提示，禁用时不显示
pub fn render_control(number: usize, control: &TranslationControl) -> Option<String> {
    match control {
        TranslationControl::Enabled { options, .. } if !options.is_empty() => {
            let codes: Vec<&str> = options.iter().map(|t| t.code()).collect();
            Some(format!("translate: /t {} <{}>", number, codes.join("|")))
        }
        _ => None,
    }
}

/// 完整渲染一条消息（`number` 从 1 开始）
pub fn render_message(
    number: usize,
    message: &ChatMessage,
    in_flight: &[TargetLanguage],
    control: &TranslationControl,
) -> String {
    let mut lines = vec![format!("[{}] {}", number, message.text)];
    lines.push(format!(
        "{}language: {}",
        INDENT,
        render_detection(&message.status.language_detection)
    ));
    for attempt in &message.status.translations {
        lines.push(format!("{}{}", INDENT, render_attempt(attempt)));
    }
    for target in in_flight {
        lines.push(format!("{}… translating to {}", INDENT, target.display_name()));
    }
    if let Some(hint) = render_control(number, control) {
        lines.push(format!("{}{}", INDENT, hint));
    }
    lines.join("\n")
}

/// 目标语言列表
pub fn render_languages() -> String {
    TargetLanguage::ALL
        .iter()
        .map(|t| format!("{}{}  {}", INDENT, t.code(), t.display_name()))
        .collect::<Vec<_>>()
        .join("\n")
}
