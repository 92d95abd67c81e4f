use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::eyre::{eyre, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::i18n;

use super::traits::{
    Availability, CapabilityProvider, DetectionCandidate, DetectorSession, ProgressMonitor,
    TranslatorSession,
};

const DETECT_SYSTEM_PROMPT: &str = "You identify the language of the user's message. \
Reply with a JSON array only, best guess first, for example \
[{\"language\":\"en\",\"confidence\":0.98}]. Use ISO 639-1 codes and confidences between 0 and 1.";

/// OpenAI 兼容协议的能力 Provider（GLM/MiniMax/DeepSeek/GPT）
///
/// 模型托管在远端，无需下载：可用即 `readily`。
pub struct CompatibleProvider {
    client: Arc<CompletionClient>,
}

impl CompatibleProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: Arc::new(CompletionClient {
                http: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                temperature: config.temperature,
            }),
        }
    }
}

/// 语言对是否可翻译：两端都是已知的 ISO 639-1 代码且不相同
fn pair_supported(source: &str, target: &str) -> bool {
    let known = |tag: &str| i18n::lookup(tag).and_then(|l| l.to_639_1()).is_some();
    known(source) && known(target) && i18n::normalize_tag(source) != i18n::normalize_tag(target)
}

#[async_trait]
impl CapabilityProvider for CompatibleProvider {
    fn name(&self) -> &str {
        "compatible"
    }

    async fn detector_availability(&self) -> Result<Availability> {
        if self.client.api_key.trim().is_empty() {
            debug!("未配置 API Key，语言识别不可用");
            return Ok(Availability::Unavailable);
        }
        Ok(Availability::Ready)
    }

    async fn create_detector(
        &self,
        _monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn DetectorSession>> {
        Ok(Box::new(CompatibleDetector {
            client: self.client.clone(),
        }))
    }

    async fn translator_availability(&self, source: &str, target: &str) -> Result<Availability> {
        if self.client.api_key.trim().is_empty() || !pair_supported(source, target) {
            return Ok(Availability::Unavailable);
        }
        Ok(Availability::Ready)
    }

    async fn create_translator(
        &self,
        source: &str,
        target: &str,
        _monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn TranslatorSession>> {
        Ok(Box::new(CompatibleTranslator {
            client: self.client.clone(),
            source: source.to_string(),
            target: target.to_string(),
        }))
    }
}

/// chat/completions 客户端（会话间共享连接池）
struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl CompletionClient {
    /// 构造请求 URL
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// 发送请求，返回第一个 choice 的文本
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let resp = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .wrap_err("发送请求失败")?;

        let status = resp.status();
        let resp_text = resp.text().await.wrap_err("读取响应失败")?;

        if !status.is_success() {
            return Err(eyre!("API 请求失败 ({}): {}", status, resp_text));
        }

        let parsed: OpenAIResponse =
            serde_json::from_str(&resp_text).wrap_err("解析响应 JSON 失败")?;
        first_content(&parsed).ok_or_else(|| eyre!("响应中没有文本内容"))
    }
}

struct CompatibleDetector {
    client: Arc<CompletionClient>,
}

#[async_trait]
impl DetectorSession for CompatibleDetector {
    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>> {
        let content = self.client.complete(DETECT_SYSTEM_PROMPT, text).await?;
        parse_candidates(&content)
    }
}

struct CompatibleTranslator {
    client: Arc<CompletionClient>,
    source: String,
    target: String,
}

impl CompatibleTranslator {
    fn system_prompt(&self) -> String {
        format!(
            "Translate the user's message from {} to {}. Reply with the translation only, \
             without quotes or explanations.",
            i18n::display_name(&self.source),
            i18n::display_name(&self.target)
        )
    }
}

#[async_trait]
impl TranslatorSession for CompatibleTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let content = self.client.complete(&self.system_prompt(), text).await?;
        Ok(content.trim().to_string())
    }
}

/// 去掉模型偶尔附带的 ```json 代码块围栏
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// 解析识别结果，按置信度降序
fn parse_candidates(content: &str) -> Result<Vec<DetectionCandidate>> {
    let raw: Vec<RawCandidate> = serde_json::from_str(strip_fences(content))
        .wrap_err_with(|| format!("无法解析识别结果: {}", content))?;

    let mut candidates: Vec<DetectionCandidate> = raw
        .into_iter()
        .filter(|c| !c.language.trim().is_empty())
        .map(|c| DetectionCandidate {
            detected_language: i18n::normalize_tag(&c.language),
            confidence: c.confidence,
        })
        .collect();
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(candidates)
}

fn first_content(body: &OpenAIResponse) -> Option<String> {
    body.choices
        .first()
        .and_then(|c| c.message.content.clone())
}

// --- 响应结构体（仅用于反序列化）---

#[derive(Debug, Deserialize)]
struct RawCandidate {
    language: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}
