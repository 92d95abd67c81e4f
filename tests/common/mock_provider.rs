// 每个集成测试文件只使用 MockProvider 的部分方法，dead_code 为预期行为
#![allow(dead_code)]

//! 测试专用 MockProvider
//!
//! 实现 CapabilityProvider trait，按预设脚本返回可用性、识别候选和译文。
//! 每个目标语言可挂一个 `Notify` 闸门，测试用它控制翻译的完成顺序。
//!
//! # 使用示例
//!
//! ```rust
//! let mock = MockProvider::new()
//!     .detects("en", 0.98)
//!     .translation("fr", "Bonjour Mademoiselle Johnson");
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::eyre::{bail, Result};
use tokio::sync::Notify;

use lingochat::providers::{
    Availability, CapabilityProvider, DetectionCandidate, DetectorSession, DownloadProgress,
    ProgressMonitor, TranslatorSession,
};

/// 调用计数
#[derive(Default)]
pub struct Calls {
    pub create_detector: AtomicUsize,
    pub detect: AtomicUsize,
    pub create_translator: AtomicUsize,
    pub translate: AtomicUsize,
    pub ready: AtomicUsize,
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[derive(Clone)]
enum Script<T> {
    Ok(T),
    Fail(String),
}

pub struct MockProvider {
    reachable: bool,
    detector: Availability,
    detection: Script<Vec<DetectionCandidate>>,
    detect_gate: Option<Arc<Notify>>,
    pairs: HashMap<(String, String), Availability>,
    default_pair: Availability,
    translations: HashMap<String, Script<String>>,
    gates: HashMap<String, Arc<Notify>>,
    create_failures: Arc<AtomicUsize>,
    ready_delay: Option<Duration>,
    pub calls: Arc<Calls>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// 默认：识别为 en (0.98)，所有语言对 Ready，译文为 "<target>:<text>"
    pub fn new() -> Self {
        Self {
            reachable: true,
            detector: Availability::Ready,
            detection: Script::Ok(vec![DetectionCandidate {
                detected_language: "en".to_string(),
                confidence: 0.98,
            }]),
            detect_gate: None,
            pairs: HashMap::new(),
            default_pair: Availability::Ready,
            translations: HashMap::new(),
            gates: HashMap::new(),
            create_failures: Arc::new(AtomicUsize::new(0)),
            ready_delay: None,
            calls: Arc::new(Calls::default()),
        }
    }

    /// 可用性查询直接报错（模拟 Provider 不存在）
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn detector(mut self, availability: Availability) -> Self {
        self.detector = availability;
        self
    }

    pub fn detects(mut self, lang: &str, confidence: f64) -> Self {
        self.detection = Script::Ok(vec![DetectionCandidate {
            detected_language: lang.to_string(),
            confidence,
        }]);
        self
    }

    pub fn candidates(mut self, candidates: Vec<DetectionCandidate>) -> Self {
        self.detection = Script::Ok(candidates);
        self
    }

    pub fn detect_fails(mut self, message: &str) -> Self {
        self.detection = Script::Fail(message.to_string());
        self
    }

    /// 识别调用在闸门放行前一直挂起
    pub fn detect_gate(mut self, gate: Arc<Notify>) -> Self {
        self.detect_gate = Some(gate);
        self
    }

    pub fn pair(mut self, source: &str, target: &str, availability: Availability) -> Self {
        self.pairs
            .insert((source.to_string(), target.to_string()), availability);
        self
    }

    pub fn all_pairs(mut self, availability: Availability) -> Self {
        self.default_pair = availability;
        self
    }

    pub fn translation(mut self, target: &str, text: &str) -> Self {
        self.translations
            .insert(target.to_string(), Script::Ok(text.to_string()));
        self
    }

    pub fn translate_fails(mut self, target: &str, message: &str) -> Self {
        self.translations
            .insert(target.to_string(), Script::Fail(message.to_string()));
        self
    }

    /// 到该目标语言的翻译在闸门放行前一直挂起
    pub fn gate(mut self, target: &str, gate: Arc<Notify>) -> Self {
        self.gates.insert(target.to_string(), gate);
        self
    }

    /// 会话的 ready() 延迟返回（模拟模型下载耗时）
    pub fn ready_after(mut self, delay: Duration) -> Self {
        self.ready_delay = Some(delay);
        self
    }

    /// 前 n 次创建会话失败
    pub fn fail_creates(self, n: usize) -> Self {
        self.create_failures.store(n, Ordering::SeqCst);
        self
    }

    fn check_reachable(&self) -> Result<()> {
        if !self.reachable {
            bail!("mock provider is not installed");
        }
        Ok(())
    }

    fn take_create_failure(&self) -> bool {
        self.create_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn report_download(monitor: Option<ProgressMonitor>) {
    if let Some(monitor) = monitor {
        monitor(DownloadProgress {
            loaded: 512,
            total: 1024,
        });
        monitor(DownloadProgress {
            loaded: 1024,
            total: 1024,
        });
    }
}

#[async_trait]
impl CapabilityProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn detector_availability(&self) -> Result<Availability> {
        self.check_reachable()?;
        Ok(self.detector)
    }

    async fn create_detector(
        &self,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn DetectorSession>> {
        self.calls.create_detector.fetch_add(1, Ordering::SeqCst);
        if self.take_create_failure() {
            bail!("mock detector creation failed");
        }
        report_download(monitor);
        Ok(Box::new(MockDetector {
            script: self.detection.clone(),
            gate: self.detect_gate.clone(),
            ready_delay: self.ready_delay,
            calls: self.calls.clone(),
        }))
    }

    async fn translator_availability(&self, source: &str, target: &str) -> Result<Availability> {
        self.check_reachable()?;
        Ok(self
            .pairs
            .get(&(source.to_string(), target.to_string()))
            .copied()
            .unwrap_or(self.default_pair))
    }

    async fn create_translator(
        &self,
        _source: &str,
        target: &str,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn TranslatorSession>> {
        self.calls.create_translator.fetch_add(1, Ordering::SeqCst);
        if self.take_create_failure() {
            bail!("mock translator creation failed");
        }
        report_download(monitor);
        Ok(Box::new(MockTranslator {
            target: target.to_string(),
            script: self.translations.get(target).cloned(),
            gate: self.gates.get(target).cloned(),
            ready_delay: self.ready_delay,
            calls: self.calls.clone(),
        }))
    }
}

struct MockDetector {
    script: Script<Vec<DetectionCandidate>>,
    gate: Option<Arc<Notify>>,
    ready_delay: Option<Duration>,
    calls: Arc<Calls>,
}

#[async_trait]
impl DetectorSession for MockDetector {
    async fn ready(&self) -> Result<()> {
        self.calls.ready.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.ready_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn detect(&self, _text: &str) -> Result<Vec<DetectionCandidate>> {
        self.calls.detect.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.script {
            Script::Ok(candidates) => Ok(candidates.clone()),
            Script::Fail(message) => bail!("{}", message),
        }
    }
}

struct MockTranslator {
    target: String,
    script: Option<Script<String>>,
    gate: Option<Arc<Notify>>,
    ready_delay: Option<Duration>,
    calls: Arc<Calls>,
}

#[async_trait]
impl TranslatorSession for MockTranslator {
    async fn ready(&self) -> Result<()> {
        self.calls.ready.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.ready_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn translate(&self, text: &str) -> Result<String> {
        self.calls.translate.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.script {
            Some(Script::Ok(out)) => Ok(out.clone()),
            Some(Script::Fail(message)) => bail!("{}", message),
            None => Ok(format!("{}:{}", self.target, text)),
        }
    }
}
