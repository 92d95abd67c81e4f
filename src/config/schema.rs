use std::path::PathBuf;

use color_eyre::eyre::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 全局配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

/// 能力后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI 兼容的远端模型（识别 + 翻译）
    #[default]
    Compatible,
    /// 本机识别，不支持翻译
    Local,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compatible => "compatible",
            Self::Local => "local",
        }
    }
}

/// 默认设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultConfig {
    #[serde(default)]
    pub backend: Backend,
}

/// compatible 后端的连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub temperature: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            temperature: 0.0,
        }
    }
}

/// 翻译请求行为
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// 同一条消息重新选择目标语言时，丢弃尚未完成的旧请求结果。
    /// 默认 false：所有结果都保留在翻译历史中
    #[serde(default)]
    pub supersede_stale: bool,
    /// 单次识别/翻译请求超时（秒），0 = 不限制
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            supersede_stale: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// 可靠性配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// 会话初始化最大重试次数，默认 2
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// 初始退避毫秒，默认 200
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_max_retries() -> usize {
    2
}

fn default_initial_backoff_ms() -> u64 {
    200
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// 默认配置 TOML 模板
pub(crate) const DEFAULT_CONFIG_TOML: &str = r#"[default]
backend = "compatible"   # "compatible"（远端模型）或 "local"（本机识别，不支持翻译）

[provider]
base_url = "https://api.deepseek.com/v1"
api_key = ""             # 填入你的 API Key
model = "deepseek-chat"
temperature = 0.0

[translation]
supersede_stale = false  # true = 重新选择目标语言时丢弃旧请求的结果
request_timeout_secs = 30

# 可靠性配置（可选）
# [reliability]
# max_retries = 2
# initial_backoff_ms = 200
"#;

impl Config {
    /// 返回配置文件路径: `~/.lingochat/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// `~/.lingochat/`
    pub fn home_dir() -> Result<PathBuf> {
        let base_dirs = directories::BaseDirs::new()
            .ok_or_else(|| color_eyre::eyre::eyre!("无法获取 home 目录"))?;
        Ok(base_dirs.home_dir().join(".lingochat"))
    }

    /// 加载配置，如果配置文件不存在则创建默认配置
    pub fn load_or_init() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).wrap_err("创建配置目录失败")?;
            }
            std::fs::write(&config_path, DEFAULT_CONFIG_TOML).wrap_err("写入默认配置失败")?;
        }

        Self::load_from_path(&config_path)
    }

    /// 从指定路径加载配置（figment 多层合并）
    ///
    /// 环境变量用 `__` 表示层级，例如 `LINGOCHAT_PROVIDER__API_KEY`。
    pub fn load_from_path(path: &std::path::Path) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("LINGOCHAT_").split("__"))
            .extract()
            .wrap_err("解析配置文件失败")?;

        Ok(config)
    }

    /// 单次请求超时；0 表示不限制
    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        match self.translation.request_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}
