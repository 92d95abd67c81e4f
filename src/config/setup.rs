use color_eyre::eyre::{Context, Result};
use dialoguer::{Confirm, Input, Password, Select};
use toml_edit::{value, DocumentMut};

use super::schema::{
    Backend, Config, DefaultConfig, ProviderConfig, ReliabilityConfig, TranslationConfig,
};

/// compatible 后端预设：(名称, base_url, 默认模型)
pub const PROVIDERS: &[(&str, &str, &str)] = &[
    ("deepseek", "https://api.deepseek.com/v1", "deepseek-chat"),
    (
        "glm",
        "https://open.bigmodel.cn/api/paas/v4",
        "glm-4-flash",
    ),
    (
        "minimax",
        "https://api.minimax.chat/v1",
        "MiniMax-Text-01",
    ),
    ("gpt", "https://api.openai.com/v1", "gpt-4o-mini"),
];

/// 运行交互式配置向导
pub fn run_setup() -> Result<()> {
    println!("🔧 lingochat 配置向导\n");

    // 1. 选择后端
    let backend_options = [
        "compatible (远端模型：识别 + 翻译)",
        "local (本机识别，不支持翻译)",
    ];
    let backend_idx = Select::new()
        .with_prompt("能力后端")
        .items(backend_options)
        .default(0)
        .interact()
        .wrap_err("选择后端失败")?;
    let backend = if backend_idx == 0 {
        Backend::Compatible
    } else {
        Backend::Local
    };
    println!();

    let provider = if backend == Backend::Compatible {
        prompt_provider()?
    } else {
        ProviderConfig::default()
    };

    // 最后：重复选择目标语言时的行为
    let supersede_stale = Confirm::new()
        .with_prompt("重新选择目标语言时丢弃未完成的旧翻译？")
        .default(false)
        .interact()
        .wrap_err("输入失败")?;
    println!();

    let config = Config {
        default: DefaultConfig { backend },
        provider,
        translation: TranslationConfig {
            supersede_stale,
            ..TranslationConfig::default()
        },
        reliability: ReliabilityConfig::default(),
    };

    // 写入配置文件
    let config_path = Config::config_path()?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).wrap_err("创建配置目录失败")?;
    }
    std::fs::write(&config_path, toml_from_config(&config)).wrap_err("写入配置文件失败")?;

    println!("✅ 配置已保存到: {}", config_path.display());
    Ok(())
}

fn prompt_provider() -> Result<ProviderConfig> {
    let provider_names: Vec<&str> = PROVIDERS.iter().map(|(name, _, _)| *name).collect();
    let provider_idx = Select::new()
        .with_prompt("选择模型服务")
        .items(&provider_names)
        .default(0)
        .interact()
        .wrap_err("选择 Provider 失败")?;
    let (provider_name, base_url, default_model) = PROVIDERS[provider_idx];
    println!();

    let api_key: String = Password::new()
        .with_prompt(format!("{} API Key", provider_name))
        .interact()
        .wrap_err("输入 API Key 失败")?;
    println!();

    let model: String = Input::new()
        .with_prompt("模型")
        .default(default_model.to_string())
        .interact_text()
        .wrap_err("输入模型失败")?;
    println!();

    Ok(ProviderConfig {
        base_url: base_url.to_string(),
        api_key,
        model,
        temperature: 0.0,
    })
}

/// 将 Config 转为可读的 TOML 字符串（值由 toml_edit 负责转义）
fn toml_from_config(config: &Config) -> String {
    let mut doc = DocumentMut::new();

    doc["default"]["backend"] = value(config.default.backend.as_str());

    doc["provider"]["base_url"] = value(config.provider.base_url.as_str());
    doc["provider"]["api_key"] = value(config.provider.api_key.as_str());
    doc["provider"]["model"] = value(config.provider.model.as_str());
    doc["provider"]["temperature"] = value(config.provider.temperature);

    doc["translation"]["supersede_stale"] = value(config.translation.supersede_stale);
    doc["translation"]["request_timeout_secs"] =
        value(config.translation.request_timeout_secs as i64);

    doc["reliability"]["max_retries"] = value(config.reliability.max_retries as i64);
    doc["reliability"]["initial_backoff_ms"] =
        value(config.reliability.initial_backoff_ms as i64);

    doc.to_string()
}
