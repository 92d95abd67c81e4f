use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use lingochat::chat::ChatSession;
use lingochat::config::{Backend, Config};
use lingochat::i18n::TargetLanguage;

#[derive(Parser)]
#[command(
    name = "lingochat",
    about = "Chat with automatic language detection and on-demand translation",
    version
)]
struct Cli {
    /// 覆盖配置文件中的能力后端
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum BackendArg {
    Compatible,
    Local,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Compatible => Backend::Compatible,
            BackendArg::Local => Backend::Local,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Detect the language of a single text
    Detect {
        text: String,
        /// Print the message as JSON
        #[arg(long)]
        json: bool,
    },
    /// Detect, then translate a single text
    Translate {
        text: String,
        /// Target language: en, pt, es, ru, tr, fr
        #[arg(short, long)]
        to: TargetLanguage,
        #[arg(long)]
        json: bool,
    },
    /// 交互式配置向导
    Setup,
    /// 初始化配置文件
    Init,
    /// 显示当前配置
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let session = Arc::new(build_session(cli.backend)?);
            lingochat::channels::cli::run_repl(session).await?
        }
        Commands::Detect { text, json } => {
            let session = build_session(cli.backend)?;
            lingochat::channels::cli::run_detect(&session, &text, json).await?
        }
        Commands::Translate { text, to, json } => {
            let session = build_session(cli.backend)?;
            lingochat::channels::cli::run_translate(&session, &text, to, json).await?
        }
        Commands::Setup => lingochat::config::run_setup()?,
        Commands::Init => run_init()?,
        Commands::Config => run_config()?,
    }

    Ok(())
}

fn build_session(backend: Option<BackendArg>) -> Result<ChatSession> {
    let mut config = Config::load_or_init().wrap_err("加载配置失败")?;
    if let Some(backend) = backend {
        config.default.backend = backend.into();
    }
    tracing::info!("能力后端: {}", config.default.backend.as_str());
    Ok(ChatSession::from_config(&config))
}

fn run_init() -> Result<()> {
    let config_path = Config::config_path()?;

    if config_path.exists() {
        println!("配置文件已存在: {}", config_path.display());
        println!("如需重新初始化，请先删除该文件。");
    } else {
        let _ = Config::load_or_init()?;
        println!("已创建配置文件: {}", config_path.display());
        println!("请编辑该文件填入 API Key，或设置 backend = \"local\"。");
    }

    Ok(())
}

fn run_config() -> Result<()> {
    let config_path = Config::config_path()?;

    if !config_path.exists() {
        println!("配置文件不存在。运行 `lingochat init` 创建。");
        return Ok(());
    }

    let content = std::fs::read_to_string(&config_path).wrap_err("读取配置文件失败")?;
    println!("配置文件: {}\n", config_path.display());
    println!("{}", content);

    Ok(())
}

/// 获取日志目录: ~/.lingochat/logs/
fn log_dir() -> Result<PathBuf> {
    Ok(Config::home_dir()?.join("logs"))
}

/// 初始化 tracing: stderr 只输出 warn+，日志文件输出 debug+
fn init_tracing() -> Result<()> {
    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("创建日志目录失败: {}", log_dir.display()))?;

    // 文件日志: 按天滚动，debug 级别
    let file_appender = tracing_appender::rolling::daily(&log_dir, "lingochat.log");
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lingochat=debug")),
        );

    // stderr: 只输出 warn+（不干扰 REPL 交互）
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}
