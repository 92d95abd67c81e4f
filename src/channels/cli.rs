use std::sync::Arc;

use color_eyre::eyre::{eyre, Context, Result};
use reedline::{DefaultPrompt, DefaultPromptSegment, ExternalPrinter, Reedline, Signal};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::render;
use crate::chat::{ChatSession, MessageId, StoreEvent};
use crate::i18n::TargetLanguage;

/// 渲染会话中的一条消息
fn render_by_id(session: &ChatSession, id: MessageId) -> Option<String> {
    let store = session.store();
    let number = store.position(id)? + 1;
    let message = store.get(id)?;
    Some(render::render_message(
        number,
        &message,
        &session.in_flight(id),
        &session.translation_control(id),
    ))
}

/// 将存储事件转换为要打印的文本
fn render_event(session: &ChatSession, event: &StoreEvent) -> Option<String> {
    match event {
        StoreEvent::MessageAppended { id, .. } | StoreEvent::DetectionUpdated { id } => {
            render_by_id(session, *id)
        }
        StoreEvent::TranslationAppended { id, position } => {
            let store = session.store();
            let number = store.position(*id)? + 1;
            let message = store.get(*id)?;
            let attempt = message.status.translations.get(*position)?;
            Some(format!("[{}] {}", number, render::render_attempt(attempt)))
        }
    }
}

/// 监听存储事件，通过 reedline 的外部打印器输出（不打断正在输入的行）
async fn watch_store(session: Arc<ChatSession>, printer: ExternalPrinter<String>) {
    let mut rx = session.store().subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(text) = render_event(&session, &event) {
                    if printer.print(text).is_err() {
                        debug!("外部打印器已关闭");
                        break;
                    }
                }
            }
            Err(RecvError::Lagged(n)) => warn!("渲染落后，跳过 {} 个事件", n),
            Err(RecvError::Closed) => break,
        }
    }
}

/// 运行 CLI REPL 交互循环
pub async fn run_repl(session: Arc<ChatSession>) -> Result<()> {
    let printer = ExternalPrinter::<String>::default();
    let watcher = tokio::spawn(watch_store(session.clone(), printer.clone()));

    let mut line_editor = Reedline::create().with_external_printer(printer);
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("lingochat".to_string()),
        DefaultPromptSegment::Empty,
    );

    println!("lingochat (type a message, /help for commands, exit to quit)");
    println!();

    loop {
        let sig = line_editor.read_line(&prompt);
        match sig {
            Ok(Signal::Success(line)) => {
                let input = line.trim();

                if input.is_empty() {
                    println!("Empty field. Fill something in");
                    continue;
                }

                match input {
                    "exit" | "quit" => {
                        println!("Bye!");
                        break;
                    }
                    "clear" => {
                        line_editor.clear_scrollback().wrap_err("清屏失败")?;
                        continue;
                    }
                    _ => {}
                }

                // 斜杠命令
                if let Some(cmd) = input.strip_prefix('/') {
                    handle_slash_command(cmd, &session);
                    continue;
                }

                match session.submit(input) {
                    Ok(id) => info!("提交消息 {}", id),
                    Err(e) => println!("{}", e),
                }
            }
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                println!("\nBye!");
                break;
            }
            Err(e) => {
                eprintln!("输入错误: {}", e);
                break;
            }
        }
    }

    watcher.abort();
    Ok(())
}

/// 处理斜杠命令
fn handle_slash_command(cmd: &str, session: &ChatSession) {
    let mut parts = cmd.split_whitespace();
    let name = parts.next().unwrap_or("");

    match name {
        "help" | "h" => print_help(),
        "list" | "ls" => {
            let store = session.store();
            if store.is_empty() {
                println!("(no messages yet)");
            }
            for message in store.snapshot() {
                if let Some(text) = render_by_id(session, message.id) {
                    println!("{}", text);
                }
            }
        }
        "langs" => println!("{}", render::render_languages()),
        "t" | "translate" => {
            let args: Vec<&str> = parts.collect();
            if let Err(e) = translate_command(session, &args) {
                println!("{}", e);
            }
        }
        "export" => match serde_json::to_string_pretty(&session.store().snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("export failed: {}", e),
        },
        _ => println!("unknown command: /{} (see /help)", name),
    }
}

/// `/t <n> <lang>`
fn translate_command(session: &ChatSession, args: &[&str]) -> Result<()> {
    let [number, lang] = args else {
        return Err(eyre!("usage: /t <message number> <en|pt|es|ru|tr|fr>"));
    };
    let number: usize = number
        .parse()
        .map_err(|_| eyre!("invalid message number: {}", number))?;
    let target: TargetLanguage = lang.parse()?;

    let message = number
        .checked_sub(1)
        .and_then(|i| session.store().get_by_index(i))
        .ok_or_else(|| eyre!("no message #{}", number))?;

    session.request_translation(message.id, target)?;
    println!("[{}] … translating to {}", number, target.display_name());
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <text>               send a message (language is detected automatically)");
    println!("  /t <n> <lang>        translate message n (see /langs)");
    println!("  /list                show all messages");
    println!("  /langs               list target languages");
    println!("  /export              print the conversation as JSON");
    println!("  clear                clear the screen");
    println!("  exit | quit          leave");
}

/// 单次识别：提交、等待结果、打印
pub async fn run_detect(session: &ChatSession, text: &str, json: bool) -> Result<()> {
    let id = session.submit(text)?;
    session.settle().await;
    print_message(session, id, json)
}

/// 单次翻译：识别完成后翻译到目标语言
pub async fn run_translate(
    session: &ChatSession,
    text: &str,
    target: TargetLanguage,
    json: bool,
) -> Result<()> {
    let id = session.submit(text)?;
    session.settle().await;

    match session.request_translation(id, target) {
        Ok(request_id) => {
            debug!("请求 #{} 已发起", request_id);
            session.settle().await;
        }
        Err(e) => warn!("未发起翻译: {}", e),
    }
    print_message(session, id, json)
}

fn print_message(session: &ChatSession, id: MessageId, json: bool) -> Result<()> {
    let message = session
        .store()
        .get(id)
        .ok_or_else(|| eyre!("message {} disappeared", id))?;
    if json {
        let out = serde_json::to_string_pretty(&message).wrap_err("序列化消息失败")?;
        println!("{}", out);
    } else if let Some(text) = render_by_id(session, id) {
        println!("{}", text);
    }
    Ok(())
}
