//! Confab application binary, composition root.
//!
//! Ties together the Confab crates into a single interactive executable:
//! 1. Load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the controller with the stub responder, the mock speech
//!    provider, and an in-memory blob store
//! 4. Run a line-oriented REPL that forwards gestures to the controller
//!
//! The REPL stands in for the presentation layer: it only reads controller
//! state and forwards gestures, exactly like a rendering host would.

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use confab_chat::{BlobStore, ChatController, MemoryBlobStore, StubResponder};
use confab_core::config::ConfabConfig;
use confab_core::types::{FileUpload, Message};
use confab_speech::{MockSpeechProvider, SpeechEvent, SpeechProvider};

use cli::CliArgs;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config_path = args.resolve_config_path();
    let config = ConfabConfig::load_or_default(&config_path);

    let log_level = args.resolve_log_level(&config.general.log_level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let speech_enabled = !args.no_speech && config.speech.enabled;
    let provider: Arc<dyn SpeechProvider> = Arc::new(MockSpeechProvider::new(speech_enabled));
    let responder = Arc::new(StubResponder::new(Duration::from_millis(
        config.chat.stub_responder_delay_ms,
    )));
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let controller = Arc::new(ChatController::new(&config, responder, provider, blobs));

    // Log controller events as they happen; the REPL itself only reads
    // state snapshots.
    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(event = event.event_name(), "Controller event");
        }
    });

    print_conversation(&controller.messages());
    print_help(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(path) = line.strip_prefix("/attach ") {
            attach(&controller, path.trim());
        } else if let Some(tag) = line.strip_prefix("/lang ") {
            let tag = tag.trim();
            if controller.select_language(tag) {
                println!("Language set to {}", tag);
            } else {
                let tags: Vec<_> = controller
                    .languages()
                    .iter()
                    .map(|l| l.locale_tag.as_str())
                    .collect();
                println!("Unknown locale tag {} (try: {})", tag, tags.join(", "));
            }
        } else if let Some(text) = line.strip_prefix("/say ") {
            // Simulates a cumulative transcript event from the provider.
            controller.on_speech_event(&SpeechEvent::Transcript {
                cumulative_text: text.to_string(),
                is_final: true,
            });
            println!("Staged text: {:?}", controller.staged_text());
        } else {
            match line.as_str() {
                "/quit" | "/exit" => break,
                "/listen" => {
                    controller.start_listening();
                    if controller.is_listening() {
                        println!(
                            "Listening ({})... use /say <text> to simulate speech",
                            controller.active_speech_locale().unwrap_or_default()
                        );
                    } else {
                        println!("Speech capture is not available");
                    }
                }
                "/stop" => {
                    controller.stop_listening();
                    println!("Staged text: {:?}", controller.staged_text());
                }
                "/messages" => print_conversation(&controller.messages()),
                "/help" => print_help(&controller),
                text => {
                    controller.set_text(text);
                    controller.submit().await;
                    print_last_turn(&controller.messages());
                }
            }
        }
    }

    controller.shutdown();
}

/// Read a file from disk and stage it as the pending attachment.
fn attach(controller: &ChatController, path: &str) {
    match std::fs::read(path) {
        Ok(bytes) => {
            let name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string());
            let mime = infer_mime(&name);
            controller.attach_file(&FileUpload::new(name.clone(), mime, bytes));
            println!("Staged attachment: {}", name);
        }
        Err(e) => println!("Could not read {}: {}", path, e),
    }
}

/// Best-effort MIME type from the file extension.
fn infer_mime(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn print_conversation(messages: &[Message]) {
    for message in messages {
        print_message(message);
    }
}

/// Print the user turn and reply appended by the latest round trip.
fn print_last_turn(messages: &[Message]) {
    for message in messages.iter().rev().take(2).rev() {
        print_message(message);
    }
}

fn print_message(message: &Message) {
    let who = if message.is_user() { "you" } else { "bot" };
    match &message.attachment {
        Some(attachment) => println!(
            "{:>3} {}> {} [{}]",
            message.id, who, message.text, attachment.name
        ),
        None => println!("{:>3} {}> {}", message.id, who, message.text),
    }
}

fn print_help(controller: &ChatController) {
    let current = controller.selected_language().locale_tag;
    println!();
    println!("Type a message and press enter to send it.");
    println!("  /attach <path>   stage a file as the pending attachment");
    println!("  /lang <tag>      select a language (current: {})", current);
    if controller.speech_available() {
        println!("  /listen          start a speech session");
        println!("  /say <text>      simulate a cumulative transcript event");
        println!("  /stop            stop the speech session");
    }
    println!("  /messages        reprint the conversation");
    println!("  /quit            exit");
    println!();
}
