//! Terminal front-end for [`ChatWidget`].

use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin };
use url::Url;

use crate::cli::ChatArgs;
use crate::format::render_message_ansi;
use crate::history::create_history_store;
use crate::models::chat::Sender;
use crate::widget::{ ChatWidget, HttpRelayTransport, TranscriptEntry, WidgetError };

const RED: (&str, &str) = ("\x1b[31m", "\x1b[39m");
const DIM: (&str, &str) = ("\x1b[2m", "\x1b[22m");

const CLEAR_COMMAND: &str = "/clear";
const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

/// Formats one transcript entry for the terminal.
pub fn format_entry(entry: &TranscriptEntry) -> String {
    match entry {
        TranscriptEntry::Message { message, .. } =>
            match message.sender {
                Sender::User => format!("you> {}", render_message_ansi(Sender::User, &message.text)),
                Sender::Ai => format!("ai> {}", render_message_ansi(Sender::Ai, &message.text)),
            }
        TranscriptEntry::Loading => format!("{}ai> {}{}", DIM.0, entry.text(), DIM.1),
        TranscriptEntry::Error(text) => format!("{}ai> {}{}", RED.0, text, RED.1),
    }
}

/// Notice shown when `/clear` fails; the transcript on screen is unchanged.
fn clear_failure(err: &WidgetError) -> TranscriptEntry {
    TranscriptEntry::Error(format!("Error: Could not clear chat history: {}", err))
}

fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn print_entries(entries: &[TranscriptEntry]) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    for entry in entries {
        let mut line = format_entry(entry);
        if !line.ends_with('\n') {
            line.push('\n');
        }
        stdout.write_all(line.as_bytes()).await?;
    }
    stdout.flush().await
}

async fn prompt(text: &str) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await
}

async fn ask_confirmation(lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<bool> {
    prompt("Clear all chat history? [y/N] ").await?;
    Ok(lines.next_line().await?.is_some_and(|answer| is_confirmation(&answer)))
}

pub async fn run_chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let store = create_history_store(&args)?;
    let url = Url::parse(&args.relay_url).map_err(|e|
        format!("Invalid relay URL '{}': {}", args.relay_url, e)
    )?;
    info!("Sending chat requests to: {}", url);
    let transport = HttpRelayTransport::new(url, Duration::from_secs(args.request_timeout_secs))?;

    let mut widget = ChatWidget::new(store, Arc::new(transport));
    widget.load_history().await?;
    print_entries(widget.transcript()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt("> ").await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        widget.on_input_change(input);

        if QUIT_COMMANDS.contains(&input) {
            break;
        }

        if input == CLEAR_COMMAND {
            let confirmed = ask_confirmation(&mut lines).await?;
            match widget.on_clear(|| confirmed).await {
                Ok(true) => print_entries(widget.transcript()).await?,
                Ok(false) => {}
                Err(e) => {
                    warn!("Clearing chat history failed: {}", e);
                    print_entries(&[clear_failure(&e)]).await?;
                }
            }
            continue;
        }

        if !widget.controls().send_enabled {
            continue;
        }

        let Some(pending) = widget.begin_send(input)? else {
            continue;
        };
        // the user's own line is already on screen, only the slot after it changes
        let shown = widget.transcript().len();
        print_entries(&widget.transcript()[shown - 1..]).await?;

        let outcome = widget.dispatch(&pending).await;
        widget.finish_send(pending, outcome).await;
        print_entries(&widget.transcript()[shown - 1..]).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatMessage;
    use crate::widget::Delivery;

    #[test]
    fn assistant_entries_are_formatted() {
        let entry = TranscriptEntry::Message {
            message: ChatMessage::ai("**hi**"),
            delivery: Delivery::Delivered,
        };
        assert_eq!(format_entry(&entry), "ai> \x1b[1mhi\x1b[22m");
    }

    #[test]
    fn user_entries_are_literal() {
        let entry = TranscriptEntry::Message {
            message: ChatMessage::user("**hi**"),
            delivery: Delivery::Pending,
        };
        assert_eq!(format_entry(&entry), "you> **hi**");
    }

    #[test]
    fn errors_are_red() {
        let entry = TranscriptEntry::Error("Error: Request to relay timed out".into());
        assert_eq!(format_entry(&entry), "\x1b[31mai> Error: Request to relay timed out\x1b[39m");
    }

    #[test]
    fn clear_failures_are_shown_as_errors() {
        let entry = clear_failure(&WidgetError::Busy);
        let line = format_entry(&entry);
        assert!(line.starts_with("\x1b[31mai> Error: Could not clear chat history: "));
        assert!(line.contains(&WidgetError::Busy.to_string()));
    }

    #[test]
    fn only_yes_confirms() {
        assert!(is_confirmation("y"));
        assert!(is_confirmation(" YES "));
        assert!(!is_confirmation(""));
        assert!(!is_confirmation("no"));
    }
}
