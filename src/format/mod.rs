pub mod parser;
pub mod render;

pub use parser::{ parse, Node };
pub use render::{ escape_html, render_ansi, render_html };

use crate::models::chat::Sender;

/// HTML for a message bubble. Only assistant text is interpreted as markup;
/// user text is always shown literally.
pub fn render_message_html(sender: Sender, text: &str) -> String {
    match sender {
        Sender::Ai => render_html(&parse(text)),
        Sender::User => escape_html(text),
    }
}

pub fn render_message_ansi(sender: Sender, text: &str) -> String {
    match sender {
        Sender::Ai => render_ansi(&parse(text)),
        Sender::User => text.to_string(),
    }
}
