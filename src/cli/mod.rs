use clap::{ Parser, Subcommand };
use crate::config::generation::HarmBlockThreshold;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the relay between chat clients and the Gemini API.
    Serve(ServeArgs),
    /// Chat with a running relay from the terminal.
    Chat(ChatArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the relay to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8888")]
    pub server_addr: String,

    /// Path the chat endpoint is mounted at.
    #[arg(long, env = "RELAY_PATH", default_value = "/.netlify/functions/gemini-proxy")]
    pub relay_path: String,

    // --- Upstream Args ---
    /// Gemini API key. Without it every chat request is answered with 401.
    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-2.0-flash)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on the client default if None
    pub chat_model: Option<String>,

    /// Base URL of the Gemini API (e.g., https://generativelanguage.googleapis.com/v1beta)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// Seconds to wait for the upstream model before answering 504.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "10")]
    pub upstream_timeout_secs: u64,

    /// Block threshold applied to every harm category (none, high, medium, low).
    /// Upstream defaults apply when unset.
    #[arg(long, env = "SAFETY_THRESHOLD")]
    pub safety_threshold: Option<HarmBlockThreshold>,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ChatArgs {
    /// Full URL of the relay chat endpoint.
    #[arg(
        long,
        env = "RELAY_URL",
        default_value = "http://127.0.0.1:8888/.netlify/functions/gemini-proxy"
    )]
    pub relay_url: String,

    /// History store type (file, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "file")]
    pub history_type: String,

    /// File holding the saved conversation when --history-type=file.
    #[arg(long, env = "HISTORY_PATH", default_value = "chat_history.json")]
    pub history_path: String,

    /// Seconds to wait for the relay before showing an error.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let args = Args::try_parse_from(["chat-relay", "serve"]).unwrap();
        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.upstream_timeout_secs, 10);
        assert!(serve.relay_path.starts_with('/'));
        assert!(!serve.enable_tls);
    }

    #[test]
    fn safety_threshold_is_parsed() {
        let args = Args::try_parse_from([
            "chat-relay",
            "serve",
            "--safety-threshold",
            "medium",
        ]).unwrap();
        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.safety_threshold, Some(HarmBlockThreshold::BlockMediumAndAbove));
    }

    #[test]
    fn chat_accepts_memory_store() {
        let args = Args::try_parse_from(["chat-relay", "chat", "--history-type", "memory"]).unwrap();
        let Command::Chat(chat) = args.command else {
            panic!("expected chat");
        };
        assert_eq!(chat.history_type, "memory");
        assert_eq!(chat.request_timeout_secs, 30);
    }
}
