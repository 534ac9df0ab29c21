//! The interactive chat loop.

use std::error::Error;
use std::fmt;
use std::io::{self, Stdout};
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ChatRequest;
use crate::cli::{git_describe, Args};
use crate::commands::{process_input, CommandContext, CommandResult};
use crate::core::chat_stream::ChatClient;
use crate::core::config::{path_display, Config};
use crate::core::conversation::ContextPolicy;
use crate::core::render::Renderers;
use crate::core::session::{ChatSession, SessionError, SessionSettings};
use crate::core::transcripts::{FileTranscriptStore, TranscriptError, TranscriptStore};
use crate::ui::console::ConsoleView;
use crate::ui::html::HtmlView;
use crate::ui::view::{ChatView, NoticeKind};
use crate::utils::url::validate_base_url;

const API_KEY_VARS: [&str; 2] = ["SILLAGE_API_KEY", "OPENAI_API_KEY"];
const PAGE_REFRESH_SECONDS: u32 = 2;

/// Flag values that shape a chat run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub single_turn: bool,
    pub html: Option<PathBuf>,
    pub load: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ChatOptions {
    pub fn from_args(args: Args) -> Self {
        Self {
            model: args.model,
            max_tokens: args.max_tokens,
            single_turn: args.single_turn,
            html: args.html,
            load: args.load,
            api_key: args.api_key,
            base_url: args.base_url,
        }
    }

    /// Flags win over config values.
    pub fn session_settings(&self, config: &Config) -> SessionSettings {
        let policy = if self.single_turn {
            ContextPolicy::SingleTurn
        } else {
            config.context_policy()
        };
        SessionSettings {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| config.model().to_string()),
            max_tokens: self.max_tokens.unwrap_or_else(|| config.max_tokens()),
            policy,
        }
    }

    pub fn resolve_base_url(&self, config: &Config) -> Result<String, String> {
        match &self.base_url {
            Some(url) => validate_base_url(url),
            None => Ok(config.base_url().to_string()),
        }
    }
}

#[derive(Debug)]
pub struct MissingApiKey;

impl fmt::Display for MissingApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No API key found. Pass --api-key or set {}.",
            API_KEY_VARS.join(" or ")
        )
    }
}

impl Error for MissingApiKey {}

/// Picks the flag value, then the first non-empty variable in
/// [`API_KEY_VARS`] as reported by `lookup`.
pub fn resolve_api_key<F>(flag: Option<&str>, lookup: F) -> Result<String, MissingApiKey>
where
    F: Fn(&str) -> Option<String>,
{
    flag.map(str::to_string)
        .into_iter()
        .chain(API_KEY_VARS.iter().filter_map(|var| lookup(var)))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or(MissingApiKey)
}

pub async fn run_chat(options: ChatOptions, config: Config) -> Result<(), Box<dyn Error>> {
    let api_key = resolve_api_key(options.api_key.as_deref(), |var| std::env::var(var).ok())?;
    let base_url = options.resolve_base_url(&config)?;
    let settings = options.session_settings(&config);

    let client = ChatClient::new(reqwest::Client::new(), base_url, api_key);
    let mut store = FileTranscriptStore::new(config.transcripts_dir()?);
    let mut session = ChatSession::new(settings, Renderers::standard());

    let mut page = HtmlView::new("sillage").with_stylesheet(session.stylesheet());
    if options.html.is_some() {
        page = page.with_auto_refresh(PAGE_REFRESH_SECONDS);
    }
    let mut view = ConsoleView::new(io::stdout(), page);
    if let Some(path) = options.html.clone() {
        view = view.with_page_file(path);
    }

    view.println(&format!(
        "sillage {} ({}) · {} · {} · /help for commands",
        env!("CARGO_PKG_VERSION"),
        git_describe(),
        session.settings().model,
        client.base_url(),
    ));
    if let Some(path) = &options.html {
        view.println(&format!("Writing the chat page to {}", path_display(path)));
        view.write_page();
    }

    if let Some(name) = &options.load {
        match store.get(name) {
            Ok(Some(text)) => session.load_transcript(name, &text, &mut view),
            Ok(None) => view.show_notice(
                NoticeKind::Error,
                &TranscriptError::NotFound(name.clone()).to_string(),
            ),
            Err(err) => view.show_notice(NoticeKind::Error, &err.to_string()),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        view.prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            view.println("");
            break;
        };

        let mut ctx = CommandContext {
            session: &mut session,
            view: &mut view,
            store: &mut store,
        };
        match process_input(&mut ctx, &line) {
            CommandResult::Continue => {}
            CommandResult::Quit => break,
            CommandResult::ProcessAsMessage(text) => match session.submit(&text, &mut view) {
                Ok(request) => exchange(&mut session, &mut view, &client, request).await,
                Err(SessionError::EmptyInput) => {}
                Err(err) => view.show_notice(NoticeKind::Error, &err.to_string()),
            },
        }
    }
    Ok(())
}

/// Sends one request and streams the reply into the view. Ctrl+C cancels.
async fn exchange(
    session: &mut ChatSession,
    view: &mut ConsoleView<Stdout>,
    client: &ChatClient,
    request: ChatRequest,
) {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let started = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        started = client.start(&request) => Some(started),
    };
    match started {
        None => session.cancel(view),
        Some(Err(err)) => session.fail(&err, view),
        Some(Ok(body)) => {
            let outcome = session.consume(body, view, &cancel).await;
            debug!(?outcome, "response finished");
        }
    }

    interrupt.abort();
}
