mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::core::session::ChatSession;
use crate::core::transcripts::{TranscriptError, TranscriptStore};
use crate::ui::view::{ChatView, NoticeKind};

/// What the chat loop should do after a line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

/// Everything a command handler may touch.
pub struct CommandContext<'a> {
    pub session: &'a mut ChatSession,
    pub view: &'a mut dyn ChatView,
    pub store: &'a mut dyn TranscriptStore,
}

impl CommandContext<'_> {
    fn info(&mut self, text: &str) {
        self.view.show_notice(NoticeKind::Info, text);
    }

    fn error(&mut self, text: &str) {
        self.view.show_notice(NoticeKind::Error, text);
    }
}

pub fn process_input(ctx: &mut CommandContext<'_>, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation { command, args };
        (command.handler)(ctx, invocation)
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

pub(super) fn handle_help(ctx: &mut CommandContext<'_>, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Commands:");
    for command in all_commands() {
        help.push_str(&format!("\n  {:<16} {}", command.usage, command.help));
    }
    help.push_str("\nCtrl+C cancels a response while it is streaming.");
    ctx.info(&help);
    CommandResult::Continue
}

fn require_name<'a>(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'a>,
) -> Option<&'a str> {
    if invocation.args.is_empty() {
        ctx.error(&format!("Usage: {}", invocation.command.usage));
        return None;
    }
    Some(invocation.args)
}

pub(super) fn handle_save(ctx: &mut CommandContext<'_>, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(name) = require_name(ctx, invocation) else {
        return CommandResult::Continue;
    };
    let transcript = ctx.session.conversation().to_transcript();
    if transcript.is_empty() {
        ctx.error("Nothing to save yet");
        return CommandResult::Continue;
    }
    match ctx.store.create(name, &transcript) {
        Ok(()) => ctx.info(&format!("Saved transcript '{name}'")),
        Err(err) => ctx.error(&err.to_string()),
    }
    CommandResult::Continue
}

pub(super) fn handle_load(ctx: &mut CommandContext<'_>, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(name) = require_name(ctx, invocation) else {
        return CommandResult::Continue;
    };
    match ctx.store.get(name) {
        Ok(Some(text)) => ctx.session.load_transcript(name, &text, ctx.view),
        Ok(None) => ctx.error(&TranscriptError::NotFound(name.to_string()).to_string()),
        Err(err) => ctx.error(&err.to_string()),
    }
    CommandResult::Continue
}

pub(super) fn handle_delete(ctx: &mut CommandContext<'_>, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(name) = require_name(ctx, invocation) else {
        return CommandResult::Continue;
    };
    match ctx.store.remove(name) {
        Ok(true) => ctx.info(&format!("Deleted transcript '{name}'")),
        Ok(false) => ctx.error(&TranscriptError::NotFound(name.to_string()).to_string()),
        Err(err) => ctx.error(&err.to_string()),
    }
    CommandResult::Continue
}

pub(super) fn handle_list(ctx: &mut CommandContext<'_>, _invocation: CommandInvocation<'_>) -> CommandResult {
    match ctx.store.list_keys() {
        Ok(names) if names.is_empty() => ctx.info("No saved transcripts"),
        Ok(names) => ctx.info(&format!("Saved transcripts: {}", names.join(", "))),
        Err(err) => ctx.error(&err.to_string()),
    }
    CommandResult::Continue
}

pub(super) fn handle_new(ctx: &mut CommandContext<'_>, _invocation: CommandInvocation<'_>) -> CommandResult {
    ctx.session.reset(ctx.view);
    ctx.info("Started a new conversation");
    CommandResult::Continue
}

pub(super) fn handle_quit(_ctx: &mut CommandContext<'_>, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
