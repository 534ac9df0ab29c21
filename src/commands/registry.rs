use super::{CommandContext, CommandResult};

pub type CommandHandler = fn(&mut CommandContext<'_>, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub command: &'static Command,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "save",
        usage: "/save <name>",
        help: "Store the conversation as a named transcript.",
        handler: super::handle_save,
    },
    Command {
        name: "load",
        usage: "/load <name>",
        help: "Replace the conversation with a stored transcript.",
        handler: super::handle_load,
    },
    Command {
        name: "delete",
        usage: "/delete <name>",
        help: "Remove a stored transcript.",
        handler: super::handle_delete,
    },
    Command {
        name: "list",
        usage: "/list",
        help: "List stored transcripts.",
        handler: super::handle_list,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a blank conversation.",
        handler: super::handle_new,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];
