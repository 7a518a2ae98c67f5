//! Parsing of REPL input lines.

use std::path::PathBuf;

/// Slash commands offered for completion.
pub const COMMANDS: &[&str] = &[
    "/image",
    "/detach",
    "/fav",
    "/analysis",
    "/close",
    "/history",
    "/favorites",
    "/restore",
    "/new",
    "/messages",
    "/help",
    "/quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send.
    Send(String),
    /// Pick the image at this path and analyze it.
    Image(PathBuf),
    /// Drop the attached image.
    Detach,
    /// Toggle favorite on the message with this 1-based position.
    Favorite(usize),
    /// Show the analysis of the message with this 1-based position.
    Analysis(usize),
    /// Close the analysis viewer.
    Close,
    History,
    Favorites,
    /// Restore the history with this 1-based position.
    Restore(usize),
    New,
    Messages,
    Help,
    Quit,
    /// Unrecognized or malformed command, with a hint.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return Command::Send(line.to_string());
        }

        let (name, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (trimmed, ""),
        };

        match name {
            "/image" if arg.is_empty() => Command::Invalid("usage: /image <path>".into()),
            "/image" => Command::Image(PathBuf::from(arg)),
            "/detach" => Command::Detach,
            "/fav" => position(arg, "/fav <n>", Command::Favorite),
            "/analysis" => position(arg, "/analysis <n>", Command::Analysis),
            "/close" => Command::Close,
            "/history" => Command::History,
            "/favorites" => Command::Favorites,
            "/restore" => position(arg, "/restore <n>", Command::Restore),
            "/new" => Command::New,
            "/messages" => Command::Messages,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command {other}, try /help")),
        }
    }
}

/// Whether an input line should be ignored without dispatching.
///
/// A blank line still sends when an image is attached, since the image alone
/// makes the draft sendable.
pub fn is_idle_line(line: &str, has_attachment: bool) -> bool {
    line.trim().is_empty() && !has_attachment
}

fn position(arg: &str, usage: &str, make: fn(usize) -> Command) -> Command {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => make(n),
        _ => Command::Invalid(format!("usage: {usage}")),
    }
}

pub const HELP: &str = "\
<text>             send a message
/image <path>      analyze an image and attach it to the next message
                   (an empty line then sends the image alone)
/detach            drop the attached image
/fav <n>           toggle favorite on reply n
/analysis <n>      show the image analysis of message n
/close             close the analysis viewer
/history           list saved chats
/favorites         list favorite replies
/restore <n>       reopen saved chat n
/new               start a new chat
/messages          reprint the conversation
/quit              exit";
