//! Static command table.
//!
//! Known slash commands answer with fixed text and never reach the relay core.

pub const WELCOME_TEXT: &str = "🤖 Welcome!\n\n\
I'm an AI assistant. Send me a message and I'll do my best to help.\n\n\
Use /help to see available commands.";

pub const HELP_TEXT: &str = "📚 Available commands:\n\n\
/start - Start the bot\n\
/help - Show this help message\n\n\
💡 Any other message is answered by the AI model.";

/// Command name (without the slash) to static reply.
pub const COMMANDS: &[(&str, &str)] = &[("start", WELCOME_TEXT), ("help", HELP_TEXT)];

/// Where an inbound text goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route<'a> {
    /// Reply with fixed text.
    Static(&'static str),
    /// Forward to the relay core.
    Relay(&'a str),
    /// Unknown command; dropped.
    Ignore,
}

pub fn route(text: &str) -> Route<'_> {
    let trimmed = text.trim_start();
    let first = trimmed.split_whitespace().next().unwrap_or("");
    if !is_command_token(first) {
        return Route::Relay(text);
    }

    let (cmd, _args) = parse_command(trimmed);
    lookup(&cmd).map(Route::Static).unwrap_or(Route::Ignore)
}

/// `/name` or `/name@botname`, the shape Telegram marks as a bot command.
fn is_command_token(token: &str) -> bool {
    let Some(body) = token.strip_prefix('/') else {
        return false;
    };
    let (name, bot) = match body.split_once('@') {
        Some((name, bot)) => (name, Some(bot)),
        None => (body, None),
    };
    let word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    word(name) && bot.map_or(true, word)
}

pub fn lookup(name: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .find(|(cmd, _)| *cmd == name)
        .map(|(_, reply)| *reply)
}

/// Split `/cmd@botname args...` into a lowercase command name and the rest.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}
