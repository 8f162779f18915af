pub mod add;
pub mod help;
pub mod transaction;

use tracing::debug;

use crate::services::feed_service::TransactionFeed;

/// What the terminal loop should do after a command
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// Print this text
    Message(String),
    /// Nothing to print; a feed event will trigger the redraw
    Nothing,
    /// Tear down and exit
    Quit,
}

/// Parse one input line and run the matching command
///
/// Errors come back as user-facing text.
pub async fn handle_line(feed: &TransactionFeed, line: &str) -> Result<Reply, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    if command.is_empty() {
        return Ok(Reply::Nothing);
    }
    let args: Vec<&str> = rest.split_whitespace().collect();

    debug!("Command `{}` with {} argument(s)", command, args.len());

    match command.to_lowercase().as_str() {
        "list" | "ls" => transaction::list(feed).await,
        "next" | "n" => transaction::next(feed).await,
        "prev" | "previous" | "p" => transaction::previous(feed).await,
        "find" | "goto" => transaction::find(feed, &args).await,
        "add" => add::execute(feed, rest),
        "retry" | "reload" => transaction::retry(feed),
        "help" | "?" => help::execute(),
        "quit" | "exit" | "q" => Ok(Reply::Quit),
        other => Err(format!("Unknown command `{}`. Type `help` for the list.", other)),
    }
}
