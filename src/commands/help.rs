use super::{add, Reply};

pub fn execute() -> Result<Reply, String> {
    let text = format!(
        "📖 Commands\n\
         `list` - Show the current page\n\
         `next` / `n` - Next page\n\
         `prev` / `p` - Previous page\n\
         `find <id>` - Go to the page holding a transaction\n\
         {} - Add a transaction (amount in dollars, negative for spending)\n\
         `retry` - Fetch the list again after an error\n\
         `help` - Show this help message\n\
         `quit` / `exit` - Leave",
        add::USAGE
    );
    Ok(Reply::Message(text))
}
