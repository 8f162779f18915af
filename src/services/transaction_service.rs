use crate::models::{FeedEvent, FeedSnapshot, LoadPhase};
use crate::utils::table::Align;
use crate::utils::{format_amount, format_date, Table};

const HIGHLIGHT_MARKER: &str = "*";

/// Render the current page of the feed for the terminal
///
/// Initial load shows a placeholder, a failed fetch shows the error with a
/// retry hint, and a background reload keeps the table with a tag in the title.
pub fn render_page(snapshot: &FeedSnapshot) -> String {
    if snapshot.phase == LoadPhase::InitialLoading {
        return "⏳ Loading transactions...".to_string();
    }

    if let Some(error) = &snapshot.error {
        return format!(
            "⚠️ Failed to load transactions: {}\nType `retry` to try again.",
            error
        );
    }

    let mut output = String::from("📋 Transactions");
    if snapshot.phase == LoadPhase::Reloading {
        output.push_str(" (refreshing)");
    }
    output.push('\n');

    let table = transaction_table(snapshot);
    if table.is_empty() {
        output.push_str("No transactions found");
    } else {
        output.push_str(&table.render());
    }

    if snapshot.total_pages > 1 {
        output.push_str(&format!(
            "\nPage {} of {} ({} total transactions)",
            snapshot.current_page, snapshot.total_pages, snapshot.total_items
        ));
    }

    if snapshot.submitting {
        output.push_str("\n⏳ Submitting transaction...");
    }

    if let Some(add_error) = &snapshot.add_error {
        output.push_str(&format!("\n❌ {}", add_error));
    }

    output
}

/// Whether a feed event can change what the terminal shows
pub fn should_redraw(event: &FeedEvent) -> bool {
    !matches!(event, FeedEvent::TornDown)
}

/// Last page printed to the terminal, so unchanged views are not printed twice
#[derive(Debug, Default)]
pub struct PageView {
    last_drawn: String,
}

impl PageView {
    /// Render `snapshot`, returning the text only when it differs from the last draw
    pub fn update(&mut self, snapshot: &FeedSnapshot) -> Option<String> {
        let rendered = render_page(snapshot);
        if rendered == self.last_drawn {
            return None;
        }
        self.last_drawn = rendered.clone();
        Some(rendered)
    }
}

fn transaction_table(snapshot: &FeedSnapshot) -> Table {
    let mut table = Table::new(&["", "Date", "Payee", "Memo", "Amount"]).align(4, Align::Right);

    for record in &snapshot.page_items {
        let marker = if snapshot.is_highlighted(record) {
            HIGHLIGHT_MARKER
        } else {
            ""
        };
        table.add_row(&[
            marker.to_string(),
            format_date(record.timestamp),
            record.payee.clone(),
            record.memo.clone().unwrap_or_default(),
            format_amount(record.amount),
        ]);
    }

    table
}
