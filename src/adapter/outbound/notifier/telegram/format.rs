//! Message formatting for Telegram notifications.

use chrono::NaiveDateTime;

use crate::domain::item::{Order, RemoteItem, Settlement};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a newly observed successful item as a `MarkdownV2` message.
pub fn format_item_message(item: &RemoteItem) -> String {
    match item {
        RemoteItem::Order(order) => format_order_message(order),
        RemoteItem::Settlement(settlement) => format_settlement_message(settlement),
    }
}

fn format_order_message(order: &Order) -> String {
    format!(
        "🔔 *Payment received*\n\
        \n\
        🔢 Trade no: `{}`\n\
        💰 Amount: ¥{}\n\
        💳 Method: `{}`\n\
        📝 {}\n\
        ⏱️ Paid at: {}",
        escape_markdown(order.trade_no.as_str()),
        escape_markdown(&order.amount.to_string()),
        escape_markdown(&order.pay_type),
        escape_markdown(&truncate(&order.name, 60)),
        escape_markdown(&format_time(order.completed_at.or(order.created_at))),
    )
}

fn format_settlement_message(settlement: &Settlement) -> String {
    format!(
        "💵 *Settlement completed*\n\
        \n\
        🆔 Settlement: `{}`\n\
        💰 Amount: ¥{}\n\
        💸 Received: ¥{}\n\
        👤 Account: `{}`\n\
        ⏱️ Settled at: {}",
        escape_markdown(settlement.id.as_str()),
        escape_markdown(&settlement.amount.to_string()),
        escape_markdown(&settlement.realized_amount.to_string()),
        escape_markdown(&settlement.account),
        escape_markdown(&format_time(
            settlement.completed_at.or(settlement.created_at)
        )),
    )
}

/// Plain-text listing of the most recent orders.
pub fn format_order_list(orders: &[Order], success_only: bool, limit: usize) -> String {
    let lines: Vec<String> = orders
        .iter()
        .filter(|order| !success_only || order.status.is_success())
        .take(limit)
        .map(|order| {
            format!(
                "{} {} - ¥{}\n   {} · {}",
                status_mark(order.status.is_success()),
                order.trade_no,
                order.amount,
                order.pay_type,
                format_time(order.completed_at.or(order.created_at)),
            )
        })
        .collect();

    if lines.is_empty() {
        return if success_only {
            "📭 No successful orders found".to_string()
        } else {
            "📭 No orders found".to_string()
        };
    }

    let title = if success_only {
        "📊 Recent successful orders"
    } else {
        "📊 Recent orders"
    };
    format!("{title}\n\n{}", lines.join("\n\n"))
}

/// Plain-text listing of the most recent settlements.
pub fn format_settlement_list(settlements: &[Settlement], limit: usize) -> String {
    if settlements.is_empty() {
        return "📭 No settlements found".to_string();
    }

    let lines: Vec<String> = settlements
        .iter()
        .take(limit)
        .map(|s| {
            format!(
                "{} #{} - ¥{} (received ¥{})\n   {}",
                status_mark(s.status.is_success()),
                s.id,
                s.amount,
                s.realized_amount,
                format_time(s.created_at),
            )
        })
        .collect();

    format!("💵 Recent settlements\n\n{}", lines.join("\n\n"))
}

const fn status_mark(success: bool) -> &'static str {
    if success {
        "✅"
    } else {
        "❌"
    }
}

fn format_time(at: Option<NaiveDateTime>) -> String {
    at.map_or_else(|| "unknown".to_string(), |t| t.format(TIME_FORMAT).to_string())
}

/// Truncate a string with ellipsis (Unicode-safe).
pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Escape special characters for Telegram `MarkdownV2`.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
        '\\',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}
