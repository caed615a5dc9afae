//! Notification text for a confirmed discovery.

use nipscan_core::ConfirmedResult;

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the message sent when a candidate is confirmed.
pub fn discovery_message(result: &ConfirmedResult) -> String {
    let mut text = format!(
        "✅ <b>Found</b>\nNIP: <code>{}</code>\n{}\nStatus: {}",
        escape_html(&result.nip),
        escape_html(&result.name),
        escape_html(&result.vat_status),
    );
    if !result.address.is_empty() {
        text.push_str("\nAddress: ");
        text.push_str(&escape_html(&result.address));
    }
    text
}
