use chrono::Local;

use super::AlertContext;

/// Escape text for Telegram's legacy Markdown parse mode.
/// Characters to escape: _ * [ `
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Text placed inside a code span; only a backtick could end the entity early
fn code_span(text: &str) -> String {
    text.replace('`', "'")
}

/// Render the chat text for an alert or a recovery
pub fn format_chat_message(context: &AlertContext) -> String {
    let recovery = context.is_recovery();
    let (marker, title, status) = if recovery { ("✅", "RECOVERED", "UP") } else { ("🔴", "ALERT", "DOWN") };

    let mut message = format!("{marker} *Pulse Monitor {title}*\n\n");
    message.push_str(&format!("*Monitor:* {}\n", escape_markdown(&context.monitor_name)));
    message.push_str(&format!("*Type:* {}\n", context.monitor_type.as_str().to_uppercase()));
    message.push_str(&format!("*Status:* {status}\n"));

    if !recovery {
        if let Some(error) = &context.error_message {
            message.push_str(&format!("*Error:* `{}`\n", code_span(error)));
        }
    }

    if let Some(ms) = context.response_time_ms.filter(|ms| *ms > 0) {
        message.push_str(&format!("*Response Time:* {ms}ms\n"));
    }

    if let Some(url) = &context.check_url {
        message.push_str(&format!("*URL:* {}\n", escape_markdown(url)));
    }

    let local = context.timestamp.with_timezone(&Local);
    message.push_str(&format!("*Time:* {}\n", local.format("%Y-%m-%d %H:%M:%S")));
    message.push_str("\n_Pulse Monitor - Keep your services healthy 💗_");

    message
}
