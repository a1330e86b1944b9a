//! Message log formatting for the console view.
//!
//! Handles:
//! - Relative timestamps (`now`, `5m ago`, `Yesterday 09:15`, ...)
//! - Sender grouping (consecutive messages from one sender show the name once)
//! - Whitespace collapsing of message content

use std::fmt;

use chrono::{DateTime, Datelike, Duration, TimeZone};

use crate::domain::message::ChatMessage;

/// One printable entry of the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLine {
    pub time: String,
    /// `None` when the previous line came from the same sender.
    pub sender: Option<String>,
    pub content: String,
    pub system: bool,
}

/// Builds printable lines for `messages`. `previous_sender` is the sender of
/// the last line already on screen, so appended batches keep grouping.
pub fn build_message_lines<Tz>(
    messages: &[ChatMessage],
    previous_sender: Option<&str>,
    now: &DateTime<Tz>,
) -> Vec<MessageLine>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut previous = previous_sender;

    messages
        .iter()
        .map(|message| {
            let system = message.is_system();
            let show_sender = system || previous != Some(message.username.as_str());
            previous = (!system).then_some(message.username.as_str());

            MessageLine {
                time: format_message_time(&message.timestamp, now),
                sender: show_sender.then(|| message.username.clone()),
                content: sanitize_content(&message.chat),
                system,
            }
        })
        .collect()
}

/// Sender whose name a following message may omit, if any.
pub fn grouping_sender(message: &ChatMessage) -> Option<&str> {
    (!message.is_system()).then_some(message.username.as_str())
}

/// Formats an ISO-8601 timestamp relative to `now`. Unparseable input is
/// returned unchanged.
pub fn format_message_time<Tz>(timestamp: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_owned();
    };
    let date = parsed.with_timezone(&now.timezone());
    let elapsed = now.clone().signed_duration_since(date.clone());

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "now".to_owned();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }

    let yesterday = (now.clone() - Duration::days(1)).date_naive();
    if date.date_naive() == yesterday {
        return format!("Yesterday {}", date.format("%H:%M"));
    }

    format!(
        "{} {}, {}",
        month_abbrev(date.month()),
        date.day(),
        date.format("%H:%M")
    )
}

fn month_abbrev(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("???")
}

fn sanitize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}
