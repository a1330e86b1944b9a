//! Line-oriented room view: prints new log entries as they arrive and
//! connection changes as status lines.

use std::io::{self, Write};

use chrono::Local;

use crate::domain::{
    message::ChatMessage, presence::PresenceSnapshot, session_state::SessionState,
};

use super::{
    message_rendering::{build_message_lines, grouping_sender, MessageLine},
    styles,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkStatus {
    Connected,
    Reconnecting,
    Lost,
}

pub struct ConsoleRenderer<W: Write> {
    out: W,
    color: bool,
    printed: usize,
    last_printed_id: Option<String>,
    last_sender: Option<String>,
    status: Option<LinkStatus>,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            printed: 0,
            last_printed_id: None,
            last_sender: None,
            status: None,
        }
    }

    /// Prints what changed since the last call. A log that was replaced or
    /// cleared is printed again from the top.
    pub fn render(&mut self, state: &SessionState) -> io::Result<()> {
        self.render_status(state)?;

        let messages = state.messages();
        if self.log_was_replaced(messages) {
            self.printed = 0;
            self.last_sender = None;
            if messages.is_empty() {
                self.notice("-- message log cleared --")?;
            } else {
                self.notice("-- message history --")?;
            }
        }

        let fresh = &messages[self.printed..];
        if !fresh.is_empty() {
            let lines = build_message_lines(fresh, self.last_sender.as_deref(), &Local::now());
            for line in &lines {
                self.write_line(line)?;
            }
            self.printed = messages.len();
            self.last_printed_id = messages.last().map(|message| message.id.clone());
            self.last_sender = messages.last().and_then(grouping_sender).map(str::to_owned);
        }
        if messages.is_empty() {
            self.printed = 0;
            self.last_printed_id = None;
        }

        self.out.flush()
    }

    /// Prints a standalone log, outside of a live session.
    pub fn print_messages(&mut self, messages: &[ChatMessage]) -> io::Result<()> {
        if messages.is_empty() {
            self.notice("(no messages)")?;
        }
        for line in build_message_lines(messages, None, &Local::now()) {
            self.write_line(&line)?;
        }
        self.out.flush()
    }

    pub fn print_presence(&mut self, presence: &PresenceSnapshot) -> io::Result<()> {
        let names = presence
            .users
            .iter()
            .map(|member| member.username.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.notice(&format!("{} online: {}", presence.count, names))?;
        self.out.flush()
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", styles::system_style().apply(text))
        } else {
            writeln!(self.out, "{text}")
        }
    }

    fn log_was_replaced(&self, messages: &[ChatMessage]) -> bool {
        if self.printed == 0 {
            return self.last_printed_id.is_some();
        }
        messages.len() < self.printed
            || messages[self.printed - 1].id.as_str() != self.last_printed_id.as_deref().unwrap_or_default()
    }

    fn render_status(&mut self, state: &SessionState) -> io::Result<()> {
        let status = if state.is_connection_lost() {
            LinkStatus::Lost
        } else if state.is_connected() {
            LinkStatus::Connected
        } else {
            LinkStatus::Reconnecting
        };
        if self.status == Some(status) {
            return Ok(());
        }
        let first = self.status.is_none();
        self.status = Some(status);

        let (text, ok) = match status {
            LinkStatus::Connected => ("* connected", true),
            LinkStatus::Reconnecting if first => ("* connecting...", true),
            LinkStatus::Reconnecting => ("* connection lost, reconnecting...", false),
            LinkStatus::Lost => ("* disconnected, leave and rejoin the room to retry", false),
        };
        let style = if ok {
            styles::status_ok_style()
        } else {
            styles::status_warn_style()
        };

        if self.color {
            writeln!(self.out, "{}", style.apply(text))
        } else {
            writeln!(self.out, "{text}")
        }
    }

    fn write_line(&mut self, line: &MessageLine) -> io::Result<()> {
        if line.system {
            let text = format!("[{}] {}", line.time, line.content);
            return self.notice(&text);
        }

        if let Some(sender) = &line.sender {
            if self.color {
                writeln!(self.out, "{}", styles::sender_style().apply(sender))?;
            } else {
                writeln!(self.out, "{sender}")?;
            }
        }

        if self.color {
            writeln!(
                self.out,
                "  {} {}",
                styles::time_style().apply(&line.time),
                line.content
            )
        } else {
            writeln!(self.out, "  {} {}", line.time, line.content)
        }
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        message::MessageKind,
        presence::{PresenceMember, PresenceSnapshot},
    };

    fn message(id: &str, username: &str, chat: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_owned(),
            room_id: "room-1".to_owned(),
            user_id: 1,
            username: username.to_owned(),
            chat: chat.to_owned(),
            timestamp: "2024-01-01T00:00:00Z".to_owned(),
            kind: MessageKind::Message,
        }
    }

    fn text(renderer: &ConsoleRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.output().clone()).expect("utf8 output")
    }

    #[test]
    fn prints_only_new_messages() {
        let mut renderer = ConsoleRenderer::new(Vec::new(), false);
        let mut state = SessionState::default();
        state.set_connected(true);
        state.append_message(message("1", "al", "first"));

        renderer.render(&state).expect("render");
        state.append_message(message("2", "bo", "second"));
        renderer.render(&state).expect("render");

        let output = text(&renderer);
        assert_eq!(output.matches("first").count(), 1);
        assert_eq!(output.matches("second").count(), 1);
        assert_eq!(output.matches("* connected").count(), 1);
    }

    #[test]
    fn reprints_after_history_replacement() {
        let mut renderer = ConsoleRenderer::new(Vec::new(), false);
        let mut state = SessionState::default();
        state.append_message(message("live", "al", "interim"));
        renderer.render(&state).expect("render");

        state.replace_messages(vec![message("h1", "bo", "older")]);
        renderer.render(&state).expect("render");

        let output = text(&renderer);
        assert!(output.contains("-- message history --"));
        assert!(output.contains("older"));
    }

    #[test]
    fn reports_cleared_log_once() {
        let mut renderer = ConsoleRenderer::new(Vec::new(), false);
        let mut state = SessionState::default();
        state.append_message(message("1", "al", "gone soon"));
        renderer.render(&state).expect("render");

        state.clear_messages();
        renderer.render(&state).expect("render");
        renderer.render(&state).expect("render");

        assert_eq!(text(&renderer).matches("-- message log cleared --").count(), 1);
    }

    #[test]
    fn status_lines_follow_connection_changes() {
        let mut renderer = ConsoleRenderer::new(Vec::new(), false);
        let mut state = SessionState::default();

        renderer.render(&state).expect("render");
        state.set_connected(true);
        renderer.render(&state).expect("render");
        state.set_connected(false);
        renderer.render(&state).expect("render");
        state.mark_connection_lost();
        renderer.render(&state).expect("render");

        let output = text(&renderer);
        assert!(output.contains("* connecting..."));
        assert!(output.contains("* connection lost, reconnecting..."));
        assert!(output.contains("* disconnected"));
    }

    #[test]
    fn standalone_log_prints_every_message() {
        let mut renderer = ConsoleRenderer::new(Vec::new(), false);

        renderer
            .print_messages(&[message("1", "al", "one"), message("2", "al", "two")])
            .expect("print");

        let output = text(&renderer);
        assert_eq!(output.matches("al\n").count(), 1);
        assert!(output.contains("one"));
        assert!(output.contains("two"));
        assert!(!output.contains("* "));
    }

    #[test]
    fn presence_lists_member_names() {
        let mut renderer = ConsoleRenderer::new(Vec::new(), false);
        let presence = PresenceSnapshot::new(
            2,
            vec![
                PresenceMember {
                    user_id: 1,
                    username: "al".to_owned(),
                    avatar: None,
                },
                PresenceMember {
                    user_id: 2,
                    username: "bo".to_owned(),
                    avatar: None,
                },
            ],
        );

        renderer.print_presence(&presence).expect("print");

        assert_eq!(text(&renderer), "2 online: al, bo\n");
    }
}
