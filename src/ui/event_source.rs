use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::{domain::events::AppEvent, usecases::contracts::AppEventSource};

/// Reads console lines and maps them to [`AppEvent`]s, skipping blank lines.
pub struct LineEventSource<R> {
    lines: Lines<R>,
}

impl LineEventSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: AsyncBufRead + Unpin> AppEventSource for LineEventSource<R> {
    async fn next_event(&mut self) -> Result<Option<AppEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            if let Some(event) = AppEvent::from_input_line(&line) {
                return Ok(Some(event));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
pub struct MockEventSource {
    queue: std::collections::VecDeque<AppEvent>,
}

#[cfg(test)]
impl MockEventSource {
    pub fn from(events: Vec<AppEvent>) -> Self {
        Self {
            queue: events.into(),
        }
    }
}

#[cfg(test)]
impl AppEventSource for MockEventSource {
    async fn next_event(&mut self) -> Result<Option<AppEvent>> {
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_blank_lines_and_reports_end_of_input() {
        let input: &[u8] = b"\n  \nhello\n/who\n";
        let mut source = LineEventSource::new(input);

        assert_eq!(
            source.next_event().await.expect("read"),
            Some(AppEvent::Submit("hello".to_owned()))
        );
        assert_eq!(source.next_event().await.expect("read"), Some(AppEvent::ShowPresence));
        assert_eq!(source.next_event().await.expect("read"), None);
    }
}
