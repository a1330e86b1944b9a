use std::{future::Future, io::Write};

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    domain::events::AppEvent,
    realtime::{channel::Channel, ws::LinkSignal},
    usecases::{
        contracts::{AppEventSource, ChatHistorySource},
        session::ChatSession,
    },
};

use super::console::ConsoleRenderer;

/// Drives one joined room until the user quits, input closes or `shutdown`
/// resolves. Link signals from a closed connection are dropped by epoch.
pub async fn run_room<C, S, E, W>(
    session: &mut ChatSession<C>,
    history: &S,
    events: &mut E,
    signals: &mut UnboundedReceiver<LinkSignal>,
    console: &mut ConsoleRenderer<W>,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    C: Channel + 'static,
    S: ChatHistorySource + ?Sized,
    E: AppEventSource,
    W: Write,
{
    tracing::info!(room_id = %session.room_id(), "starting room shell");
    tokio::pin!(shutdown);

    reload_history(session, history, console).await?;
    console.render(&session.state())?;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            signal = signals.recv() => match signal {
                Some(LinkSignal { epoch, event }) => {
                    let current = session.transport().borrow().channel().is_current(epoch);
                    if current {
                        session.transport().borrow_mut().handle(event);
                        let status = session.transport().borrow().status();
                        tracing::trace!(
                            state = status.state.as_label(),
                            attempt = status.reconnect_attempt,
                            "link signal handled"
                        );
                    } else {
                        tracing::debug!(epoch, "dropping signal from a closed connection");
                    }
                }
                None => break,
            },
            event = events.next_event() => match event? {
                None | Some(AppEvent::QuitRequested) => break,
                Some(AppEvent::Submit(text)) => {
                    if let Err(error) = session.send(&text) {
                        console.notice(&format!("! message not sent: {error}"))?;
                    }
                }
                Some(AppEvent::ShowPresence) => {
                    let presence = session.state().presence().clone();
                    console.print_presence(&presence)?;
                }
                Some(AppEvent::ReloadHistory) => reload_history(session, history, console).await?,
                Some(AppEvent::ClearMessages) => session.clear_messages(),
            },
        }

        if session.take_history_request() {
            reload_history(session, history, console).await?;
        }
        console.render(&session.state())?;
    }

    session.teardown();
    tracing::info!(room_id = %session.room_id(), "left room shell");
    Ok(())
}

async fn reload_history<C, S, W>(
    session: &ChatSession<C>,
    history: &S,
    console: &mut ConsoleRenderer<W>,
) -> Result<()>
where
    C: Channel + 'static,
    S: ChatHistorySource + ?Sized,
    W: Write,
{
    if let Err(error) = session.load_history(history).await {
        console.notice(&format!("! could not load history: {error}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{future, time::Duration};

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        realtime::{channel::LinkEvent, transport::TransportConfig},
        test_support::FakeChannel,
        ui::event_source::MockEventSource,
        usecases::{
            contracts::HistorySourceError,
            load_history::tests::{sample_message, StubHistory},
        },
    };

    fn session() -> (ChatSession<FakeChannel>, FakeChannel) {
        let channel = FakeChannel::default();
        let config = TransportConfig {
            ws_base_url: "ws://rooms.test/ws".to_owned(),
            reconnect_base_delay: Duration::from_millis(1000),
            max_reconnect_attempts: 5,
        };
        let session = ChatSession::open(config, "room-1", "tok", channel.clone());
        (session, channel)
    }

    fn sent_types(channel: &FakeChannel) -> Vec<String> {
        channel
            .sent_json()
            .iter()
            .map(|frame| frame["type"].as_str().unwrap_or_default().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn processes_signals_then_input_and_leaves_on_quit() {
        let (mut session, channel) = session();
        let history = StubHistory::with_result(Ok(vec![sample_message("h1", "from history")]));
        let (tx, mut signals) = mpsc::unbounded_channel();
        tx.send(LinkSignal { epoch: 1, event: LinkEvent::Opened }).expect("queue signal");
        tx.send(LinkSignal {
            epoch: 1,
            event: LinkEvent::Frame(r#"{"id":"m1","chat":"live hello","userId":2,"username":"bo"}"#.to_owned()),
        })
        .expect("queue signal");
        let mut events = MockEventSource::from(vec![
            AppEvent::Submit("hi".to_owned()),
            AppEvent::QuitRequested,
        ]);
        let mut console = ConsoleRenderer::new(Vec::new(), false);

        run_room(
            &mut session,
            &history,
            &mut events,
            &mut signals,
            &mut console,
            future::pending(),
        )
        .await
        .expect("shell should finish");

        assert_eq!(
            sent_types(&channel),
            ["authenticate", "join_room", "send_message", "leave_room"]
        );
        assert_eq!(channel.closed(), 1);
        let output = String::from_utf8(console.output().clone()).expect("utf8");
        assert!(output.contains("from history"));
        assert!(output.contains("live hello"));
    }

    #[tokio::test]
    async fn history_failure_is_reported_without_stopping() {
        let (mut session, _) = session();
        let history = StubHistory::with_result(Err(HistorySourceError::Unauthorized));
        let (_tx, mut signals) = mpsc::unbounded_channel();
        let mut events = MockEventSource::from(vec![AppEvent::ReloadHistory]);
        let mut console = ConsoleRenderer::new(Vec::new(), false);

        run_room(
            &mut session,
            &history,
            &mut events,
            &mut signals,
            &mut console,
            future::pending(),
        )
        .await
        .expect("shell should finish");

        let output = String::from_utf8(console.output().clone()).expect("utf8");
        assert_eq!(output.matches("could not load history").count(), 2);
        assert_eq!(history.requested.borrow().len(), 2);
    }

    #[tokio::test]
    async fn server_history_notification_triggers_refetch() {
        let (mut session, _) = session();
        let history = StubHistory::with_result(Ok(vec![]));
        let (tx, mut signals) = mpsc::unbounded_channel();
        tx.send(LinkSignal { epoch: 1, event: LinkEvent::Opened }).expect("queue signal");
        tx.send(LinkSignal {
            epoch: 1,
            event: LinkEvent::Frame(r#"{"type":"message_history","payload":{}}"#.to_owned()),
        })
        .expect("queue signal");
        let mut events = MockEventSource::from(vec![AppEvent::QuitRequested]);
        let mut console = ConsoleRenderer::new(Vec::new(), false);

        run_room(
            &mut session,
            &history,
            &mut events,
            &mut signals,
            &mut console,
            future::pending(),
        )
        .await
        .expect("shell should finish");

        assert_eq!(history.requested.borrow().len(), 2);
    }

    #[tokio::test]
    async fn shutdown_future_ends_the_loop() {
        let (mut session, channel) = session();
        let history = StubHistory::with_result(Ok(vec![]));
        let (_tx, mut signals) = mpsc::unbounded_channel();
        let mut events = MockEventSource::from(vec![]);
        let mut console = ConsoleRenderer::new(Vec::new(), false);

        run_room(
            &mut session,
            &history,
            &mut events,
            &mut signals,
            &mut console,
            future::ready(()),
        )
        .await
        .expect("shell should finish");

        assert_eq!(channel.closed(), 1);
    }
}
