//! WebSocket implementation of [`Channel`] on top of tokio-tungstenite.
//!
//! Every `open` spawns one connection task and every armed timer one sleep
//! task. Both report back through an unbounded queue as [`LinkSignal`]s
//! tagged with the epoch they were started in; closing bumps the epoch so
//! signals from a detached connection are dropped by the driver.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::infra::secrets::redact_url_token;

use super::channel::{Channel, ChannelError, LinkEvent};

const WS_CONNECT_FAILED: &str = "WS_CONNECT_FAILED";
const WS_READ_FAILED: &str = "WS_READ_FAILED";
const WS_WRITE_FAILED: &str = "WS_WRITE_FAILED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSignal {
    pub epoch: u64,
    pub event: LinkEvent,
}

#[derive(Debug)]
pub struct WsChannel {
    runtime: Handle,
    signals: mpsc::UnboundedSender<LinkSignal>,
    epoch: u64,
    writer: Option<mpsc::UnboundedSender<String>>,
    timer: Option<JoinHandle<()>>,
}

impl WsChannel {
    pub fn new(runtime: Handle) -> (Self, mpsc::UnboundedReceiver<LinkSignal>) {
        let (signals, rx) = mpsc::unbounded_channel();
        (
            Self {
                runtime,
                signals,
                epoch: 0,
                writer: None,
                timer: None,
            },
            rx,
        )
    }
}

impl Channel for WsChannel {
    fn open(&mut self, url: &str) {
        self.writer = None;
        self.epoch += 1;

        let (writer, outbound) = mpsc::unbounded_channel();
        self.writer = Some(writer);
        self.runtime.spawn(run_connection(
            url.to_owned(),
            self.epoch,
            self.signals.clone(),
            outbound,
        ));
    }

    fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        self.writer
            .as_ref()
            .ok_or(ChannelError::NotOpen)?
            .send(frame)
            .map_err(|_| ChannelError::WriterClosed)
    }

    /// Dropping the writer lets the connection task flush queued frames and
    /// send a close frame on its own.
    fn close(&mut self) {
        self.writer = None;
        self.epoch += 1;
    }

    fn arm_timer(&mut self, delay: Duration) {
        self.disarm_timer();
        let signals = self.signals.clone();
        let epoch = self.epoch;
        self.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = signals.send(LinkSignal {
                epoch,
                event: LinkEvent::TimerFired,
            });
        }));
    }

    fn disarm_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.disarm_timer();
    }
}

async fn run_connection(
    url: String,
    epoch: u64,
    signals: mpsc::UnboundedSender<LinkSignal>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let report = |event: LinkEvent| {
        let _ = signals.send(LinkSignal { epoch, event });
    };

    tracing::debug!(url = %redact_url_token(&url), epoch, "connecting websocket");
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(error) => {
            tracing::warn!(code = WS_CONNECT_FAILED, error = %error, "websocket connect failed");
            report(LinkEvent::Error(error.to_string()));
            report(LinkEvent::Closed(error.to_string()));
            return;
        }
    };

    report(LinkEvent::Opened);
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(error) = write.send(Message::Text(text.into())).await {
                        tracing::warn!(code = WS_WRITE_FAILED, error = %error, "websocket write failed");
                        report(LinkEvent::Error(error.to_string()));
                        report(LinkEvent::Closed(error.to_string()));
                        return;
                    }
                }
                None => {
                    let _ = write.send(Message::Close(None)).await;
                    tracing::debug!(epoch, "websocket closed by client");
                    return;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => report(LinkEvent::Frame(text.as_str().to_owned())),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => report(LinkEvent::Frame(text)),
                    Err(_) => tracing::debug!(len = bytes.len(), "ignoring non-utf8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|frame| frame.reason.as_str().to_owned())
                        .unwrap_or_default();
                    report(LinkEvent::Closed(reason));
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::warn!(code = WS_READ_FAILED, error = %error, "websocket read failed");
                    report(LinkEvent::Error(error.to_string()));
                    report(LinkEvent::Closed(error.to_string()));
                    return;
                }
                None => {
                    report(LinkEvent::Closed("connection ended".to_owned()));
                    return;
                }
            },
        }
    }
}
