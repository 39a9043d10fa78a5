//! Channel seam between the session state machine and the socket.
//!
//! A [`ChannelConnector`] returns a handle immediately and reports progress
//! asynchronously through [`ChannelSignal`]s tagged with the attempt that
//! opened it. The session drains those signals one at a time.

use futures::{SinkExt, StreamExt};
use shared::{
    domain::ChannelAttempt,
    protocol::{ChannelEvent, ChannelSignal},
};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ChannelError;

pub type SignalSender = mpsc::UnboundedSender<ChannelSignal>;

pub fn signal_queue() -> (SignalSender, ChannelSignals) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSignals { rx })
}

/// Receiving half of the signal queue, handed to whoever drives the session.
pub struct ChannelSignals {
    rx: mpsc::UnboundedReceiver<ChannelSignal>,
}

impl ChannelSignals {
    pub async fn recv(&mut self) -> Option<ChannelSignal> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChannelSignal> {
        self.rx.try_recv().ok()
    }
}

/// An open (or opening) channel. Owned exclusively by one session.
pub trait ChatChannel: Send {
    fn send_text(&mut self, text: &str) -> Result<(), ChannelError>;
    fn close(&mut self);
}

pub trait ChannelConnector: Send + Sync {
    /// Starts opening a channel to `url`. Must not block; the outcome arrives
    /// later as `Opened`, `Failed` or `Closed` on `signals`.
    fn open(
        &self,
        url: &Url,
        attempt: ChannelAttempt,
        signals: SignalSender,
    ) -> Box<dyn ChatChannel>;
}

enum Outbound {
    Text(String),
    Close,
}

struct WsChannel {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl ChatChannel for WsChannel {
    fn send_text(&mut self, text: &str) -> Result<(), ChannelError> {
        self.outbound
            .send(Outbound::Text(text.to_string()))
            .map_err(|_| ChannelError::Closed)
    }

    fn close(&mut self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

/// Opens WebSocket channels on the ambient tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl ChannelConnector for WsConnector {
    fn open(
        &self,
        url: &Url,
        attempt: ChannelAttempt,
        signals: SignalSender,
    ) -> Box<dyn ChatChannel> {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(run_ws_channel(url.clone(), attempt, signals, outbound_rx));
            }
            Err(err) => {
                warn!(attempt = attempt.0, "no tokio runtime for websocket channel: {err}");
                let _ = signals.send(ChannelSignal::new(
                    attempt,
                    ChannelEvent::failed(format!("no async runtime available: {err}")),
                ));
            }
        }
        Box::new(WsChannel { outbound })
    }
}

async fn run_ws_channel(
    url: Url,
    attempt: ChannelAttempt,
    signals: SignalSender,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
) {
    let emit = |event: ChannelEvent| {
        let _ = signals.send(ChannelSignal::new(attempt, event));
    };

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(err) => {
            warn!(attempt = attempt.0, %url, "websocket connect failed: {err}");
            emit(ChannelEvent::failed(format!(
                "failed to connect websocket {url}: {err}"
            )));
            return;
        }
    };
    info!(attempt = attempt.0, %url, "websocket connected");
    emit(ChannelEvent::Opened);

    let (mut writer, mut reader) = ws_stream.split();
    let reason = loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(Outbound::Text(text)) => {
                    if let Err(err) = writer.send(Message::Text(text)).await {
                        emit(ChannelEvent::failed(format!("websocket send failed: {err}")));
                        return;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = writer.send(Message::Close(None)).await;
                    break "closed locally".to_string();
                }
            },
            incoming = reader.next() => match incoming {
                Some(Ok(Message::Text(text))) => emit(ChannelEvent::text(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    debug!(attempt = attempt.0, len = bytes.len(), "ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|frame| format!("closed by peer ({}): {}", frame.code, frame.reason))
                        .unwrap_or_else(|| "closed by peer".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(attempt = attempt.0, "websocket receive failed: {err}");
                    emit(ChannelEvent::failed(format!("websocket receive failed: {err}")));
                    return;
                }
                None => break "stream ended".to_string(),
            },
        }
    };

    info!(attempt = attempt.0, %reason, "websocket closed");
    emit(ChannelEvent::closed(reason));
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
