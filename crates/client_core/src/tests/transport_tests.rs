use super::*;
use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use shared::domain::{ClientId, ConnectionState, Origin};
use tokio::{net::TcpListener, time::timeout};

use crate::{
    endpoint::chat_endpoint,
    session::{ChatSession, PendingReplyPolicy, SendOutcome, SessionOptions},
};

async fn echo_handler(ws: WebSocketUpgrade, Path(client_id): Path<String>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| echo_connection(socket, client_id))
}

async fn echo_connection(mut socket: WebSocket, client_id: String) {
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            WsMessage::Text(text) if text == "bye" => {
                let _ = socket.send(WsMessage::Close(None)).await;
                break;
            }
            WsMessage::Text(text) => {
                let reply = WsMessage::Text(format!("{client_id}: {text}"));
                if socket.send(reply).await.is_err() {
                    break;
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }
}

async fn spawn_echo_server() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route("/ws/:client_id", get(echo_handler));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("ws://{addr}/ws"))
}

async fn next_signal(signals: &mut ChannelSignals) -> ChannelSignal {
    timeout(Duration::from_secs(5), signals.recv())
        .await
        .expect("signal timeout")
        .expect("signal queue open")
}

async fn drive_until(
    session: &mut ChatSession,
    signals: &mut ChannelSignals,
    done: impl Fn(&ChatSession) -> bool,
) {
    while !done(session) {
        let signal = next_signal(signals).await;
        session.handle_signal(signal);
    }
}

#[tokio::test]
async fn ws_channel_relays_text_frames_and_local_close() {
    let base = spawn_echo_server().await.expect("server");
    let url = chat_endpoint(&base, &ClientId::from_raw("user_ws")).expect("endpoint");
    let (tx, mut signals) = signal_queue();
    let attempt = ChannelAttempt(1);

    let mut channel = WsConnector.open(&url, attempt, tx);
    assert_eq!(
        next_signal(&mut signals).await,
        ChannelSignal::new(attempt, ChannelEvent::Opened)
    );

    channel.send_text("hello").expect("send");
    assert_eq!(
        next_signal(&mut signals).await,
        ChannelSignal::new(attempt, ChannelEvent::text("user_ws: hello"))
    );

    channel.close();
    let closed = next_signal(&mut signals).await;
    assert_eq!(closed.attempt, attempt);
    assert!(matches!(closed.event, ChannelEvent::Closed { .. }));
}

#[tokio::test]
async fn ws_channel_reports_peer_close() {
    let base = spawn_echo_server().await.expect("server");
    let url = chat_endpoint(&base, &ClientId::from_raw("user_ws")).expect("endpoint");
    let (tx, mut signals) = signal_queue();

    let mut channel = WsConnector.open(&url, ChannelAttempt(7), tx);
    assert_eq!(next_signal(&mut signals).await.event, ChannelEvent::Opened);

    channel.send_text("bye").expect("send");
    let closed = next_signal(&mut signals).await;
    assert!(matches!(closed.event, ChannelEvent::Closed { .. }));
}

#[tokio::test]
async fn ws_channel_reports_connect_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let url = chat_endpoint(&format!("ws://{addr}/ws"), &ClientId::from_raw("user_ws"))
        .expect("endpoint");
    let (tx, mut signals) = signal_queue();

    let _channel = WsConnector.open(&url, ChannelAttempt(1), tx);

    let signal = next_signal(&mut signals).await;
    assert!(matches!(signal.event, ChannelEvent::Failed { .. }));
}

#[test]
fn ws_connector_without_runtime_fails_instead_of_panicking() {
    let url = chat_endpoint("ws://127.0.0.1:9/ws", &ClientId::from_raw("user_ws"))
        .expect("endpoint");
    let (tx, mut signals) = signal_queue();

    let _channel = WsConnector.open(&url, ChannelAttempt(1), tx);

    let signal = signals.try_recv().expect("failure signal");
    assert!(matches!(signal.event, ChannelEvent::Failed { .. }));
}

#[tokio::test]
async fn session_round_trip_over_websocket() {
    let base = spawn_echo_server().await.expect("server");
    let (mut session, mut signals) = ChatSession::new(
        SessionOptions {
            endpoint_base: base,
            client_id: ClientId::from_raw("user_e2e"),
            pending_reply_policy: PendingReplyPolicy::Retain,
        },
        Arc::new(WsConnector),
    )
    .expect("session");

    session.connect().expect("connect");
    drive_until(&mut session, &mut signals, |s| {
        s.state() == ConnectionState::Connected
    })
    .await;

    assert_eq!(session.send("hello").expect("send"), SendOutcome::Sent);
    assert!(session.pending_reply());
    drive_until(&mut session, &mut signals, |s| s.transcript().len() == 2).await;

    let reply = session.transcript().last().expect("reply");
    assert_eq!(reply.origin, Origin::Remote);
    assert_eq!(reply.text, "user_e2e: hello");
    assert!(!session.pending_reply());

    session.send("bye").expect("send");
    drive_until(&mut session, &mut signals, |s| {
        s.state() == ConnectionState::Disconnected
    })
    .await;
    assert!(!session.has_channel());
    assert!(session.pending_reply());
}
