//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ChatSession, ClientSettings, SendOutcome, SessionEvent, WsConnector};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::{broadcast, mpsc};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(settings, cmd_rx, ui_tx));
    });
}

async fn run_worker(
    settings: ClientSettings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let (mut session, mut signals) =
        match ChatSession::new(settings.session_options(), Arc::new(WsConnector)) {
            Ok(created) => created,
            Err(err) => {
                tracing::error!("failed to create chat session: {err}");
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    err.to_string(),
                )));
                return;
            }
        };
    let mut events = session.subscribe_events();
    let _ = ui_tx.try_send(UiEvent::Ready {
        client_id: session.client_id().to_string(),
    });

    let (cmd_tx, mut commands) = mpsc::unbounded_channel();
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            if cmd_tx.send(cmd).is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            Some(signal) = signals.recv() => session.handle_signal(signal),
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                if !apply_command(&mut session, cmd, &ui_tx) {
                    break;
                }
            }
        }
        forward_session_events(&mut events, &ui_tx);
    }

    let _ = session.close();
    forward_session_events(&mut events, &ui_tx);
    tracing::info!("backend worker stopped");
}

/// Returns `false` when the worker should stop.
fn apply_command(session: &mut ChatSession, cmd: BackendCommand, ui_tx: &Sender<UiEvent>) -> bool {
    let report = |context: UiErrorContext, message: String| {
        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(context, message)));
    };

    match cmd {
        BackendCommand::Connect => {
            if let Err(err) = session.connect() {
                report(UiErrorContext::Connect, err.to_string());
            }
        }
        BackendCommand::SendMessage { text } => match session.send(&text) {
            Ok(SendOutcome::Sent | SendOutcome::IgnoredBlank) => {}
            Ok(SendOutcome::NotConnected) => {
                report(UiErrorContext::SendMessage, "not connected".to_string());
            }
            Err(err) => report(UiErrorContext::SendMessage, err.to_string()),
        },
        BackendCommand::Disconnect => {
            if let Err(err) = session.close() {
                report(UiErrorContext::Disconnect, err.to_string());
            }
        }
        BackendCommand::Shutdown => return false,
    }
    true
}

fn forward_session_events(events: &mut broadcast::Receiver<SessionEvent>, ui_tx: &Sender<UiEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => {
                if ui_tx.send(UiEvent::Session(event)).is_err() {
                    return;
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session event stream lagged");
            }
            Err(_) => return,
        }
    }
}
