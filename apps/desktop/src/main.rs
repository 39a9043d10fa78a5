use std::{io, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings, ChatSession, PanelCommand, PanelModel, SendOutcome, SessionEvent, WsConnector,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast::error::TryRecvError, mpsc},
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{parse_line, InputCommand, HELP};
use render::Printer;

#[derive(Parser, Debug)]
#[command(about = "Terminal chat panel for the assistant backend")]
struct Args {
    /// Settings file (defaults to ./chat_client.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// WebSocket base URL; the client id is appended as the last path segment.
    #[arg(long)]
    endpoint: Option<String>,
    /// Open the panel (and connect) immediately.
    #[arg(long)]
    open: bool,
    /// Print session events as JSON lines instead of a transcript.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint_base = endpoint;
    }

    let (mut session, mut signals) =
        ChatSession::new(settings.session_options(), Arc::new(WsConnector))
            .context("failed to create chat session")?;
    let mut events = session.subscribe_events();
    let mut panel = PanelModel::new(settings.title.clone(), settings.greeting.clone());
    let mut printer = Printer::new(args.json, io::stdout());
    printer.header(&panel)?;
    printer.notice(&format!("client id {}", session.client_id()))?;

    let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    if args.open {
        toggle_panel(&mut panel, &mut session, &mut printer)?;
    }

    loop {
        tokio::select! {
            Some(signal) = signals.recv() => session.handle_signal(signal),
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                match parse_line(&line) {
                    InputCommand::Quit => break,
                    InputCommand::OpenPanel if !panel.is_open() => {
                        toggle_panel(&mut panel, &mut session, &mut printer)?;
                    }
                    InputCommand::ClosePanel if panel.is_open() => {
                        toggle_panel(&mut panel, &mut session, &mut printer)?;
                    }
                    InputCommand::TogglePanel => {
                        toggle_panel(&mut panel, &mut session, &mut printer)?;
                    }
                    InputCommand::OpenPanel | InputCommand::ClosePanel => printer.status(&panel)?,
                    InputCommand::Disconnect => {
                        if let Err(err) = session.close() {
                            printer.notice(&err.to_string())?;
                        }
                    }
                    InputCommand::Status => printer.status(&panel)?,
                    InputCommand::Help => printer.notice(HELP)?,
                    InputCommand::Submit(text) => {
                        submit(&mut panel, &mut session, &mut printer, text)?;
                    }
                }
            }
        }

        loop {
            match events.try_recv() {
                Ok(event) => {
                    panel.apply(&event);
                    printer.event(&event, &panel)?;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "session event stream lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    if session.close().is_ok() {
        drain_final_events(&mut events, &mut panel, &mut printer)?;
    }
    Ok(())
}

fn toggle_panel<W: io::Write>(
    panel: &mut PanelModel,
    session: &mut ChatSession,
    printer: &mut Printer<W>,
) -> Result<()> {
    match panel.toggle() {
        Some(PanelCommand::Connect) => {
            if let Err(err) = session.connect() {
                printer.notice(&err.to_string())?;
            }
        }
        Some(PanelCommand::Send(_)) | None => {}
    }
    printer.status(panel)?;
    Ok(())
}

fn submit<W: io::Write>(
    panel: &mut PanelModel,
    session: &mut ChatSession,
    printer: &mut Printer<W>,
    text: String,
) -> Result<()> {
    if !panel.is_open() {
        printer.notice("panel is closed; /open it first")?;
        return Ok(());
    }
    panel.input = text;
    let Some(PanelCommand::Send(text)) = panel.take_submission() else {
        if !panel.submit_enabled() {
            printer.notice("not connected; message not sent")?;
        }
        panel.input.clear();
        return Ok(());
    };

    match session.send(&text) {
        Ok(SendOutcome::Sent | SendOutcome::IgnoredBlank) => {}
        Ok(SendOutcome::NotConnected) => printer.notice("not connected; message not sent")?,
        Err(err) => printer.notice(&format!("send failed: {err}"))?,
    }
    Ok(())
}

fn drain_final_events<W: io::Write>(
    events: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
    panel: &mut PanelModel,
    printer: &mut Printer<W>,
) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        panel.apply(&event);
        printer.event(&event, panel)?;
    }
    Ok(())
}
