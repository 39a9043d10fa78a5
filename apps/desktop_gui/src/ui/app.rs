use std::time::Duration;

use client_core::{
    panel::{INPUT_PLACEHOLDER, TYPING_LABEL},
    ClientSettings, PanelCommand, PanelModel, SessionEvent, StatusDot, TranscriptView,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::Origin;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{events::UiEvent, orchestration::dispatch_backend_command};
use crate::ui::transcript_pane::TranscriptPane;

const PANEL_WIDTH: f32 = 400.0;
const TOGGLE_SIZE: f32 = 60.0;
const TOGGLE_MARGIN: f32 = 20.0;
const INPUT_ROW_HEIGHT: f32 = 36.0;
const SEND_BUTTON_WIDTH: f32 = 72.0;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0x00, 0x7a, 0xff);
const BOT_BUBBLE: egui::Color32 = egui::Color32::from_rgb(0xf0, 0xf0, 0xf0);
const BOT_TEXT: egui::Color32 = egui::Color32::from_rgb(0x33, 0x33, 0x33);
const DOT_CONNECTED: egui::Color32 = egui::Color32::from_rgb(0x4c, 0xaf, 0x50);
const DOT_DISCONNECTED: egui::Color32 = egui::Color32::from_rgb(0xf4, 0x43, 0x36);

pub struct ChatPanelApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    panel: PanelModel,
    transcript: TranscriptPane,
    client_id: Option<String>,
    status_note: String,
}

impl ChatPanelApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: &ClientSettings,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            panel: PanelModel::new(settings.title.clone(), settings.greeting.clone()),
            transcript: TranscriptPane::default(),
            client_id: None,
            status_note: String::new(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Ready { client_id } => self.client_id = Some(client_id),
                UiEvent::Session(event) => {
                    self.panel.apply(&event);
                    match &event {
                        SessionEvent::MessageAppended(message) => {
                            self.transcript.append(message);
                        }
                        SessionEvent::StateChanged(_) => self.status_note.clear(),
                        SessionEvent::PendingReplyChanged(_) | SessionEvent::TransportFailed(_) => {}
                    }
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "backend error: {}", err.message());
                    self.status_note = err.user_message();
                }
            }
        }
    }

    fn toggle(&mut self) {
        if let Some(PanelCommand::Connect) = self.panel.toggle() {
            dispatch_backend_command(&self.cmd_tx, BackendCommand::Connect, &mut self.status_note);
        }
    }

    fn submit(&mut self) {
        if let Some(PanelCommand::Send(text)) = self.panel.take_submission() {
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::SendMessage { text },
                &mut self.status_note,
            );
        }
    }

    fn show_host_page(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(24.0);
            ui.heading("Chat panel");
            ui.label("Open the assistant with the chat button in the bottom-right corner.");
            if let Some(client_id) = &self.client_id {
                ui.small(format!("client id: {client_id}"));
            }
        });
    }

    fn show_toggle(&mut self, ctx: &egui::Context) {
        let x_offset = if self.panel.is_open() {
            -(PANEL_WIDTH + TOGGLE_MARGIN)
        } else {
            -TOGGLE_MARGIN
        };
        egui::Area::new(egui::Id::new("ai_chat_toggle"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(x_offset, -TOGGLE_MARGIN))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let button = egui::Button::new(
                    egui::RichText::new("💬").size(24.0).color(egui::Color32::WHITE),
                )
                .fill(ACCENT)
                .min_size(egui::vec2(TOGGLE_SIZE, TOGGLE_SIZE));
                if ui.add(button).on_hover_text("Chat with the assistant").clicked() {
                    self.toggle();
                }
            });
    }

    fn show_chat_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("ai_chat_panel")
            .exact_width(PANEL_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                self.show_header(ui);
                ui.separator();

                let footer_height = INPUT_ROW_HEIGHT + 28.0;
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .max_height((ui.available_height() - footer_height).max(0.0))
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if let Some(greeting) = self.panel.greeting() {
                            message_bubble(ui, Origin::Remote, greeting, None);
                        }
                        for message in self.transcript.messages() {
                            let time = message
                                .appended_at
                                .with_timezone(&chrono::Local)
                                .format("%H:%M")
                                .to_string();
                            message_bubble(ui, message.origin, &message.text, Some(&time));
                        }
                        if self.panel.typing_visible() {
                            ui.label(egui::RichText::new(TYPING_LABEL).italics().weak());
                        }
                        if self.transcript.take_scroll_request() {
                            ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                        }
                    });

                ui.separator();
                self.show_input_row(ui);
                if !self.status_note.is_empty() {
                    ui.small(&self.status_note);
                } else if let Some(failure) = self.panel.last_failure() {
                    ui.small(failure);
                }
            });
    }

    fn show_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(self.panel.title());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let status = self.panel.status();
                ui.label(status.label);
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                let color = match status.dot {
                    StatusDot::Green => DOT_CONNECTED,
                    StatusDot::Red => DOT_DISCONNECTED,
                };
                ui.painter().circle_filled(rect.center(), 4.0, color);
            });
        });
    }

    fn show_input_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let input_width = (ui.available_width() - SEND_BUTTON_WIDTH - 8.0).max(0.0);
            let response = ui.add_sized(
                [input_width, INPUT_ROW_HEIGHT],
                egui::TextEdit::singleline(&mut self.panel.input).hint_text(INPUT_PLACEHOLDER),
            );
            let enter_pressed =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked_send = ui
                .add_enabled(
                    self.panel.submit_enabled(),
                    egui::Button::new("Send").min_size(egui::vec2(SEND_BUTTON_WIDTH, INPUT_ROW_HEIGHT)),
                )
                .clicked();
            if enter_pressed || clicked_send {
                self.submit();
                response.request_focus();
            }
        });
    }
}

fn message_bubble(ui: &mut egui::Ui, origin: Origin, text: &str, time: Option<&str>) {
    let (align, fill, text_color) = match origin {
        Origin::Local => (egui::Align::Max, ACCENT, egui::Color32::WHITE),
        Origin::Remote => (egui::Align::Min, BOT_BUBBLE, BOT_TEXT),
    };
    ui.with_layout(egui::Layout::top_down(align), |ui| {
        egui::Frame::group(ui.style()).fill(fill).show(ui, |ui| {
            ui.set_max_width(PANEL_WIDTH * 0.8);
            ui.label(egui::RichText::new(text).color(text_color));
            if let Some(time) = time {
                ui.label(egui::RichText::new(time).small().color(text_color));
            }
        });
    });
    ui.add_space(8.0);
}

impl eframe::App for ChatPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        if self.panel.is_open() {
            self.show_chat_panel(ctx);
        }
        self.show_host_page(ctx);
        self.show_toggle(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for ChatPanelApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(BackendCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use shared::domain::{ChatMessage, ConnectionState, MessageSeq};

    fn app() -> (ChatPanelApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = unbounded();
        let (ui_tx, ui_rx) = unbounded();
        let app = ChatPanelApp::new(cmd_tx, ui_rx, &ClientSettings::default());
        (app, cmd_rx, ui_tx)
    }

    fn session(event: SessionEvent) -> UiEvent {
        UiEvent::Session(event)
    }

    #[test]
    fn opening_the_panel_requests_a_connection_once() {
        let (mut app, cmd_rx, ui_tx) = app();

        app.toggle();
        ui_tx
            .send(session(SessionEvent::StateChanged(ConnectionState::Connecting)))
            .expect("send");
        app.process_ui_events();
        app.toggle();
        app.toggle();

        let commands: Vec<_> = cmd_rx.try_iter().collect();
        assert_eq!(commands, vec![BackendCommand::Connect]);
    }

    #[test]
    fn connected_panel_submits_trimmed_input() {
        let (mut app, cmd_rx, ui_tx) = app();
        ui_tx
            .send(session(SessionEvent::StateChanged(ConnectionState::Connected)))
            .expect("send");
        app.process_ui_events();
        assert_eq!(app.panel.status().label, "Connected");

        app.panel.input = "  hello  ".to_string();
        app.submit();
        app.panel.input = "   ".to_string();
        app.submit();

        let commands: Vec<_> = cmd_rx.try_iter().collect();
        assert_eq!(
            commands,
            vec![BackendCommand::SendMessage {
                text: "hello".to_string()
            }]
        );
    }

    #[test]
    fn appended_messages_reach_the_transcript_pane() {
        let (mut app, _cmd_rx, ui_tx) = app();
        let message = ChatMessage {
            seq: MessageSeq(0),
            origin: Origin::Remote,
            text: "Here are three hotels".to_string(),
            appended_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
        };

        ui_tx
            .send(session(SessionEvent::PendingReplyChanged(true)))
            .expect("send");
        ui_tx
            .send(session(SessionEvent::PendingReplyChanged(false)))
            .expect("send");
        ui_tx
            .send(session(SessionEvent::MessageAppended(message)))
            .expect("send");
        app.process_ui_events();

        assert_eq!(app.transcript.messages().len(), 1);
        assert!(!app.panel.typing_visible());
    }

    #[test]
    fn backend_errors_surface_in_status_note() {
        let (mut app, _cmd_rx, ui_tx) = app();
        ui_tx
            .send(UiEvent::Error(
                crate::controller::events::UiError::from_message(
                    crate::controller::events::UiErrorContext::SendMessage,
                    "not connected",
                ),
            ))
            .expect("send");

        app.process_ui_events();

        assert_eq!(app.status_note, "Message not sent; the connection is closed.");
    }
}
