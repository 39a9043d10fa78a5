//! Slash commands understood by the terminal panel.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    OpenPanel,
    ClosePanel,
    TogglePanel,
    Disconnect,
    Status,
    Help,
    Quit,
    Submit(String),
}

pub const HELP: &str = "\
/open        open the panel (connects when no channel exists)
/close       close the panel
/toggle      toggle the panel
/disconnect  close the current connection
/status      show the connection status
/quit        exit
anything else is sent as a message";

pub fn parse_line(line: &str) -> InputCommand {
    let trimmed = line.trim();
    match trimmed {
        "/open" => InputCommand::OpenPanel,
        "/close" => InputCommand::ClosePanel,
        "/toggle" => InputCommand::TogglePanel,
        "/disconnect" => InputCommand::Disconnect,
        "/status" => InputCommand::Status,
        "/help" | "/?" => InputCommand::Help,
        "/quit" | "/exit" => InputCommand::Quit,
        _ => InputCommand::Submit(line.to_string()),
    }
}
