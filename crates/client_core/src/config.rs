use std::{fs, io, path::Path};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use shared::domain::{ClientId, DEFAULT_CLIENT_ID_PREFIX};

use crate::{
    endpoint::DEFAULT_ENDPOINT_BASE,
    panel::{DEFAULT_GREETING, DEFAULT_TITLE},
    session::{PendingReplyPolicy, SessionOptions},
};

pub const DEFAULT_SETTINGS_FILE: &str = "chat_client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint_base: String,
    pub client_id_prefix: String,
    pub pending_reply_policy: PendingReplyPolicy,
    pub title: String,
    pub greeting: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint_base: DEFAULT_ENDPOINT_BASE.into(),
            client_id_prefix: DEFAULT_CLIENT_ID_PREFIX.into(),
            pending_reply_policy: PendingReplyPolicy::Retain,
            title: DEFAULT_TITLE.into(),
            greeting: Some(DEFAULT_GREETING.into()),
        }
    }
}

impl ClientSettings {
    /// Session options with a freshly generated client id.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            endpoint_base: self.endpoint_base.clone(),
            client_id: ClientId::generate(&self.client_id_prefix),
            pending_reply_policy: self.pending_reply_policy,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    endpoint_base: Option<String>,
    client_id_prefix: Option<String>,
    pending_reply_policy: Option<PendingReplyPolicy>,
    title: Option<String>,
    greeting: Option<String>,
}

/// Defaults, then `path` (or `chat_client.toml` when absent), then the
/// process environment.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let (path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(path) {
        Ok(raw) => {
            apply_file_settings(&mut settings, &raw)
                .with_context(|| format!("invalid settings file '{}'", path.display()))?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file_settings(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.endpoint_base {
        settings.endpoint_base = v;
    }
    if let Some(v) = file_cfg.client_id_prefix {
        settings.client_id_prefix = v;
    }
    if let Some(v) = file_cfg.pending_reply_policy {
        settings.pending_reply_policy = v;
    }
    if let Some(v) = file_cfg.title {
        settings.title = v;
    }
    if let Some(v) = file_cfg.greeting {
        settings.greeting = non_empty(v);
    }
    Ok(())
}

fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("CHAT_ENDPOINT") {
        settings.endpoint_base = v;
    }
    if let Some(v) = lookup("APP__ENDPOINT_BASE") {
        settings.endpoint_base = v;
    }

    if let Some(v) = lookup("APP__CLIENT_ID_PREFIX") {
        settings.client_id_prefix = v;
    }

    if let Some(v) = lookup("APP__PENDING_REPLY_POLICY") {
        settings.pending_reply_policy = PendingReplyPolicy::parse(&v)
            .ok_or_else(|| anyhow!("APP__PENDING_REPLY_POLICY: unknown policy '{v}'"))?;
    }

    if let Some(v) = lookup("APP__TITLE") {
        settings.title = v;
    }
    if let Some(v) = lookup("APP__GREETING") {
        settings.greeting = non_empty(v);
    }

    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
