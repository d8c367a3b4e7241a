use serde::Serialize;

use crate::config::Discord;
use crate::notifier::{EventKind, NotificationPayload};

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            content: None,
            embeds: Vec::new(),
        }
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders notification payloads as Discord webhook messages
#[derive(Debug, Clone, Default)]
pub struct DiscordManager;

impl DiscordManager {
    pub fn new() -> Self {
        Self
    }

    pub fn build_embed(&self, payload: &NotificationPayload) -> Embed {
        let (title, description, color) = match payload.event_kind {
            EventKind::Down => (
                format!("🔴 Site Down: {}", payload.target_name),
                format!("**{}** is not reachable", payload.target_name),
                15158332, // Red
            ),
            EventKind::Up => (
                format!("✅ Site Recovered: {}", payload.target_name),
                format!("**{}** is reachable again", payload.target_name),
                3066993, // Green
            ),
        };

        let link = |name: &str, url: &str| EmbedField {
            name: name.to_string(),
            value: format!("[open]({url})"),
            inline: true,
        };

        Embed {
            title: Some(title),
            description: Some(description),
            url: Some(payload.canonical_url.clone()),
            color: Some(color),
            fields: vec![
                EmbedField {
                    name: "📋 Status".to_string(),
                    value: payload.message.clone(),
                    inline: false,
                },
                link("🛠️ Admin", &payload.admin_url),
                link("📊 Dashboard", &payload.dashboard_url),
                link("🔁 Check again", &payload.recheck_url),
            ],
            footer: Some(EmbedFooter {
                text: format!("Site: {} | {}", payload.target_name, payload.canonical_url),
            }),
            timestamp: Some(payload.timestamp.clone()),
        }
    }

    pub fn build_message(&self, discord: &Discord, payload: &NotificationPayload) -> Message {
        let mut builder = MessageBuilder::new().add_embed(self.build_embed(payload));
        if let Some(user_id) = &discord.user_id {
            let emoji = match payload.event_kind {
                EventKind::Down => "🔴",
                EventKind::Up => "✅",
            };
            builder = builder.content(format!("{} `{}` <@{user_id}>", emoji, payload.target_name));
        }
        builder.build()
    }
}
