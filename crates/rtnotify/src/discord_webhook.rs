//! Discord Webhook への通知。

use std::time::Duration;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use rtnotify_core::{Notifier, NotifyError, Post};
use serde::Serialize;
use tracing::debug;

use crate::config::WebhookConfig;

/// 埋め込みの左端に表示する色 (X のブランドカラー)
const EMBED_COLOR: u32 = 0x1DA1F2;
/// フッターに表示する配信元
const FOOTER_TEXT: &str = "x.com";

#[derive(Debug, Serialize, PartialEq)]
struct Payload<'a> {
    embeds: Vec<Embed<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    avatar_url: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
struct Embed<'a> {
    description: &'a str,
    url: &'a str,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    author: EmbedAuthor<'a>,
    footer: EmbedFooter,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmbedAuthor<'a> {
    name: String,
    url: &'a str,
    icon_url: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmbedFooter {
    text: &'static str,
}

/// Webhook でポストを 1 件ずつ送る通知先。
pub struct DiscordWebhook {
    http_client: reqwest::Client,
    config: WebhookConfig,
}

impl DiscordWebhook {
    pub fn new(config: WebhookConfig, timeout: Duration, user_agent: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client for Discord webhook")?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, post: &Post) -> Result<u16, NotifyError> {
        let response = self
            .http_client
            .post(&self.config.url)
            .json(&build_payload(&self.config, post))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        debug!(post_id = %post.id(), status, "Webhook responded");

        Ok(status)
    }
}

fn build_payload<'a>(config: &'a WebhookConfig, post: &'a Post) -> Payload<'a> {
    let embed = Embed {
        description: post.body(),
        url: post.url(),
        color: EMBED_COLOR,
        timestamp: post.published_at().ok().map(|t| t.to_rfc3339()),
        author: EmbedAuthor {
            name: format!("{} ({})", post.author_name(), post.author_id()),
            url: post.url(),
            icon_url: post.icon(),
        },
        footer: EmbedFooter { text: FOOTER_TEXT },
    };

    Payload {
        embeds: vec![embed],
        username: config.username.as_deref(),
        avatar_url: &config.avatar_url,
    }
}
