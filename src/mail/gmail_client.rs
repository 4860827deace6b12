use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::domain::message::{Message, MessagePage};
use crate::error::MailError;
use crate::mail::{MailProvider, Result};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail REST client for the authenticated user's mailbox (`users/me`).
pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    /// `base_url` is the API root, normally [`GMAIL_API_BASE`].
    pub fn with_base_url(base_url: &str, access_token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/users/me/messages", self.base_url)
    }
}

impl MailProvider for GmailClient {
    fn list_messages(&self, query: &str, page_token: Option<&str>) -> Result<MessagePage> {
        let mut params = vec![("q", query)];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        debug!("listing messages (page token: {page_token:?})");
        let resp = self
            .http
            .get(self.messages_url())
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()?;

        parse_json(resp)
    }

    fn get_message(&self, id: &str) -> Result<Message> {
        if id.trim().is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(MailError::InvalidId(id.to_string()));
        }

        debug!("fetching message {id}");
        let resp = self
            .http
            .get(format!("{}/{}", self.messages_url(), id))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()?;

        parse_json(resp)
    }
}

fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(MailError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json()?)
}
