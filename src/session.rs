use anyhow::{Context, Result};
use log::debug;

use crate::auth::oauth::GoogleOAuth;
use crate::auth::prompt::{CodePrompt, ConsolePrompt, LoopbackPrompt};
use crate::auth::secrets::Credentials;
use crate::auth::token_manager::TokenManager;
use crate::auth::tokens_file::{StoredToken, TokenCache};
use crate::config::{AuthMode, Settings};
use crate::mail::gmail_client::GmailClient;

/// An authenticated mailbox handle, built once at startup.
pub struct Session {
    token: StoredToken,
    mail: GmailClient,
}

impl Session {
    /// Load credentials, obtain a token and build the API client.
    ///
    /// Unreadable secrets and a rejected authorization code are fatal.
    pub fn establish(settings: &Settings) -> Result<Self> {
        let creds = Credentials::load(&settings.credentials_path)?;
        let prompt: Box<dyn CodePrompt> = match settings.auth_mode {
            AuthMode::Console => Box::new(ConsolePrompt),
            AuthMode::Loopback => Box::new(LoopbackPrompt::new(&creds.redirect_uri)?),
        };
        Self::establish_with(settings, &creds, prompt.as_ref())
    }

    /// Like [`Session::establish`] with already-loaded credentials and a
    /// caller-chosen prompt.
    pub fn establish_with(
        settings: &Settings,
        creds: &Credentials,
        prompt: &dyn CodePrompt,
    ) -> Result<Self> {
        let flow = GoogleOAuth::new(creds)?;
        let cache = TokenCache::new(&settings.token_path);
        let now_ms = chrono::Utc::now().timestamp_millis();

        let token = TokenManager::new(&cache, &flow, prompt).obtain_token(now_ms)?;
        debug!("authenticated as client {}", creds.client_id);

        let mail = GmailClient::with_base_url(&settings.api_base, token.access_token.clone())
            .context("building Gmail client")?;
        Ok(Self { token, mail })
    }

    pub fn mail(&self) -> &GmailClient {
        &self.mail
    }

    pub fn token(&self) -> &StoredToken {
        &self.token
    }
}
