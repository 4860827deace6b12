use log::{debug, info, warn};

use crate::auth::oauth::AuthorizationFlow;
use crate::auth::prompt::CodePrompt;
use crate::auth::tokens_file::{StoredToken, TokenCache};
use crate::error::AuthError;

/// Decides between the cached token, a refresh, and the interactive grant.
pub struct TokenManager<'a> {
    cache: &'a TokenCache,
    flow: &'a dyn AuthorizationFlow,
    prompt: &'a dyn CodePrompt,
}

impl<'a> TokenManager<'a> {
    pub fn new(
        cache: &'a TokenCache,
        flow: &'a dyn AuthorizationFlow,
        prompt: &'a dyn CodePrompt,
    ) -> Self {
        Self {
            cache,
            flow,
            prompt,
        }
    }

    /// Returns a usable token.
    ///
    /// 1) cached and not expired
    /// 2) cached, expired, refreshable
    /// 3) otherwise the interactive authorization-code grant
    ///
    /// Fresh tokens are written back to the cache; a failed write only
    /// costs a prompt on the next run.
    pub fn obtain_token(&self, now_ms: i64) -> Result<StoredToken, AuthError> {
        if let Some(cached) = self.cache.load() {
            if !cached.is_expired(now_ms) {
                debug!("using cached access token");
                return Ok(cached);
            }

            if let Some(refresh_token) = cached.refresh_token.as_deref() {
                info!("Cached token expired; refreshing");
                match self.flow.refresh(refresh_token) {
                    Ok(mut fresh) => {
                        // Google omits the refresh token on refresh grants.
                        if fresh.refresh_token.is_none() {
                            fresh.refresh_token = cached.refresh_token.clone();
                        }
                        self.persist(&fresh);
                        return Ok(fresh);
                    }
                    Err(e) => warn!("{e}; falling back to interactive authorization"),
                }
            } else {
                info!("Cached token expired and has no refresh token");
            }
        } else {
            info!("No cached token. Will attempt fetching a fresh token.");
        }

        let token = self.interactive()?;
        self.persist(&token);
        Ok(token)
    }

    fn interactive(&self) -> Result<StoredToken, AuthError> {
        let url = self.flow.authorize_url();
        let code = self.prompt.obtain_code(&url)?;
        self.flow.exchange_code(&code)
    }

    fn persist(&self, token: &StoredToken) {
        if let Err(e) = self.cache.save(token) {
            warn!(
                "Failed to persist token to {}: {e}. You'll be prompted for authentication again next time.",
                self.cache.path().display()
            );
        }
    }
}
