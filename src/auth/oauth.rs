use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::reqwest::http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use url::Url;

use crate::auth::GMAIL_READONLY_SCOPE;
use crate::auth::secrets::Credentials;
use crate::auth::tokens_file::StoredToken;
use crate::error::AuthError;

/// The provider side of the authorization-code grant.
pub trait AuthorizationFlow {
    /// Consent page the operator must visit.
    fn authorize_url(&self) -> Url;

    /// Trade an authorization code for tokens.
    fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError>;

    /// Trade a refresh token for a fresh access token.
    fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError>;
}

/// Google's OAuth endpoints, driven through the `oauth2` crate.
pub struct GoogleOAuth {
    client: BasicClient,
}

impl GoogleOAuth {
    pub fn new(creds: &Credentials) -> Result<Self, AuthError> {
        let auth_url = AuthUrl::new(creds.auth_uri.clone()).map_err(|e| endpoint(&creds.auth_uri, e))?;
        let token_url =
            TokenUrl::new(creds.token_uri.clone()).map_err(|e| endpoint(&creds.token_uri, e))?;
        let redirect = RedirectUrl::new(creds.redirect_uri.clone())
            .map_err(|e| endpoint(&creds.redirect_uri, e))?;

        let client = BasicClient::new(
            ClientId::new(creds.client_id.clone()),
            Some(ClientSecret::new(creds.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect);

        Ok(Self { client })
    }
}

impl AuthorizationFlow for GoogleOAuth {
    fn authorize_url(&self) -> Url {
        let (url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(GMAIL_READONLY_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .url();
        url
    }

    fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request(http_client)
            .map_err(|e| AuthError::CodeExchange(describe(e)))?;

        Ok(stored_token(&token, chrono::Utc::now().timestamp_millis()))
    }

    fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError> {
        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request(http_client)
            .map_err(|e| AuthError::Refresh(describe(e)))?;

        Ok(stored_token(&token, chrono::Utc::now().timestamp_millis()))
    }
}

fn endpoint(url: &str, e: url::ParseError) -> AuthError {
    AuthError::Endpoint {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

/// Surface the provider's `error_description` rather than a generic message.
fn describe<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(resp) => format!("provider returned {resp}"),
        other => other.to_string(),
    }
}

fn stored_token(token: &BasicTokenResponse, now_ms: i64) -> StoredToken {
    let scope = token.scopes().map(|scopes| {
        scopes
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    });

    StoredToken {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
        scope,
        token_type: Some("Bearer".to_string()),
        expiry_date: token
            .expires_in()
            .map(|d| now_ms + d.as_millis() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "http://localhost:8080/callback".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        }
    }

    #[test]
    fn authorize_url_requests_readonly_offline_access() {
        let flow = GoogleOAuth::new(&creds()).unwrap();
        let url = flow.authorize_url();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(get("client_id"), Some("client-123.apps.googleusercontent.com"));
        assert_eq!(get("scope"), Some(GMAIL_READONLY_SCOPE));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:8080/callback"));
    }

    #[test]
    fn bad_endpoint_is_reported() {
        let mut c = creds();
        c.token_uri = "not a url".to_string();
        assert!(matches!(GoogleOAuth::new(&c), Err(AuthError::Endpoint { .. })));
    }

    #[test]
    fn token_response_maps_to_cache_layout() {
        let token: BasicTokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.x","token_type":"Bearer","expires_in":3599,
                "refresh_token":"1//r","scope":"https://www.googleapis.com/auth/gmail.readonly"}"#,
        )
        .unwrap();

        let stored = stored_token(&token, 1_000);
        assert_eq!(stored.access_token, "ya29.x");
        assert_eq!(stored.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(stored.scope.as_deref(), Some(GMAIL_READONLY_SCOPE));
        assert_eq!(stored.expiry_date, Some(1_000 + 3_599_000));
    }
}
