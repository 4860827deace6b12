use std::path::PathBuf;

/// Invalid input to the date helpers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors raised while establishing an authenticated session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The client secrets file is missing or malformed. Always fatal.
    #[error("could not load client secrets from {path}: {reason}")]
    Secrets { path: PathBuf, reason: String },

    /// The secrets file carried a URL the OAuth client cannot use.
    #[error("invalid OAuth endpoint '{url}': {reason}")]
    Endpoint { url: String, reason: String },

    /// Obtaining the authorization code from the operator failed.
    #[error("authorization prompt failed: {0}")]
    Prompt(String),

    /// The provider rejected the authorization code.
    #[error("authorization code exchange failed: {0}")]
    CodeExchange(String),

    /// The provider rejected the refresh token.
    #[error("token refresh failed: {0}")]
    Refresh(String),
}

/// Errors from the mail provider API.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid message id: {0:?}")]
    InvalidId(String),
}

/// Why a single message contributed nothing to the tip total.
#[derive(Debug, thiserror::Error)]
pub enum TipFailure {
    #[error("fetch failed: {0}")]
    Fetch(#[from] MailError),

    #[error("message has no payload")]
    NoPayload,

    #[error("no decodable text/html part")]
    NoHtmlBody,

    #[error("no tip row in html body")]
    NoTipRow,

    #[error("tip amount {0:?} is not a decimal")]
    InvalidAmount(String),

    #[error("adding tip {0} would overflow the total")]
    Overflow(rust_decimal::Decimal),
}
