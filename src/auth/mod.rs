pub mod oauth;
pub mod prompt;
pub mod secrets;
pub mod token_manager;
pub mod tokens_file;

/// Read-only mailbox access; nothing else is ever requested.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
