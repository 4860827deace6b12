//! Mail provider access: the provider seam, the Gmail implementation and
//! helpers for digging the HTML body out of a message.

pub mod decoders;
pub mod gmail_client;
pub mod mime;

use crate::domain::message::{Message, MessagePage};
use crate::error::MailError;

pub type Result<T> = std::result::Result<T, MailError>;

/// The two mailbox operations the tally needs.
pub trait MailProvider {
    /// One page of message references matching a Gmail search `query`.
    fn list_messages(&self, query: &str, page_token: Option<&str>) -> Result<MessagePage>;

    /// The full message, including its MIME part tree.
    fn get_message(&self, id: &str) -> Result<Message>;
}
