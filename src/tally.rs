//! Walks every page of a receipt search and adds up the tips.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::dates::SearchWindow;
use crate::domain::message::MessageId;
use crate::error::TipFailure;
use crate::mail::MailProvider;
use crate::mail::mime::locate_html_body;
use crate::tips::extract_tip;

/// Gmail search for receipts with `subject` inside `window`.
pub fn build_query(subject: &str, window: &SearchWindow) -> Result<String> {
    Ok(format!(
        "\"{subject}\" after:{} before:{}",
        window.after()?,
        window.before()?
    ))
}

/// What one message contributed.
#[derive(Debug)]
pub struct MessageOutcome {
    pub id: MessageId,
    pub result: Result<Decimal, TipFailure>,
}

#[derive(Debug, Default)]
pub struct TipReport {
    pub total: Decimal,
    pub outcomes: Vec<MessageOutcome>,
    pub pages: usize,
}

impl TipReport {
    /// Adds the tip to the total. An addition that would overflow is
    /// recorded as a failure and leaves the total unchanged.
    fn record(&mut self, id: MessageId, result: Result<Decimal, TipFailure>) -> &MessageOutcome {
        let result = result.and_then(|tip| match self.total.checked_add(tip) {
            Some(total) => {
                self.total = total;
                Ok(tip)
            }
            None => Err(TipFailure::Overflow(tip)),
        });
        self.outcomes.push(MessageOutcome { id, result });
        &self.outcomes[self.outcomes.len() - 1]
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn tipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Failed messages in the order they were encountered.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TipFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.id.as_str(), e)))
    }
}

/// Fetch one message and pull its tip out.
pub fn tally_message(provider: &dyn MailProvider, id: &str) -> Result<Decimal, TipFailure> {
    let message = provider.get_message(id)?;
    let payload = message.payload.as_ref().ok_or(TipFailure::NoPayload)?;
    if let Some(subject) = payload.header("Subject") {
        debug!("message {id}: {subject}");
    }
    let html = locate_html_body(payload).ok_or(TipFailure::NoHtmlBody)?;
    extract_tip(&html)
}

/// Page through every result of `query`, summing tips.
///
/// A failing message is logged and recorded but never stops the run; a
/// failing page listing does.
pub fn run(provider: &dyn MailProvider, query: &str) -> Result<TipReport> {
    let mut report = TipReport::default();
    let mut cursor: Option<String> = None;
    let mut seen = 0usize;

    loop {
        let page = provider
            .list_messages(query, cursor.as_deref())
            .with_context(|| format!("listing messages for {query}"))?;
        report.pages += 1;

        if page.messages().is_empty() {
            info!("No tip messages located.");
            break;
        }

        let estimate = page.result_size_estimate.unwrap_or(0);
        for msg in page.messages() {
            seen += 1;
            info!("Processing: {seen} of {estimate}");

            let outcome = report.record(msg.id.clone(), tally_message(provider, &msg.id));
            if let Err(e) = &outcome.result {
                warn!("Encountered error processing message! [Id: {}]: {e}", outcome.id);
            }
        }

        match page.next_token() {
            Some(token) => cursor = Some(token.to_string()),
            None => break,
        }
    }

    Ok(report)
}
