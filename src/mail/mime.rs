use log::warn;

use crate::domain::message::MessagePart;
use crate::mail::decoders::decode_body_data;

const HTML: &str = "text/html";

/// Find the first `text/html` part (pre-order, descending only into
/// `multipart/*` and `text/*` children) and decode its body.
///
/// Never fails: an absent or undecodable body yields `None`.
pub fn locate_html_body(root: &MessagePart) -> Option<String> {
    let data = find_html_data(root)?;
    match decode_body_data(data) {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("Failure decoding the HTML content: {e}");
            None
        }
    }
}

fn find_html_data(part: &MessagePart) -> Option<&str> {
    if part.mime_type() == HTML
        && let Some(data) = part.data()
    {
        return Some(data);
    }

    part.children()
        .iter()
        .filter(|child| is_searchable(child.mime_type()))
        .find_map(find_html_data)
}

fn is_searchable(mime_type: &str) -> bool {
    has_prefix_ignore_case(mime_type, "multipart") || has_prefix_ignore_case(mime_type, "text")
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
