use std::collections::HashMap;
use std::fs;
use std::str::FromStr;
use std::thread;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rust_decimal::Decimal;
use tiny_http::{Response, Server};
use url::Url;

use tip_tally::auth::prompt::CodePrompt;
use tip_tally::auth::secrets::Credentials;
use tip_tally::auth::tokens_file::{StoredToken, TokenCache};
use tip_tally::config::Settings;
use tip_tally::error::AuthError;
use tip_tally::session::Session;
use tip_tally::tally;

struct NoPrompt;

impl CodePrompt for NoPrompt {
    fn obtain_code(&self, _auth_url: &Url) -> Result<String, AuthError> {
        panic!("a cached token should not prompt");
    }
}

fn receipt(tip: &str) -> String {
    let html = format!(
        "<html><table><tr><td style=\"x\">Total</td><td></td><td></td><td>$20.00</td></tr>\
         <tr><td style=\"x\">Tip</td><td></td><td></td><td>${tip}</td></tr></table></html>"
    );
    format!(
        r#"{{"id":"x","payload":{{"mimeType":"multipart/mixed","parts":[
            {{"mimeType":"multipart/alternative","parts":[
                {{"mimeType":"text/plain","body":{{"data":"{plain}"}}}},
                {{"mimeType":"text/html","body":{{"data":"{html}"}}}}]}},
            {{"mimeType":"application/pdf","filename":"r.pdf","body":{{"attachmentId":"att"}}}}]}}}}"#,
        plain = URL_SAFE_NO_PAD.encode("Tip"),
        html = URL_SAFE_NO_PAD.encode(html),
    )
}

/// Serves canned responses keyed by request target until `expected` requests
/// have been answered. Unknown targets get a 500.
fn serve(routes: HashMap<String, String>, expected: usize) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}/gmail/v1", server.server_addr());

    thread::spawn(move || {
        for _ in 0..expected {
            let Ok(request) = server.recv() else { return };
            let response = match routes.get(request.url()) {
                Some(body) => Response::from_string(body.clone()),
                None => Response::from_string("{\"error\":\"boom\"}").with_status_code(500),
            };
            let _ = request.respond(response);
        }
    });

    base
}

#[test]
fn cached_session_pages_through_receipts_and_skips_failures() {
    let q = "%22Receipt%22+after%3A2021%2F12%2F12+before%3A2021%2F12%2F13";
    let list = "/gmail/v1/users/me/messages";
    let get = |id: &str| format!("{list}/{id}?format=full");

    let mut routes = HashMap::new();
    routes.insert(
        format!("{list}?q={q}"),
        r#"{"messages":[{"id":"r1"},{"id":"broken"}],"nextPageToken":"page2","resultSizeEstimate":3}"#
            .to_string(),
    );
    routes.insert(
        format!("{list}?q={q}&pageToken=page2"),
        r#"{"messages":[{"id":"r2"}],"resultSizeEstimate":3}"#.to_string(),
    );
    routes.insert(get("r1"), receipt("3.15"));
    routes.insert(get("r2"), receipt("4.05"));
    let base = serve(routes, 5);

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("access_token.json");
    TokenCache::new(&token_path)
        .save(&StoredToken {
            access_token: "cached-access".to_string(),
            refresh_token: Some("refresh".to_string()),
            scope: None,
            token_type: Some("Bearer".to_string()),
            expiry_date: None,
        })
        .unwrap();
    let before = fs::read_to_string(&token_path).unwrap();

    let settings = Settings {
        token_path: token_path.clone(),
        api_base: base,
        ..Settings::default()
    };
    let creds = Credentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "http://localhost".to_string(),
        auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
    };

    let session = Session::establish_with(&settings, &creds, &NoPrompt).unwrap();
    assert_eq!(session.token().access_token, "cached-access");

    let report = tally::run(session.mail(), "\"Receipt\" after:2021/12/12 before:2021/12/13").unwrap();

    assert_eq!(report.total, Decimal::from_str("7.20").unwrap());
    assert_eq!(report.processed(), 3);
    assert_eq!(report.pages, 2);
    let failed: Vec<_> = report.failures().map(|(id, _)| id.to_string()).collect();
    assert_eq!(failed, ["broken"]);

    // A warm start leaves the cache untouched.
    assert_eq!(fs::read_to_string(&token_path).unwrap(), before);
}

#[test]
fn unreadable_secrets_abort_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        credentials_path: dir.path().join("missing.json"),
        token_path: dir.path().join("token.json"),
        ..Settings::default()
    };

    let err = match Session::establish(&settings) {
        Ok(_) => panic!("session without secrets"),
        Err(e) => e,
    };
    assert!(matches!(
        err.downcast_ref::<AuthError>(),
        Some(AuthError::Secrets { .. })
    ));
}
