use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::AuthError;

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration, as downloaded from the Google console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<InstalledApp>,
}

#[derive(Deserialize)]
struct InstalledApp {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl Credentials {
    /// Load the `installed` client from a `client_secret.json` file.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let fail = |reason: String| AuthError::Secrets {
            path: path.to_path_buf(),
            reason,
        };

        let raw = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let file: SecretsFile = serde_json::from_str(&raw).map_err(|e| fail(e.to_string()))?;
        let app = file
            .installed
            .ok_or_else(|| fail("missing `installed` client section".to_string()))?;
        let redirect_uri = app
            .redirect_uris
            .into_iter()
            .next()
            .ok_or_else(|| fail("`redirect_uris` is empty".to_string()))?;

        debug!("loaded OAuth client {} from {}", app.client_id, path.display());

        Ok(Self {
            client_id: app.client_id,
            client_secret: app.client_secret,
            redirect_uri,
            auth_uri: app.auth_uri.unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
            token_uri: app.token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("client_secret.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_installed_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"{"installed":{"client_id":"id.apps","client_secret":"shh",
                "redirect_uris":["urn:ietf:wg:oauth:2.0:oob","http://localhost"],
                "token_uri":"https://example.test/token"}}"#,
        );

        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.client_id, "id.apps");
        assert_eq!(creds.client_secret, "shh");
        assert_eq!(creds.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(creds.auth_uri, GOOGLE_AUTH_URI);
        assert_eq!(creds.token_uri, "https://example.test/token");
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AuthError::Secrets { .. }));
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        for body in [
            "{not json",
            r#"{"web":{"client_id":"a","client_secret":"b","redirect_uris":["x"]}}"#,
            r#"{"installed":{"client_id":"a","client_secret":"b","redirect_uris":[]}}"#,
        ] {
            let path = write(&dir, body);
            assert!(matches!(Credentials::load(&path), Err(AuthError::Secrets { .. })));
        }
    }
}
