//! Best-effort server sync of the theme preference.
//!
//! A sync never affects local state: failures are logged and dropped.

use std::cell::RefCell;
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::Serialize;

use super::Preference;

/// Path of the sync endpoint relative to the site root.
pub const DEFAULT_SYNC_PATH: &str = "/user/api/user/theme/";

/// Header carrying the CSRF token.
pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid sync endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("theme sync request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Pushes the preference to a remote party.
pub trait ThemeSync {
    /// Start a sync. Must not block on the network and must not fail.
    fn push(&self, preference: Preference, csrf_token: &str);

    /// Wait for in-flight syncs. Hosts that exit right after a toggle call this.
    fn flush(&self) {}
}

impl<T: ThemeSync + ?Sized> ThemeSync for Box<T> {
    fn push(&self, preference: Preference, csrf_token: &str) {
        (**self).push(preference, csrf_token);
    }

    fn flush(&self) {
        (**self).flush();
    }
}

/// Sync that does nothing, for offline use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSync;

impl ThemeSync for NoSync {
    fn push(&self, preference: Preference, _csrf_token: &str) {
        tracing::debug!(%preference, "theme sync disabled");
    }
}

#[derive(Debug, Serialize)]
struct SyncBody {
    theme: Preference,
}

/// POSTs `{"theme": ...}` to the sync endpoint on a detached thread.
#[derive(Debug)]
pub struct HttpThemeSync {
    client: Client,
    endpoint: Url,
    pending: RefCell<Vec<JoinHandle<()>>>,
}

impl HttpThemeSync {
    /// Sync against [`DEFAULT_SYNC_PATH`] on `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let endpoint = format!("{}{DEFAULT_SYNC_PATH}", base_url.trim_end_matches('/'));
        Self::with_endpoint(&endpoint)
    }

    /// Sync against an explicit endpoint URL.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the client cannot be built.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, SyncError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| SyncError::InvalidEndpoint(endpoint.to_string()))?;
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            client,
            endpoint,
            pending: RefCell::new(Vec::new()),
        })
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one sync request and wait for it. The response body is ignored.
    ///
    /// # Errors
    /// Returns an error if the request cannot be sent.
    pub fn send_blocking(
        &self,
        preference: Preference,
        csrf_token: &str,
    ) -> Result<(), SyncError> {
        send(&self.client, &self.endpoint, preference, csrf_token)
    }
}

fn send(
    client: &Client,
    endpoint: &Url,
    preference: Preference,
    csrf_token: &str,
) -> Result<(), SyncError> {
    let response = client
        .post(endpoint.clone())
        .header(CSRF_HEADER, csrf_token)
        .json(&SyncBody { theme: preference })
        .send()?;
    tracing::debug!(status = %response.status(), %preference, "theme synced");
    Ok(())
}

impl ThemeSync for HttpThemeSync {
    fn push(&self, preference: Preference, csrf_token: &str) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let token = csrf_token.to_string();
        let handle = std::thread::spawn(move || {
            if let Err(err) = send(&client, &endpoint, preference, &token) {
                tracing::warn!(%err, "theme sync failed");
            }
        });
        let mut pending = self.pending.borrow_mut();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    fn flush(&self) {
        let handles = std::mem::take(&mut *self.pending.borrow_mut());
        for handle in handles {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Accept one request, answer 200, and return the raw request text.
    fn serve_once(listener: TcpListener) -> std::thread::JoinHandle<String> {
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= head_end + 4 + length {
                        break;
                    }
                }
            }
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok")
                .unwrap();
            String::from_utf8_lossy(&raw).to_string()
        })
    }

    #[test]
    fn test_new_appends_default_path() {
        let sync = HttpThemeSync::new("http://localhost:8000/").unwrap();
        assert_eq!(
            sync.endpoint().as_str(),
            "http://localhost:8000/user/api/user/theme/"
        );
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let err = HttpThemeSync::with_endpoint("not a url").unwrap_err();
        assert!(matches!(err, SyncError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_send_posts_json_with_csrf_header() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let server = serve_once(listener);

        let sync = HttpThemeSync::new(&base).unwrap();
        sync.send_blocking(Preference::Dark, "tok123").unwrap();

        let request = server.join().unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /user/api/user/theme/ HTTP/1.1"));
        assert!(lower.contains("x-csrftoken: tok123"));
        assert!(lower.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"theme":"dark"}"#));
    }

    #[test]
    fn test_push_swallows_connection_errors() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let sync = HttpThemeSync::new(&format!("http://127.0.0.1:{port}")).unwrap();
        assert!(sync.send_blocking(Preference::Auto, "").is_err());
        sync.push(Preference::Auto, "");
        sync.flush();
    }
}
