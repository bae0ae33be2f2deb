//! Preference stores.
//!
//! The preference is written to two places so it can be recovered before
//! any styling is applied: a key-value store and a cookie. Both sit behind
//! [`PreferenceStore`]; callers treat every failure as non-fatal.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cookie::Cookie;
use time::{Duration, OffsetDateTime};

/// Cookie lifetime for the persisted preference.
pub const COOKIE_DAYS: i64 = 365;

/// Cookie carrying the CSRF token for the sync endpoint.
pub const CSRF_COOKIE: &str = "csrftoken";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed store {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store holding the preference.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<T: PreferenceStore> PreferenceStore for Rc<RefCell<T>> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.borrow_mut().set(key, value)
    }
}

/// In-memory store, used by embedders that persist elsewhere and by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key-value store persisted as a JSON object.
///
/// The file is re-read on every `get` so writes from other processes are
/// picked up.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // A corrupt file is replaced rather than blocking the write.
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(StoreError::Malformed { .. }) => BTreeMap::new(),
            Err(err) => return Err(err),
        };
        entries.insert(key.to_string(), value.to_string());
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&entries).map_err(|source| {
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, format!("{json}\n")).map_err(write_err)
    }
}

/// Build the root-path cookie for `name`, expiring [`COOKIE_DAYS`] after `now`.
pub fn preference_cookie(name: &str, value: &str, now: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((name.to_owned(), value.to_owned()))
        .path("/")
        .expires(now + Duration::days(COOKIE_DAYS))
        .build()
}

fn is_expired(cookie: &Cookie<'_>, now: OffsetDateTime) -> bool {
    cookie.expires_datetime().is_some_and(|at| at <= now)
}

/// The set of cookies visible to the page.
#[derive(Debug, Default, Clone)]
pub struct CookieJar {
    jar: cookie::CookieJar,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut jar = Self::new();
        jar.add(preference_cookie(key, value, OffsetDateTime::now_utc()));
        jar
    }

    pub fn cookies(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.jar.iter()
    }

    /// Decoded value of the cookie named `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|c| c.value().to_owned())
    }

    /// Insert or replace the cookie with the same name.
    pub fn add(&mut self, cookie: Cookie<'static>) {
        self.jar.add(cookie);
    }
}

impl PreferenceStore for CookieJar {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(CookieJar::get(self, key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.add(preference_cookie(key, value, OffsetDateTime::now_utc()));
        Ok(())
    }
}

/// A cookie jar persisted one `Set-Cookie` style line per cookie, with the
/// value percent-encoded.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the jar, dropping expired cookies.
    pub fn load(&self) -> Result<CookieJar, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(CookieJar::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let now = OffsetDateTime::now_utc();
        let mut jar = CookieJar::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Cookie::parse_encoded(line.to_owned()) {
                Ok(cookie) if is_expired(&cookie, now) => {
                    tracing::trace!(name = cookie.name(), "dropping expired cookie");
                }
                Ok(cookie) => jar.add(cookie),
                Err(err) => tracing::debug!(line, %err, "skipping unparseable cookie line"),
            }
        }
        Ok(jar)
    }

    pub fn save(&self, jar: &CookieJar) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let out = jar
            .cookies()
            .map(|cookie| format!("{}\n", cookie.encoded()))
            .collect::<String>();
        fs::write(&self.path, out).map_err(write_err)
    }
}

impl PreferenceStore for CookieFile {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.get(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut jar = self.load()?;
        PreferenceStore::set(&mut jar, key, value)?;
        self.save(&jar)
    }
}
