use std::fmt::Debug;
use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::config::TokenConfig;

/// Supplies the landlord bearer token at request time.
pub trait TokenSource: Debug + Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token fixed for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(token.trim().to_string()))
        }
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Token persisted by the login flow; read on every call so re-logins apply immediately.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenSource for FileToken {
    fn bearer_token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "token file unreadable");
                None
            }
        }
    }
}

pub fn token_source(config: &TokenConfig) -> Box<dyn TokenSource> {
    match config {
        TokenConfig::Inline(token) => Box::new(StaticToken::new(token.clone())),
        TokenConfig::File(path) => Box::new(FileToken::new(path.clone())),
        TokenConfig::Missing => Box::new(StaticToken::none()),
    }
}
