use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::ConfigError;
use crate::relation::Relation;

/// The five keys a participant can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKey {
    ArrowUp,
    ArrowLeft,
    ArrowRight,
    ArrowDown,
    Space,
}

impl ResponseKey {
    /// Standard order: up, left, right, down, no-connection.
    pub const ALL: [ResponseKey; 5] = [
        ResponseKey::ArrowUp,
        ResponseKey::ArrowLeft,
        ResponseKey::ArrowRight,
        ResponseKey::ArrowDown,
        ResponseKey::Space,
    ];

    pub fn relation(&self) -> Relation {
        match self {
            ResponseKey::ArrowUp => Relation::Above,
            ResponseKey::ArrowLeft => Relation::Left,
            ResponseKey::ArrowRight => Relation::Right,
            ResponseKey::ArrowDown => Relation::Below,
            ResponseKey::Space => Relation::NotConnected,
        }
    }

    /// Keyboard token as reported by browsers' `KeyboardEvent.key`.
    pub fn token(&self) -> &'static str {
        match self {
            ResponseKey::ArrowUp => "ArrowUp",
            ResponseKey::ArrowLeft => "ArrowLeft",
            ResponseKey::ArrowRight => "ArrowRight",
            ResponseKey::ArrowDown => "ArrowDown",
            ResponseKey::Space => " ",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        if token == " " {
            return Some(ResponseKey::Space);
        }
        match token.to_ascii_lowercase().as_str() {
            "arrowup" => Some(ResponseKey::ArrowUp),
            "arrowleft" => Some(ResponseKey::ArrowLeft),
            "arrowright" => Some(ResponseKey::ArrowRight),
            "arrowdown" => Some(ResponseKey::ArrowDown),
            "space" => Some(ResponseKey::Space),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseKey::Space => "Space",
            other => other.token(),
        };
        f.write_str(name)
    }
}

impl FromStr for ResponseKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResponseKey::from_token(s).ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Ordered set holding each of the five response keys exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidKeys([ResponseKey; 5]);

impl ValidKeys {
    pub fn from_tokens<I, T>(tokens: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let parsed = tokens
            .into_iter()
            .map(|t| t.as_ref().parse::<ResponseKey>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_keys(&parsed)
    }

    pub fn from_keys(keys: &[ResponseKey]) -> Result<Self, ConfigError> {
        let found = keys.len();
        let keys: [ResponseKey; 5] = keys.try_into().map_err(|_| ConfigError::KeyCount {
            expected: ResponseKey::ALL.len(),
            found,
        })?;
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(ConfigError::DuplicateKey(*key));
            }
        }
        Ok(Self(keys))
    }

    pub fn contains(&self, key: ResponseKey) -> bool {
        self.0.contains(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = ResponseKey> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ValidKeys {
    fn default() -> Self {
        Self(ResponseKey::ALL)
    }
}

/// A key press stamped with the instant it reached the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: ResponseKey,
    pub at: Instant,
}

impl KeyPress {
    pub fn new(key: ResponseKey, at: Instant) -> Self {
        Self { key, at }
    }

    pub fn now(key: ResponseKey) -> Self {
        Self::new(key, Instant::now())
    }
}
