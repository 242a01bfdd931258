//! In-memory key store for JWT signing and verification.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Upper bound on a single PEM file.
const MAX_PEM_BYTES: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("kid not found: {0}")]
    NotFound(String),
    #[error("reading key {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("missing public key for kid {0}")]
    MissingPublic(String),
}

/// Key material lookup by key id.
pub trait KeyLookup: Send + Sync + 'static {
    fn private_key_pem(&self, kid: &str) -> Result<String, KeyError>;
    fn public_key_pem(&self, kid: &str) -> Result<String, KeyError>;
}

#[derive(Debug, Clone)]
struct KeyPair {
    private_pem: String,
    public_pem: String,
}

/// Key pairs kept in memory, keyed by kid.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    keys: HashMap<String, KeyPair>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the pair stored under `kid`.
    pub fn insert(
        &mut self,
        kid: impl Into<String>,
        private_pem: impl Into<String>,
        public_pem: impl Into<String>,
    ) {
        let pair = KeyPair { private_pem: private_pem.into(), public_pem: public_pem.into() };
        self.keys.insert(kid.into(), pair);
    }

    /// Loads every `<kid>.pem` in `dir` together with its `<kid>.pub.pem`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, KeyError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| KeyError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut store = Self::new();
        for entry in entries {
            let path = entry
                .map_err(|source| KeyError::Io { path: dir.display().to_string(), source })?
                .path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            if name.ends_with(".pub.pem") {
                continue;
            }
            let Some(kid) = name.strip_suffix(".pem") else { continue };

            let public_path = dir.join(format!("{kid}.pub.pem"));
            if !public_path.exists() {
                return Err(KeyError::MissingPublic(kid.to_owned()));
            }
            store.insert(kid, read_pem(&path)?, read_pem(&public_path)?);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize { self.keys.len() }
    pub fn is_empty(&self) -> bool { self.keys.is_empty() }

    fn pair(&self, kid: &str) -> Result<&KeyPair, KeyError> {
        self.keys.get(kid).ok_or_else(|| KeyError::NotFound(kid.to_owned()))
    }
}

impl KeyLookup for KeyStore {
    fn private_key_pem(&self, kid: &str) -> Result<String, KeyError> {
        self.pair(kid).map(|p| p.private_pem.clone())
    }

    fn public_key_pem(&self, kid: &str) -> Result<String, KeyError> {
        self.pair(kid).map(|p| p.public_pem.clone())
    }
}

fn read_pem(path: &Path) -> Result<String, KeyError> {
    let io_err = |source: io::Error| KeyError::Io { path: path.display().to_string(), source };
    let mut pem = String::new();
    File::open(path)
        .map_err(io_err)?
        .take(MAX_PEM_BYTES)
        .read_to_string(&mut pem)
        .map_err(io_err)?;
    Ok(pem)
}
