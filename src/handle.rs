//! Shared "current tokenizer" for serving collaborators.
//!
//! Readers take a snapshot with [`SharedTokenizer::current`] and keep using it
//! even if a retrain swaps in a new tokenizer meanwhile. Writes (retrain,
//! reload) are serialized by a write lock, which also gives the persisted
//! document a single writer.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use arc_swap::ArcSwapOption;
use log::{debug, info};

use crate::{
    config::TrainConfig,
    error::{Error, Result},
    tokenizer::{Tokenizer, TokenizerStats},
};

/// Atomically swappable tokenizer bound to a persisted document path.
pub struct SharedTokenizer {
    /// Lock-free reads via `ArcSwapOption::load_full`.
    current: ArcSwapOption<Tokenizer>,
    /// Serializes retrain/reload and writes to `path`.
    write_lock: Mutex<()>,
    path: PathBuf,
}

impl SharedTokenizer {
    /// Creates an empty handle persisting to `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            write_lock: Mutex::new(()),
            path: path.into(),
        }
    }

    /// Creates a handle with `tokenizer` already installed.
    pub fn with_tokenizer(path: impl Into<PathBuf>, tokenizer: Tokenizer) -> Self {
        let handle = Self::new(path);
        handle.install(tokenizer);
        handle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the installed tokenizer, if any.
    pub fn current(&self) -> Option<Arc<Tokenizer>> {
        self.current.load_full()
    }

    /// Replaces the installed tokenizer without touching the document.
    pub fn install(&self, tokenizer: Tokenizer) -> Option<Arc<Tokenizer>> {
        self.current.swap(Some(Arc::new(tokenizer)))
    }

    /// Returns the installed tokenizer, loading it from the document first if
    /// nothing is installed. A missing document yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Any load failure other than the document not existing.
    pub fn ensure_loaded(&self) -> Result<Option<Arc<Tokenizer>>> {
        if let Some(tok) = self.current() {
            return Ok(Some(tok));
        }

        let _guard = self.lock();
        // another writer may have installed one while we waited
        if let Some(tok) = self.current() {
            return Ok(Some(tok));
        }

        match Tokenizer::load(&self.path) {
            Ok(tok) => {
                let tok = Arc::new(tok);
                self.current.store(Some(Arc::clone(&tok)));
                Ok(Some(tok))
            }
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("no tokenizer document at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Trains on `text`, saves the result to the document, then swaps it in.
    ///
    /// The previous tokenizer stays installed if training or saving fails.
    pub fn retrain(&self, text: &str, config: &TrainConfig) -> Result<Arc<Tokenizer>> {
        let _guard = self.lock();
        let tok = Tokenizer::train(text, config)?;
        tok.save(&self.path)?;

        let tok = Arc::new(tok);
        self.current.store(Some(Arc::clone(&tok)));
        info!("installed retrained tokenizer ({} ids)", tok.vocab_size());
        Ok(tok)
    }

    /// Re-reads the document and swaps the result in.
    pub fn reload(&self) -> Result<Arc<Tokenizer>> {
        let _guard = self.lock();
        let tok = Arc::new(Tokenizer::load(&self.path)?);
        self.current.store(Some(Arc::clone(&tok)));
        Ok(tok)
    }

    /// Stats of the installed tokenizer, loading it first if needed.
    pub fn stats(&self) -> Result<Option<TokenizerStats>> {
        Ok(self.ensure_loaded()?.map(|tok| tok.stats()))
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // the guarded value is (), so a poisoned lock carries no broken state
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
