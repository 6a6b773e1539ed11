//! Python bindings, compiled with the `python` feature.

use pyo3::{
    exceptions::{PyIOError, PyValueError},
    prelude::*,
};

use crate::{config::TrainConfig, error::Error, tokenizer::Tokenizer, types::TokenId};

fn to_py_err(e: Error) -> PyErr {
    match e {
        Error::Io(io) => PyIOError::new_err(io.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Python wrapper for the BPE tokenizer.
#[pyclass(name = "BPETokenizer", frozen)]
pub struct PyBPETokenizer {
    inner: Tokenizer,
}

#[pymethods]
impl PyBPETokenizer {
    #[staticmethod]
    #[pyo3(signature = (text, vocab_size = crate::config::DEFAULT_VOCAB_SIZE, specials = Vec::new(), show_progress = false))]
    fn train(
        text: &str,
        vocab_size: usize,
        specials: Vec<String>,
        show_progress: bool,
    ) -> PyResult<Self> {
        let cfg = TrainConfig::new(vocab_size)
            .with_specials(specials)
            .with_progress(show_progress);
        let inner = Tokenizer::train(text, &cfg).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[staticmethod]
    fn load(path: &str) -> PyResult<Self> {
        let inner = Tokenizer::load(path).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn save(&self, path: &str) -> PyResult<()> {
        self.inner.save(path).map_err(to_py_err)
    }

    /// Returns `(ids, tokens)`.
    fn encode(&self, text: &str) -> (Vec<TokenId>, Vec<String>) {
        let enc = self.inner.encode(text);
        (enc.ids, enc.tokens)
    }

    fn decode(&self, ids: Vec<TokenId>) -> String {
        self.inner.decode(&ids)
    }

    fn vocab_size(&self) -> usize {
        self.inner.vocab_size()
    }

    fn num_merges(&self) -> usize {
        self.inner.merges().len()
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }
}

#[pymodule]
fn bpe_playground(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBPETokenizer>()?;
    Ok(())
}
