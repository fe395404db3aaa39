//! Clave compuesta: identidad legible y única por tipo de entidad, distinta
//! del identificador generado.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    pub fn new<I, S>(parts: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Forma habitual `version + name`.
    pub fn versioned(version: &str, name: &str) -> Self {
        Self::new([version, name])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Codificación usada por el índice único del backend. Es el array JSON de
    /// las partes, de modo que `["a:b","c"]` y `["a","b:c"]` no colisionan.
    pub fn storage_form(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    pub fn from_storage(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str::<Vec<String>>(raw).map(Self)
                                                .map_err(|e| DomainError::InvalidKey(format!("{raw}: {e}")))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(":"))
    }
}
