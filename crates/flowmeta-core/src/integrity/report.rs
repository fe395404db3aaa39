//! Resultados de los chequeos: violación de FK (hacia adelante) y reporte de
//! referencias inversas (hacia atrás). Sus `Display` son los mensajes que se
//! devuelven tal cual al usuario final.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use flowmeta_domain::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationReason {
    /// Centinela vacío en un campo obligatorio (o en un elemento de lista).
    Empty,
    /// El id no existe en la colección del tipo referenciado.
    Missing,
    /// Referencia etiquetada hacia un tipo que el campo no admite.
    KindNotAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    pub kind: EntityKind,
    pub field: &'static str,
    pub referenced: EntityKind,
    pub value: String,
    pub index: Option<usize>,
    pub reason: ViolationReason,
}

impl fmt::Display for ForeignKeyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignKey validation failed: {}.{}", self.kind, self.field)?;
        if let Some(i) = self.index {
            write!(f, "[{i}]")?;
        }
        match self.reason {
            ViolationReason::Empty => write!(f, " is empty ({} required)", self.referenced),
            ViolationReason::Missing => write!(f, " references missing {} '{}'", self.referenced, self.value),
            ViolationReason::KindNotAllowed => {
                write!(f, " references {} '{}', which is not an allowed kind", self.referenced, self.value)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockedOperation {
    Delete,
    /// Update que cambia la clave compuesta.
    Modify,
}

impl BlockedOperation {
    pub fn verb(self) -> &'static str {
        match self {
            BlockedOperation::Delete => "delete",
            BlockedOperation::Modify => "modify",
        }
    }
}

/// Conteo de referencias de un tipo origen (desglose de las respuestas de rechazo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCount {
    pub kind: EntityKind,
    pub count: u64,
}

/// Referencias inversas hacia `(kind, id)`, agregadas por tipo origen. Los
/// campos múltiples de un mismo tipo suman (p.ej. entrada + salida de un
/// `Processor`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceReport {
    pub kind: EntityKind,
    pub id: Uuid,
    pub operation: BlockedOperation,
    counts: IndexMap<EntityKind, u64>,
}

impl ReferenceReport {
    pub fn new(kind: EntityKind, id: Uuid, operation: BlockedOperation) -> Self {
        Self { kind,
               id,
               operation,
               counts: IndexMap::new() }
    }

    pub fn add(&mut self, source: EntityKind, count: u64) {
        *self.counts.entry(source).or_insert(0) += count;
    }

    pub fn count_for(&self, source: EntityKind) -> u64 {
        self.counts.get(&source).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn has_references(&self) -> bool {
        self.total() > 0
    }

    /// Tipos con al menos una referencia, en orden del catálogo.
    pub fn breakdown(&self) -> Vec<ReferenceCount> {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(kind, count)| ReferenceCount { kind: *kind,
                                                  count: *count })
            .collect()
    }
}

impl fmt::Display for ReferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot {} {}: ", self.operation.verb(), self.kind)?;
        let parts: Vec<String> = self.breakdown()
                                     .iter()
                                     .map(|c| {
                                         let noun = if c.count == 1 { "reference" } else { "references" };
                                         format!("{} {} {noun}", c.count, c.kind)
                                     })
                                     .collect();
        if parts.is_empty() {
            write!(f, "no references")
        } else {
            write!(f, "found {}", parts.join(", "))
        }
    }
}
