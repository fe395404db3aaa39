//! Tipos de entidad gestionados por el store de metadatos.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// Las ocho clases de entidad del grafo de configuración.
///
/// El nombre serializado (`"Schema"`, `"OrchestratedFlow"`, ...) es estable:
/// se usa como discriminador en `EntityRef`, en la columna `kind` del backend
/// Postgres y en los mensajes de rechazo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Schema,
    Address,
    Delivery,
    Processor,
    Step,
    Flow,
    Assignment,
    OrchestratedFlow,
}

impl EntityKind {
    pub const COUNT: usize = 8;

    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::Schema,
        EntityKind::Address,
        EntityKind::Delivery,
        EntityKind::Processor,
        EntityKind::Step,
        EntityKind::Flow,
        EntityKind::Assignment,
        EntityKind::OrchestratedFlow,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Schema => "Schema",
            EntityKind::Address => "Address",
            EntityKind::Delivery => "Delivery",
            EntityKind::Processor => "Processor",
            EntityKind::Step => "Step",
            EntityKind::Flow => "Flow",
            EntityKind::Assignment => "Assignment",
            EntityKind::OrchestratedFlow => "OrchestratedFlow",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    /// Acepta el nombre canónico o su forma snake_case (`orchestrated_flow`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| *c != '_' && *c != '-').collect();
        EntityKind::ALL.iter()
                       .copied()
                       .find(|k| k.as_str().eq_ignore_ascii_case(&normalized))
                       .ok_or_else(|| DomainError::UnknownKind(s.to_string()))
    }
}
