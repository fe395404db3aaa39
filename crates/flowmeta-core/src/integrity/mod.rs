//! Validación de integridad referencial guiada por el catálogo.

mod report;
mod validator;

pub use report::{BlockedOperation, ForeignKeyViolation, ReferenceCount, ReferenceReport, ViolationReason};
pub use validator::IntegrityValidator;
