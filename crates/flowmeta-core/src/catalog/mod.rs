//! Catálogo del grafo de referencias.
//!
//! Tabla estática `(tipo origen, campo FK) -> (tipo destino, cardinalidad,
//! obligatoriedad)`. Los dos validadores de `integrity` se derivan
//! exclusivamente de esta tabla: agregar un tipo de entidad nuevo requiere
//! una entrada aquí, no lógica específica. El mapa inverso (quién puede
//! apuntar a un tipo) se calcula, nunca se escribe a mano.

use serde_json::{Map, Value};
use uuid::Uuid;

use flowmeta_domain::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Mandatory,
    /// Acepta el centinela vacío (`Uuid::nil()`); un valor no vacío debe existir.
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// Id simple hacia un único tipo.
    Kind(EntityKind),
    /// `EntityRef {kind, id}` hacia cualquiera de los tipos listados.
    Tagged(&'static [EntityKind]),
}

impl ReferenceTarget {
    pub fn kinds(&self) -> &[EntityKind] {
        match self {
            ReferenceTarget::Kind(kind) => std::slice::from_ref(kind),
            ReferenceTarget::Tagged(kinds) => kinds,
        }
    }

    pub fn accepts(&self, kind: EntityKind) -> bool {
        self.kinds().contains(&kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceField {
    pub source: EntityKind,
    /// Nombre del campo en el documento JSON.
    pub field: &'static str,
    /// Nombre mostrado en errores (`ProcessorId`).
    pub label: &'static str,
    pub target: ReferenceTarget,
    pub cardinality: Cardinality,
    pub requirement: Requirement,
}

impl ReferenceField {
    pub const fn single(source: EntityKind, field: &'static str, label: &'static str, target: EntityKind) -> Self {
        Self { source,
               field,
               label,
               target: ReferenceTarget::Kind(target),
               cardinality: Cardinality::Single,
               requirement: Requirement::Mandatory }
    }

    pub const fn list(source: EntityKind, field: &'static str, label: &'static str, target: EntityKind) -> Self {
        Self { source,
               field,
               label,
               target: ReferenceTarget::Kind(target),
               cardinality: Cardinality::List,
               requirement: Requirement::Mandatory }
    }

    pub const fn tagged_list(source: EntityKind,
                             field: &'static str,
                             label: &'static str,
                             targets: &'static [EntityKind])
                             -> Self {
        Self { source,
               field,
               label,
               target: ReferenceTarget::Tagged(targets),
               cardinality: Cardinality::List,
               requirement: Requirement::Mandatory }
    }

    pub const fn optional(mut self) -> Self {
        self.requirement = Requirement::Optional;
        self
    }

    /// Patrón de contención JSON que selecciona los documentos de `source`
    /// cuyo campo apunta a `(target, id)`:
    /// `{field: id}`, `{field: [id]}` o `{field: [{"kind": K, "id": id}]}`.
    pub fn probe(&self, target: EntityKind, id: Uuid) -> Value {
        let element = match self.target {
            ReferenceTarget::Kind(_) => Value::String(id.to_string()),
            ReferenceTarget::Tagged(_) => {
                let mut tagged = Map::new();
                tagged.insert("kind".into(), Value::String(target.as_str().into()));
                tagged.insert("id".into(), Value::String(id.to_string()));
                Value::Object(tagged)
            }
        };
        let value = match self.cardinality {
            Cardinality::Single => element,
            Cardinality::List => Value::Array(vec![element]),
        };
        let mut probe = Map::new();
        probe.insert(self.field.into(), value);
        Value::Object(probe)
    }
}

const ASSIGNABLE: &[EntityKind] = &[EntityKind::Address, EntityKind::Delivery, EntityKind::Schema];

const STANDARD_FIELDS: &[ReferenceField] = &[
    ReferenceField::single(EntityKind::Address, "schema_id", "SchemaId", EntityKind::Schema),
    ReferenceField::single(EntityKind::Delivery, "schema_id", "SchemaId", EntityKind::Schema),
    ReferenceField::single(EntityKind::Processor, "input_schema_id", "InputSchemaId", EntityKind::Schema),
    ReferenceField::single(EntityKind::Processor, "output_schema_id", "OutputSchemaId", EntityKind::Schema),
    ReferenceField::single(EntityKind::Step, "processor_id", "ProcessorId", EntityKind::Processor),
    ReferenceField::list(EntityKind::Flow, "step_ids", "StepIds", EntityKind::Step),
    ReferenceField::single(EntityKind::Assignment, "step_id", "StepId", EntityKind::Step),
    ReferenceField::tagged_list(EntityKind::Assignment, "entity_ids", "EntityIds", ASSIGNABLE),
    ReferenceField::single(EntityKind::OrchestratedFlow, "flow_id", "FlowId", EntityKind::Flow),
    ReferenceField::list(EntityKind::OrchestratedFlow, "assignment_ids", "AssignmentIds", EntityKind::Assignment),
];

#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    fields: Vec<ReferenceField>,
}

impl ReferenceCatalog {
    pub fn new(fields: Vec<ReferenceField>) -> Self {
        Self { fields }
    }

    /// Grafo de la plataforma de orquestación.
    pub fn standard() -> Self {
        Self::new(STANDARD_FIELDS.to_vec())
    }

    pub fn fields(&self) -> &[ReferenceField] {
        &self.fields
    }

    /// Campos FK que posee `kind` (validación hacia adelante).
    pub fn outgoing(&self, kind: EntityKind) -> impl Iterator<Item = &ReferenceField> + '_ {
        self.fields.iter().filter(move |f| f.source == kind)
    }

    /// Pares `(tipo origen, campo)` que pueden apuntar a `kind` (validación
    /// hacia atrás), en el orden del catálogo.
    pub fn incoming(&self, kind: EntityKind) -> impl Iterator<Item = &ReferenceField> + '_ {
        self.fields.iter().filter(move |f| f.target.accepts(kind))
    }

    /// Tipos que referencian a `kind`, sin repetir, en orden del catálogo.
    pub fn referencing_kinds(&self, kind: EntityKind) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = Vec::new();
        for field in self.incoming(kind) {
            if !kinds.contains(&field.source) {
                kinds.push(field.source);
            }
        }
        kinds
    }

    /// Nodo sin referencias entrantes.
    pub fn is_sink(&self, kind: EntityKind) -> bool {
        self.incoming(kind).next().is_none()
    }
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
