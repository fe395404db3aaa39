// flowmeta-domain library entry point
#[macro_use]
mod macros;

pub mod address;
pub mod any;
pub mod assignment;
pub mod delivery;
pub mod entity;
pub mod error;
pub mod flow;
pub mod header;
pub mod key;
pub mod kind;
pub mod orchestrated_flow;
pub mod processor;
pub mod reference;
pub mod schema;
pub mod step;

pub use address::Address;
pub use any::AnyEntity;
pub use assignment::Assignment;
pub use delivery::Delivery;
pub use entity::Entity;
pub use error::DomainError;
pub use flow::Flow;
pub use header::EntityHeader;
pub use key::CompositeKey;
pub use kind::EntityKind;
pub use orchestrated_flow::OrchestratedFlow;
pub use processor::Processor;
pub use reference::EntityRef;
pub use schema::Schema;
pub use step::Step;
