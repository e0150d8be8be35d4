//! Core relationship types.
//!
//! - [`Relationship`]: a `(resource, relation, subject)` tuple and its parser
//! - [`RelationshipFilter`]: selects relationships for reads and deletes
//! - [`ConsistencyToken`] and [`Consistency`]: snapshot tokens and read freshness

mod consistency;
mod filter;
mod relationship;

pub use consistency::{Consistency, ConsistencyToken};
pub use filter::{RelationshipFilter, SubjectFilter, SubjectRelationFilter};
pub use relationship::{ObjectReference, Relationship, SubjectReference};
