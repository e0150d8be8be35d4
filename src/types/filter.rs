//! Relationship filters for read and delete requests.

use super::Relationship;

/// Constraint on a subject's relation within a [`SubjectFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectRelationFilter {
    /// Match only direct subjects (no subject relation).
    Direct,
    /// Match only subject sets over the named relation.
    Relation(String),
}

/// Narrows a [`RelationshipFilter`] by subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectFilter {
    /// Required subject type.
    pub subject_type: String,
    /// Subject ID, or `None` for any.
    pub optional_subject_id: Option<String>,
    /// Subject relation constraint, or `None` for any.
    pub optional_relation: Option<SubjectRelationFilter>,
}

/// Selects relationships in the remote store.
///
/// Every field left as `None` matches anything. [`RelationshipFilter::exact`]
/// sets every field, so it selects at most one relationship: the one it was
/// built from.
///
/// ```rust
/// use spicedb_relationship::{Relationship, RelationshipFilter};
///
/// let direct: Relationship = "document:doc1#viewer@group:eng".parse().unwrap();
/// let set: Relationship = "document:doc1#viewer@group:eng#member".parse().unwrap();
///
/// let filter = RelationshipFilter::exact(&direct);
/// assert!(filter.matches(&direct));
/// assert!(!filter.matches(&set));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipFilter {
    /// Required resource type.
    pub resource_type: String,
    /// Resource ID, or `None` for any.
    pub optional_resource_id: Option<String>,
    /// Relation, or `None` for any.
    pub optional_relation: Option<String>,
    /// Subject constraint, or `None` for any.
    pub optional_subject_filter: Option<SubjectFilter>,
}

impl RelationshipFilter {
    /// Creates a filter matching every relationship on the resource type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            optional_resource_id: None,
            optional_relation: None,
            optional_subject_filter: None,
        }
    }

    /// Creates a filter matching exactly `relationship`, including whether its
    /// subject is direct or a subject set.
    pub fn exact(relationship: &Relationship) -> Self {
        let optional_relation = Some(match relationship.subject_relation() {
            Some(relation) => SubjectRelationFilter::Relation(relation.to_owned()),
            None => SubjectRelationFilter::Direct,
        });

        Self {
            resource_type: relationship.resource_type().to_owned(),
            optional_resource_id: Some(relationship.resource_id().to_owned()),
            optional_relation: Some(relationship.relation().to_owned()),
            optional_subject_filter: Some(SubjectFilter {
                subject_type: relationship.subject_type().to_owned(),
                optional_subject_id: Some(relationship.subject_id().to_owned()),
                optional_relation,
            }),
        }
    }

    /// Restricts the filter to a resource ID.
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.optional_resource_id = Some(resource_id.into());
        self
    }

    /// Restricts the filter to a relation.
    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.optional_relation = Some(relation.into());
        self
    }

    /// Restricts the filter by subject.
    #[must_use]
    pub fn with_subject_filter(mut self, subject_filter: SubjectFilter) -> Self {
        self.optional_subject_filter = Some(subject_filter);
        self
    }

    /// Returns `true` if `relationship` is selected by this filter.
    pub fn matches(&self, relationship: &Relationship) -> bool {
        if relationship.resource_type() != self.resource_type {
            return false;
        }
        if let Some(ref id) = self.optional_resource_id {
            if relationship.resource_id() != id {
                return false;
            }
        }
        if let Some(ref relation) = self.optional_relation {
            if relationship.relation() != relation {
                return false;
            }
        }
        match self.optional_subject_filter {
            Some(ref subject) => subject.matches(relationship),
            None => true,
        }
    }
}

impl SubjectFilter {
    fn matches(&self, relationship: &Relationship) -> bool {
        if relationship.subject_type() != self.subject_type {
            return false;
        }
        if let Some(ref id) = self.optional_subject_id {
            if relationship.subject_id() != id {
                return false;
            }
        }
        match (&self.optional_relation, relationship.subject_relation()) {
            (None, _) => true,
            (Some(SubjectRelationFilter::Direct), None) => true,
            (Some(SubjectRelationFilter::Relation(want)), Some(have)) => want == have,
            _ => false,
        }
    }
}
