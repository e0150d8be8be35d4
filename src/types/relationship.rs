//! Relationship type representing a tuple in the authorization graph, and the
//! parser for its textual encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// A typed object in the authorization graph, written `type:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectReference {
    object_type: String,
    object_id: String,
}

impl ObjectReference {
    /// Creates a new object reference.
    ///
    /// No validation is performed; use [`Relationship::parse`] for untrusted input.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }

    /// Returns the object type (e.g., `document`).
    #[inline]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the object ID (e.g., `doc1`).
    #[inline]
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

/// The subject of a relationship: either a direct object (`user:alice`) or a
/// subject set (`group:eng#member`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectReference {
    object: ObjectReference,
    optional_relation: Option<String>,
}

impl SubjectReference {
    /// Creates a direct subject reference.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object: ObjectReference::new(object_type, object_id),
            optional_relation: None,
        }
    }

    /// Turns this subject into a subject set over `relation`.
    ///
    /// An empty relation leaves the subject direct.
    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        self.optional_relation = (!relation.is_empty()).then_some(relation);
        self
    }

    /// Returns the subject object.
    #[inline]
    pub fn object(&self) -> &ObjectReference {
        &self.object
    }

    /// Returns the subject relation for subject sets, `None` for direct subjects.
    #[inline]
    pub fn optional_relation(&self) -> Option<&str> {
        self.optional_relation.as_deref()
    }
}

impl From<ObjectReference> for SubjectReference {
    fn from(object: ObjectReference) -> Self {
        Self {
            object,
            optional_relation: None,
        }
    }
}

impl fmt::Display for SubjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object)?;
        if let Some(ref relation) = self.optional_relation {
            write!(f, "#{}", relation)?;
        }
        Ok(())
    }
}

/// A relationship tuple representing an edge in the authorization graph.
///
/// Relationships follow the Zanzibar model: `(resource, relation, subject)`,
/// read as "resource has relation to subject".
///
/// ## String Format
///
/// The textual encoding is both the human-facing identifier and the import key:
///
/// ```text
/// resourceType:resourceId#relation@subjectType:subjectId[#subjectRelation]
/// ```
///
/// ```rust
/// use spicedb_relationship::Relationship;
///
/// let rel: Relationship = "document:doc1#viewer@group:eng#member".parse().unwrap();
/// assert_eq!(rel.resource_type(), "document");
/// assert_eq!(rel.resource_id(), "doc1");
/// assert_eq!(rel.relation(), "viewer");
/// assert_eq!(rel.subject_type(), "group");
/// assert_eq!(rel.subject_id(), "eng");
/// assert_eq!(rel.subject_relation(), Some("member"));
///
/// assert_eq!(rel.to_string(), "document:doc1#viewer@group:eng#member");
/// ```
///
/// ## Serialization
///
/// A relationship serializes as its textual encoding, so hosts can persist it
/// verbatim as a state attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Relationship {
    resource: ObjectReference,
    relation: String,
    subject: SubjectReference,
}

impl Relationship {
    /// Creates a new relationship from its parts.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spicedb_relationship::{ObjectReference, Relationship, SubjectReference};
    ///
    /// let rel = Relationship::new(
    ///     ObjectReference::new("document", "doc1"),
    ///     "viewer",
    ///     SubjectReference::new("user", "alice"),
    /// );
    /// assert_eq!(rel.to_string(), "document:doc1#viewer@user:alice");
    /// ```
    pub fn new(
        resource: ObjectReference,
        relation: impl Into<String>,
        subject: impl Into<SubjectReference>,
    ) -> Self {
        Self {
            resource,
            relation: relation.into(),
            subject: subject.into(),
        }
    }

    /// Parses a relationship from its textual encoding.
    ///
    /// Fails with [`ParseError::InvalidFormat`] when a delimiter is missing, a
    /// component is empty, or a component contains characters outside its
    /// allowed alphabet.
    ///
    /// ```rust
    /// use spicedb_relationship::{ParseError, Relationship};
    ///
    /// let err = Relationship::parse("badinput").unwrap_err();
    /// assert!(matches!(err, ParseError::InvalidFormat { .. }));
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let (resource, rest) = input
            .split_once('#')
            .ok_or_else(|| ParseError::invalid_format(input, "missing '#' separator"))?;

        let (relation, subject) = rest
            .split_once('@')
            .ok_or_else(|| ParseError::invalid_format(input, "missing '@' separator"))?;

        let resource = parse_object(input, resource, Side::Resource)?;
        validate_relation(input, relation, "empty or invalid relation")?;

        let (subject_object, subject_relation) = match subject.split_once('#') {
            Some((object, relation)) => {
                validate_relation(input, relation, "empty or invalid subject relation")?;
                (object, Some(relation))
            }
            None => (subject, None),
        };
        let subject_object = parse_object(input, subject_object, Side::Subject)?;
        if subject_relation.is_some() && subject_object.object_id() == "*" {
            return Err(ParseError::invalid_format(
                input,
                "wildcard subject cannot have a relation",
            ));
        }

        Ok(Self {
            resource,
            relation: relation.to_owned(),
            subject: SubjectReference {
                object: subject_object,
                optional_relation: subject_relation.map(str::to_owned),
            },
        })
    }

    /// Returns the resource (object) of the relationship.
    #[inline]
    pub fn resource(&self) -> &ObjectReference {
        &self.resource
    }

    /// Returns the relation (edge label) of the relationship.
    #[inline]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the subject of the relationship.
    #[inline]
    pub fn subject(&self) -> &SubjectReference {
        &self.subject
    }

    /// Returns the resource type.
    #[inline]
    pub fn resource_type(&self) -> &str {
        self.resource.object_type()
    }

    /// Returns the resource ID.
    #[inline]
    pub fn resource_id(&self) -> &str {
        self.resource.object_id()
    }

    /// Returns the subject type.
    #[inline]
    pub fn subject_type(&self) -> &str {
        self.subject.object.object_type()
    }

    /// Returns the subject ID.
    #[inline]
    pub fn subject_id(&self) -> &str {
        self.subject.object.object_id()
    }

    /// Returns the subject relation if this is a subject set.
    ///
    /// Returns `None` for direct subjects like `user:alice`.
    #[inline]
    pub fn subject_relation(&self) -> Option<&str> {
        self.subject.optional_relation()
    }

    /// Returns `true` if the subject is a subject set.
    pub fn is_subject_set(&self) -> bool {
        self.subject.optional_relation.is_some()
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.resource, self.relation, self.subject)
    }
}

impl FromStr for Relationship {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relationship::parse(s)
    }
}

impl TryFrom<&str> for Relationship {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Relationship::parse(value)
    }
}

impl Serialize for Relationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Relationship::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Resource,
    Subject,
}

fn parse_object(input: &str, text: &str, side: Side) -> Result<ObjectReference, ParseError> {
    let (object_type, object_id) = text.split_once(':').ok_or_else(|| {
        ParseError::invalid_format(
            input,
            match side {
                Side::Resource => "missing ':' in resource",
                Side::Subject => "missing ':' in subject",
            },
        )
    })?;

    if !is_valid_type(object_type) {
        return Err(ParseError::invalid_format(
            input,
            match side {
                Side::Resource => "empty or invalid resource type",
                Side::Subject => "empty or invalid subject type",
            },
        ));
    }

    let id_ok = match side {
        Side::Resource => is_valid_id(object_id),
        // Subjects may be a public wildcard, e.g. `user:*`.
        Side::Subject => object_id == "*" || is_valid_id(object_id),
    };
    if !id_ok {
        return Err(ParseError::invalid_format(
            input,
            match side {
                Side::Resource => "empty or invalid resource id",
                Side::Subject => "empty or invalid subject id",
            },
        ));
    }

    Ok(ObjectReference::new(object_type, object_id))
}

fn validate_relation(input: &str, relation: &str, reason: &'static str) -> Result<(), ParseError> {
    if is_valid_identifier(relation) {
        Ok(())
    } else {
        Err(ParseError::invalid_format(input, reason))
    }
}

const MAX_NAME_LEN: usize = 64;
const MAX_NAMESPACE_LEN: usize = 63;
const MAX_ID_LEN: usize = 1024;

/// `[a-z][a-z0-9_]{1,62}[a-z0-9]`
fn is_valid_identifier(s: &str) -> bool {
    is_valid_name(s, MAX_NAME_LEN)
}

fn is_valid_name(s: &str, max_len: usize) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 3 || bytes.len() > max_len {
        return false;
    }
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes
            .iter()
            .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// An identifier optionally prefixed by namespaces: `tenant/document`.
fn is_valid_type(s: &str) -> bool {
    match s.rsplit_once('/') {
        Some((namespaces, name)) => {
            is_valid_identifier(name)
                && namespaces
                    .split('/')
                    .all(|ns| is_valid_name(ns, MAX_NAMESPACE_LEN))
        }
        None => is_valid_identifier(s),
    }
}

/// `[a-zA-Z0-9/_|\-=+]{1,1024}`
fn is_valid_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_ID_LEN
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '|' | '-' | '=' | '+'))
}
