//! The document model.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The intent attached to a document operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    Put,
    Update,
    Remove,
}

/// A structured document identifier of the form
/// `id:<namespace>:<type>:[n=<number>|g=<group>]:<user-specific>`.
///
/// Two documents collide iff their ids compare equal; the dispatcher
/// serializes colliding operations in producer order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocId {
    namespace: String,
    doc_type: String,
    number: Option<u64>,
    group: Option<String>,
    user_specific: String,
}

impl DocId {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn number(&self) -> Option<u64> {
        self.number
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn user_specific(&self) -> &str {
        &self.user_specific
    }
}

/// Errors produced when parsing a [`DocId`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseDocIdError {
    #[error("document id must start with \"id:\": {0:?}")]
    MissingScheme(String),
    #[error("document id has too few parts: {0:?}")]
    TooFewParts(String),
    #[error("invalid location in document id: {0:?}")]
    InvalidLocation(String),
    #[error("empty {0} in document id")]
    EmptyField(&'static str),
}

impl FromStr for DocId {
    type Err = ParseDocIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(5, ':');
        if parts.next() != Some("id") {
            return Err(ParseDocIdError::MissingScheme(s.to_string()));
        }
        let (Some(namespace), Some(doc_type), Some(location), Some(user_specific)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseDocIdError::TooFewParts(s.to_string()));
        };
        if namespace.is_empty() {
            return Err(ParseDocIdError::EmptyField("namespace"));
        }
        if doc_type.is_empty() {
            return Err(ParseDocIdError::EmptyField("document type"));
        }
        if user_specific.is_empty() {
            return Err(ParseDocIdError::EmptyField("user-specific part"));
        }
        let (number, group) = if location.is_empty() {
            (None, None)
        } else if let Some(number) = location.strip_prefix("n=") {
            let number = number
                .parse()
                .map_err(|_| ParseDocIdError::InvalidLocation(s.to_string()))?;
            (Some(number), None)
        } else if let Some(group) = location.strip_prefix("g=") {
            (None, Some(group.to_string()))
        } else {
            return Err(ParseDocIdError::InvalidLocation(s.to_string()));
        };
        Ok(DocId {
            namespace: namespace.to_string(),
            doc_type: doc_type.to_string(),
            number,
            group,
            user_specific: user_specific.to_string(),
        })
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{}:{}:", self.namespace, self.doc_type)?;
        match (self.number, &self.group) {
            (Some(number), _) => write!(f, "n={number}")?,
            (None, Some(group)) => write!(f, "g={group}")?,
            (None, None) => {}
        }
        write!(f, ":{}", self.user_specific)
    }
}

/// An immutable document operation submitted by the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,
    pub operation: Operation,
    /// Opaque payload; empty for most removes.
    pub body: Vec<u8>,
}

impl Document {
    pub fn new(id: DocId, operation: Operation, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            operation,
            body: body.into(),
        }
    }

    pub fn put(id: DocId, body: impl Into<Vec<u8>>) -> Self {
        Self::new(id, Operation::Put, body)
    }

    pub fn update(id: DocId, body: impl Into<Vec<u8>>) -> Self {
        Self::new(id, Operation::Update, body)
    }

    pub fn remove(id: DocId) -> Self {
        Self::new(id, Operation::Remove, Vec::new())
    }
}
