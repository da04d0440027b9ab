//! idShort path parsing and resolution.
//!
//! Grammar:
//!
//! ```text
//! path    = segment ("." segment)*
//! segment = idShort ("[" index "]")*
//! index   = non-negative decimal integer
//! ```
//!
//! `Motor.Ports[1]` addresses the second element of the list `Ports` inside
//! `Motor`. Chained indices (`Matrix[0][1]`) descend through nested lists.
//! Paths are validated completely before the tree is touched.

use crate::element::{ElementNode, Expandable, LoadError};
use std::fmt;
use std::str::FromStr;

/// One dot-separated component of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// idShort of the addressed element
    pub id_short: String,
    /// Positional indices applied after the idShort lookup, in order
    pub indices: Vec<usize>,
}

/// A single lookup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    /// Child matched by idShort
    IdShort(String),
    /// Child matched by position in a list
    Index(usize),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::IdShort(id) => f.write_str(id),
            PathKey::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// A parsed idShort path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdShortPath {
    segments: Vec<PathSegment>,
}

impl IdShortPath {
    /// Parse a path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Malformed`] on any grammar violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use basyx_core::{IdShortPath, PathKey};
    ///
    /// let path = IdShortPath::parse("List[0].Item[2]").unwrap();
    /// assert_eq!(path.keys(), vec![
    ///     PathKey::IdShort("List".into()),
    ///     PathKey::Index(0),
    ///     PathKey::IdShort("Item".into()),
    ///     PathKey::Index(2),
    /// ]);
    ///
    /// assert!(IdShortPath::parse("List[0").is_err());
    /// ```
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::malformed(path, MalformedReason::Empty));
        }

        let segments = path
            .split('.')
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| PathError::malformed(path, reason))?;

        Ok(Self { segments })
    }

    /// Parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Lookup steps in path order.
    #[must_use]
    pub fn keys(&self) -> Vec<PathKey> {
        self.segments
            .iter()
            .flat_map(|segment| {
                std::iter::once(PathKey::IdShort(segment.id_short.clone()))
                    .chain(segment.indices.iter().copied().map(PathKey::Index))
            })
            .collect()
    }

    /// Walk `root` along this path.
    ///
    /// The first step addresses a child of `root`. Deferred containers are
    /// materialized only when the walk has to pass through them.
    ///
    /// Returns `Ok(None)` when some step has no matching child.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Load`] if a deferred container fails to load.
    pub fn resolve(&self, root: &ElementNode) -> Result<Option<ElementNode>, PathError> {
        let mut stack = self.keys();
        stack.reverse();
        walk(root, &mut stack)
    }
}

impl FromStr for IdShortPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IdShortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.id_short)?;
            for index in &segment.indices {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

/// Parse `path` and walk `root` along it.
///
/// # Errors
///
/// Returns [`PathError::Malformed`] before any lookup if the path is invalid,
/// or [`PathError::Load`] if a deferred container fails to load.
pub fn resolve(root: &ElementNode, path: &str) -> Result<Option<ElementNode>, PathError> {
    IdShortPath::parse(path)?.resolve(root)
}

/// Like [`resolve`], reporting a missing element as [`PathError::NotFound`].
///
/// # Errors
///
/// Returns every error of [`resolve`], plus [`PathError::NotFound`].
pub fn resolve_required(root: &ElementNode, path: &str) -> Result<ElementNode, PathError> {
    resolve(root, path)?.ok_or_else(|| PathError::NotFound {
        path: path.to_string(),
    })
}

fn walk(node: &ElementNode, stack: &mut Vec<PathKey>) -> Result<Option<ElementNode>, PathError> {
    let Some(key) = stack.pop() else {
        return Ok(Some(node.clone()));
    };

    let children = node.expand()?;
    match find_child(node, &children, &key) {
        Some(child) => walk(child, stack),
        None => {
            tracing::debug!(parent = node.id_short(), %key, "idShort path step not found");
            Ok(None)
        }
    }
}

fn find_child<'c>(
    parent: &ElementNode,
    children: &'c [ElementNode],
    key: &PathKey,
) -> Option<&'c ElementNode> {
    match (parent, key) {
        (ElementNode::List(_), PathKey::Index(i)) => children.get(*i),
        (ElementNode::Collection(_) | ElementNode::Entity(_), PathKey::IdShort(id)) => {
            children.iter().find(|c| c.id_short() == id)
        }
        _ => None,
    }
}

fn parse_segment(raw: &str) -> Result<PathSegment, MalformedReason> {
    let split = raw.find(|c: char| c == '[' || c == ']').unwrap_or(raw.len());
    let (id_short, mut rest) = raw.split_at(split);

    if id_short.is_empty() {
        return Err(MalformedReason::EmptySegment);
    }

    let mut indices = Vec::new();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(if rest.starts_with(']') {
                MalformedReason::UnmatchedClosingBracket
            } else {
                MalformedReason::TrailingCharacters(rest.to_string())
            });
        };

        let close = body.find(']').ok_or(MalformedReason::MissingClosingBracket)?;
        let content = &body[..close];
        if content.contains('[') {
            return Err(MalformedReason::NestedBracket);
        }

        indices.push(parse_index(content)?);
        rest = &body[close + 1..];
    }

    Ok(PathSegment {
        id_short: id_short.to_string(),
        indices,
    })
}

fn parse_index(content: &str) -> Result<usize, MalformedReason> {
    // `usize::from_str` alone would accept a leading `+`.
    if content.is_empty() || !content.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedReason::InvalidIndex(content.to_string()));
    }
    content
        .parse()
        .map_err(|_| MalformedReason::InvalidIndex(content.to_string()))
}

/// Why a path failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// Empty path
    #[error("path is empty")]
    Empty,
    /// A segment has no idShort (`A..B`, `.A`, `[0]`)
    #[error("empty idShort segment")]
    EmptySegment,
    /// `[` without a matching `]`
    #[error("missing closing bracket")]
    MissingClosingBracket,
    /// `]` without a preceding `[`
    #[error("unmatched closing bracket")]
    UnmatchedClosingBracket,
    /// `[` inside an index
    #[error("nested opening bracket")]
    NestedBracket,
    /// Index is not a non-negative integer
    #[error("invalid index `{0}`")]
    InvalidIndex(String),
    /// Characters after `]` that do not start another index
    #[error("unexpected characters `{0}` after index")]
    TrailingCharacters(String),
}

/// Errors that can occur parsing or resolving an idShort path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path violates the grammar
    #[error("malformed idShort path `{path}`: {reason}")]
    Malformed {
        /// Path as received
        path: String,
        /// Grammar violation
        reason: MalformedReason,
    },
    /// No element exists at the path
    #[error("no element found at idShort path `{path}`")]
    NotFound {
        /// Path as received
        path: String,
    },
    /// A deferred container could not be materialized
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl PathError {
    fn malformed(path: &str, reason: MalformedReason) -> Self {
        PathError::Malformed {
            path: path.to_string(),
            reason,
        }
    }

    /// HTTP status the error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            PathError::Malformed { .. } => 400,
            PathError::NotFound { .. } => 404,
            PathError::Load(_) => 500,
        }
    }
}
