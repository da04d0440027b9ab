//! Cursor-based pagination.
//!
//! A page is a bounded slice of an ordered key/value collection. The cursor
//! handed back to clients is the key of the last entry in the page; resuming
//! with it continues strictly after that entry.
//!
//! A limit of `0` disables pagination and returns every remaining entry.

use serde::{Deserialize, Serialize};

/// Paging metadata attached to list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingMetadata {
    /// Continuation token, absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One page of results plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<V> {
    /// Entries of this page, in source order
    pub result: Vec<V>,
    /// Continuation metadata
    #[serde(default)]
    pub paging_metadata: PagingMetadata,
}

impl<V> PagedResult<V> {
    /// Cursor to pass back for the next page, if there is one.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging_metadata.cursor.as_deref()
    }

    /// Whether more entries follow this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.paging_metadata.cursor.is_some()
    }

    /// Transform the entries while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(V) -> U) -> PagedResult<U> {
        PagedResult {
            result: self.result.into_iter().map(f).collect(),
            paging_metadata: self.paging_metadata,
        }
    }
}

/// A validated page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of entries; `0` means unbounded
    limit: usize,
    /// Key of the last entry already delivered
    cursor: Option<String>,
}

impl PageRequest {
    /// Validate a raw limit/cursor pair as received from a client.
    ///
    /// An empty cursor is treated the same as no cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PagingError::InvalidLimit`] if `limit` is negative.
    pub fn new(limit: i32, cursor: Option<&str>) -> Result<Self, PagingError> {
        let limit = usize::try_from(limit).map_err(|_| PagingError::InvalidLimit(limit))?;
        Ok(Self {
            limit,
            cursor: cursor.filter(|c| !c.is_empty()).map(str::to_string),
        })
    }

    /// A request that returns every entry in one page.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Requested limit (`0` when unbounded).
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Cursor to resume after, if any.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Cut one page out of `entries`.
    ///
    /// `entries` must yield pairs in the collection's stable iteration order.
    /// The source is only read. If the cursor does not match any key the page
    /// is empty.
    pub fn apply<'a, K, V, I>(&self, entries: I) -> PagedResult<V>
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: AsRef<str> + ?Sized + 'a,
        V: Clone + 'a,
    {
        let mut iter = entries.into_iter();

        if let Some(cursor) = self.cursor.as_deref() {
            // Consumes everything up to and including the cursor entry.
            if !iter.by_ref().any(|(key, _)| key.as_ref() == cursor) {
                tracing::warn!(cursor, "Pagination cursor matched no entry, returning empty page");
            }
        }

        if self.limit == 0 {
            return PagedResult {
                result: iter.map(|(_, v)| v.clone()).collect(),
                paging_metadata: PagingMetadata::default(),
            };
        }

        // One extra entry tells whether another page follows.
        let mut window: Vec<(&K, &V)> = iter.take(self.limit.saturating_add(1)).collect();
        let has_more = window.len() > self.limit;
        window.truncate(self.limit);

        let cursor = if has_more {
            window.last().map(|&(key, _)| key.as_ref().to_string())
        } else {
            None
        };

        tracing::trace!(
            limit = self.limit,
            returned = window.len(),
            has_more,
            "Built page"
        );

        PagedResult {
            result: window.into_iter().map(|(_, v)| v.clone()).collect(),
            paging_metadata: PagingMetadata { cursor },
        }
    }
}

/// Paginate `entries` with a raw client-supplied limit and cursor.
///
/// # Errors
///
/// Returns [`PagingError::InvalidLimit`] if `limit` is negative.
///
/// # Examples
///
/// ```
/// use basyx_core::paginate;
///
/// let shells = vec![("a", 1), ("b", 2), ("c", 3), ("d", 4)];
/// let entries = shells.iter().map(|(k, v)| (*k, v));
///
/// let page = paginate(entries, 2, None).unwrap();
/// assert_eq!(page.result, vec![1, 2]);
/// assert_eq!(page.next_cursor(), Some("b"));
/// ```
pub fn paginate<'a, K, V, I>(
    entries: I,
    limit: i32,
    cursor: Option<&str>,
) -> Result<PagedResult<V>, PagingError>
where
    I: IntoIterator<Item = (&'a K, &'a V)>,
    K: AsRef<str> + ?Sized + 'a,
    V: Clone + 'a,
{
    Ok(PageRequest::new(limit, cursor)?.apply(entries))
}

/// Errors that can occur when building a page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PagingError {
    /// The limit was negative
    #[error("invalid argument: limit must not be negative, got {0}")]
    InvalidLimit(i32),
}

impl PagingError {
    /// HTTP status the error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            PagingError::InvalidLimit(_) => 400,
        }
    }
}
