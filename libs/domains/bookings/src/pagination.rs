//! Keyset pagination over bookings.
//!
//! Pages are ordered by `(created_at DESC, id DESC)`. A page fetches one row
//! more than requested so `has_next_page` / `has_previous_page` can be
//! answered without a second query; `total_count` comes from a separate count.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::models::Booking;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Sort key of a row: creation time, then id to break ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorKey {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// Rows that can be placed in a keyset page
pub trait Keyed {
    fn cursor_key(&self) -> CursorKey;
}

impl Keyed for Booking {
    fn cursor_key(&self) -> CursorKey {
        CursorKey {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

/// Opaque page cursor handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn encode(key: CursorKey) -> Self {
        let raw = format!("{}|{}", key.created_at.timestamp_micros(), key.id);
        Self(URL_SAFE_NO_PAD.encode(raw))
    }

    pub fn decode(&self) -> BookingResult<CursorKey> {
        let invalid = || BookingError::InvalidCursor(self.0.clone());

        let bytes = URL_SAFE_NO_PAD.decode(&self.0).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (micros, id) = raw.split_once('|').ok_or_else(invalid)?;

        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let created_at = DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?;
        let id = Uuid::parse_str(id).map_err(|_| invalid())?;

        Ok(CursorKey { created_at, id })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-facing page arguments (`first`/`after` forward, `last`/`before` backward)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub first: Option<u64>,
    pub after: Option<Cursor>,
    pub last: Option<u64>,
    pub before: Option<Cursor>,
}

impl PageRequest {
    pub fn first(size: u64) -> Self {
        Self {
            first: Some(size),
            ..Default::default()
        }
    }

    pub fn last(size: u64) -> Self {
        Self {
            last: Some(size),
            ..Default::default()
        }
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.after = Some(cursor);
        self
    }

    pub fn before(mut self, cursor: Cursor) -> Self {
        self.before = Some(cursor);
        self
    }

    /// Resolve into the query the store executes
    pub fn to_keyset(&self) -> BookingResult<KeysetQuery> {
        if self.first.is_some() && self.last.is_some() {
            return Err(BookingError::Validation(
                "`first` and `last` cannot be combined".to_string(),
            ));
        }

        let backward = self.last.is_some() || (self.before.is_some() && self.first.is_none());
        let (direction, size, boundary, stray) = if backward {
            (Direction::Backward, self.last, &self.before, &self.after)
        } else {
            (Direction::Forward, self.first, &self.after, &self.before)
        };

        if stray.is_some() {
            return Err(BookingError::Validation(
                "`after` pages forward with `first`, `before` pages backward with `last`"
                    .to_string(),
            ));
        }

        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(BookingError::Validation(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(KeysetQuery {
            direction,
            size,
            boundary: boundary.as_ref().map(Cursor::decode).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Newest first, rows strictly older than the boundary
    Forward,
    /// Oldest first, rows strictly newer than the boundary
    Backward,
}

/// Store-level keyset query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeysetQuery {
    pub direction: Direction,
    pub size: u64,
    pub boundary: Option<CursorKey>,
}

impl KeysetQuery {
    /// Rows to fetch: one extra to detect another page
    pub fn fetch_limit(&self) -> u64 {
        self.size + 1
    }

    /// Whether a row lies past the boundary in the query direction
    pub fn admits(&self, key: CursorKey) -> bool {
        match (self.direction, self.boundary) {
            (_, None) => true,
            (Direction::Forward, Some(boundary)) => key < boundary,
            (Direction::Backward, Some(boundary)) => key > boundary,
        }
    }

    /// Sort rows into query order and keep at most `fetch_limit` of them
    pub fn apply<T: Keyed>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut rows: Vec<T> = rows
            .into_iter()
            .filter(|row| self.admits(row.cursor_key()))
            .collect();

        match self.direction {
            Direction::Forward => rows.sort_by(|a, b| b.cursor_key().cmp(&a.cursor_key())),
            Direction::Backward => rows.sort_by_key(Keyed::cursor_key),
        }
        rows.truncate(self.fetch_limit() as usize);
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<Cursor>,
    pub end_cursor: Option<Cursor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    pub total_count: u64,
}

impl<T: Keyed> Connection<T> {
    /// Build a page from rows fetched in query order (up to `fetch_limit`)
    pub fn from_rows(mut rows: Vec<T>, query: &KeysetQuery, total_count: u64) -> Self {
        let has_more = rows.len() as u64 > query.size;
        rows.truncate(query.size as usize);
        if query.direction == Direction::Backward {
            rows.reverse();
        }

        let edges: Vec<Edge<T>> = rows
            .into_iter()
            .map(|node| Edge {
                cursor: Cursor::encode(node.cursor_key()),
                node,
            })
            .collect();

        let resumed = query.boundary.is_some();
        let (has_next_page, has_previous_page) = match query.direction {
            Direction::Forward => (has_more, resumed),
            Direction::Backward => (resumed, has_more),
        };

        let page_info = PageInfo {
            has_next_page,
            has_previous_page,
            start_cursor: edges.first().map(|edge| edge.cursor.clone()),
            end_cursor: edges.last().map(|edge| edge.cursor.clone()),
        };

        Self {
            edges,
            page_info,
            total_count,
        }
    }
}

impl<T> Connection<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }
}
