//! Pagination types for list operations.
//!
//! Two strategies live here. Offset pages support jump-to-page listings
//! and carry an exact total; cursor pages support feeds that must stay
//! stable while rows are inserted ahead of the reader, and carry an
//! opaque continuation token instead of a total.

use crate::{NestlineError, NestlineResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// The default number of rows per page.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// The maximum number of rows any page may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Clamps a requested limit into `[1, MAX_PAGE_LIMIT]`.
const fn clamp_limit(limit: u32) -> u32 {
    if limit < 1 {
        1
    } else if limit > MAX_PAGE_LIMIT {
        MAX_PAGE_LIMIT
    } else {
        limit
    }
}

/// A request for a page addressed by offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OffsetPageRequest {
    /// Maximum number of rows to return.
    pub limit: u32,
    /// Number of rows to skip before the first returned row.
    pub offset: u64,
}

impl OffsetPageRequest {
    /// Creates a new offset page request with the limit clamped.
    #[must_use]
    pub const fn new(limit: u32, offset: u64) -> Self {
        Self {
            limit: clamp_limit(limit),
            offset,
        }
    }

    /// Creates a request for the first page with the default limit.
    #[must_use]
    pub const fn first() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }

    /// Returns the request for the page following this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset + self.limit as u64,
        }
    }
}

impl Default for OffsetPageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// An opaque continuation token for cursor pagination.
///
/// The token names a position in the sort order, not a row: continuation
/// still works when the row it was minted from has been deleted since.
/// Callers must treat the contents as an uninterpreted string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorToken(String);

impl CursorToken {
    /// Wraps a token received from a caller.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The sort-key position a cursor token encodes.
///
/// Feeds order on `(created_at, id)`; the id breaks ties between rows
/// created in the same microsecond, keeping the ordering strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    /// Creation timestamp of the row at this position.
    pub created_at: DateTime<Utc>,
    /// Row id, the tiebreaker component.
    pub id: Uuid,
}

impl CursorPosition {
    /// Creates a position from a sort key.
    #[must_use]
    pub const fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// Encodes this position as an opaque token.
    #[must_use]
    pub fn token(&self) -> CursorToken {
        let raw = format!("{}:{}", self.created_at.timestamp_micros(), self.id);
        CursorToken(URL_SAFE_NO_PAD.encode(raw.as_bytes()))
    }

    /// Decodes a token back into a position.
    ///
    /// Any undecodable token is a validation error; the layer never
    /// guesses at a position.
    pub fn decode(token: &CursorToken) -> NestlineResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.0.as_bytes())
            .map_err(|_| NestlineError::validation("invalid cursor token"))?;
        let raw = String::from_utf8(bytes)
            .map_err(|_| NestlineError::validation("invalid cursor token"))?;
        let (micros, id) = raw
            .split_once(':')
            .ok_or_else(|| NestlineError::validation("invalid cursor token"))?;
        let micros: i64 = micros
            .parse()
            .map_err(|_| NestlineError::validation("invalid cursor token"))?;
        let created_at = DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| NestlineError::validation("invalid cursor token"))?;
        let id = Uuid::parse_str(id)
            .map_err(|_| NestlineError::validation("invalid cursor token"))?;
        Ok(Self { created_at, id })
    }
}

/// A request for a page addressed by cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPageRequest {
    /// Maximum number of rows to return.
    pub limit: u32,
    /// Continue after this position; `None` starts from the top.
    pub cursor: Option<CursorToken>,
}

impl CursorPageRequest {
    /// Creates a new cursor page request with the limit clamped.
    #[must_use]
    pub fn new(limit: u32, cursor: Option<CursorToken>) -> Self {
        Self {
            limit: clamp_limit(limit),
            cursor,
        }
    }

    /// Creates a request for the first page.
    #[must_use]
    pub fn first(limit: u32) -> Self {
        Self::new(limit, None)
    }

    /// Decodes the cursor, if one is present.
    pub fn position(&self) -> NestlineResult<Option<CursorPosition>> {
        self.cursor.as_ref().map(CursorPosition::decode).transpose()
    }

    /// Number of rows the store should fetch: one extra row past the
    /// limit reveals whether another page exists.
    #[must_use]
    pub const fn fetch_size(&self) -> u32 {
        self.limit + 1
    }
}

/// A page of results addressed by offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetPage<T> {
    /// The rows on this page.
    pub data: Vec<T>,
    /// Total number of rows matching the query across all pages.
    pub total: u64,
    /// The limit the page was fetched with.
    pub limit: u32,
    /// The offset the page was fetched at.
    pub offset: u64,
    /// Whether rows exist beyond this page.
    pub has_more: bool,
}

impl<T> OffsetPage<T> {
    /// Creates a page from fetched rows and the matching total.
    #[must_use]
    pub fn new(data: Vec<T>, total: u64, request: OffsetPageRequest) -> Self {
        let has_more = request.offset + (data.len() as u64) < total;
        Self {
            data,
            total,
            limit: request.limit,
            offset: request.offset,
            has_more,
        }
    }

    /// Creates an empty page.
    #[must_use]
    pub fn empty(request: OffsetPageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    /// Maps the page data to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> OffsetPage<U> {
        OffsetPage {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            has_more: self.has_more,
        }
    }

    /// Returns true if the page holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// A page of results addressed by cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    /// The rows on this page.
    pub data: Vec<T>,
    /// Token for the next page; absent on the final page.
    pub next_cursor: Option<CursorToken>,
    /// Whether rows exist beyond this page.
    pub has_more: bool,
    /// The limit the page was fetched with.
    pub limit: u32,
}

impl<T> CursorPage<T> {
    /// Builds a page from rows fetched with one extra row past `limit`.
    ///
    /// `position` extracts the sort-key position of a row; the position
    /// of the last retained row becomes the continuation token. When no
    /// extra row came back the page is final and carries no token.
    #[must_use]
    pub fn from_rows<F>(mut rows: Vec<T>, limit: u32, position: F) -> Self
    where
        F: Fn(&T) -> CursorPosition,
    {
        let has_more = rows.len() > limit as usize;
        if has_more {
            rows.truncate(limit as usize);
        }
        let next_cursor = if has_more {
            rows.last().map(|row| position(row).token())
        } else {
            None
        };
        Self {
            data: rows,
            next_cursor,
            has_more,
            limit,
        }
    }

    /// Creates an empty final page.
    #[must_use]
    pub const fn empty(limit: u32) -> Self {
        Self {
            data: Vec::new(),
            next_cursor: None,
            has_more: false,
            limit,
        }
    }

    /// Maps the page data to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> CursorPage<U> {
        CursorPage {
            data: self.data.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
            limit: self.limit,
        }
    }

    /// Returns true if the page holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Uuid,
        created_at: DateTime<Utc>,
    }

    impl Row {
        fn position(&self) -> CursorPosition {
            CursorPosition::new(self.created_at, self.id)
        }
    }

    /// Builds `n` rows in newest-first order, one second apart.
    fn rows_desc(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row {
                id: Uuid::now_v7(),
                created_at: Utc.timestamp_opt(1_700_000_000 - i as i64, 0).unwrap(),
            })
            .collect()
    }

    /// Simulates a keyset fetch: rows strictly after `position` in
    /// newest-first order, at most `fetch_size` of them.
    fn keyset_fetch(all: &[Row], request: &CursorPageRequest) -> Vec<Row> {
        let position = request.position().unwrap();
        all.iter()
            .filter(|row| match position {
                None => true,
                Some(p) => {
                    row.created_at < p.created_at
                        || (row.created_at == p.created_at && row.id < p.id)
                }
            })
            .take(request.fetch_size() as usize)
            .cloned()
            .collect()
    }

    #[test]
    fn test_offset_request_clamps_limit() {
        assert_eq!(OffsetPageRequest::new(1000, 0).limit, MAX_PAGE_LIMIT);
        assert_eq!(OffsetPageRequest::new(0, 0).limit, 1);
        assert_eq!(OffsetPageRequest::new(50, 0).limit, 50);
    }

    #[test]
    fn test_cursor_request_clamps_limit() {
        assert_eq!(CursorPageRequest::first(1000).limit, MAX_PAGE_LIMIT);
        assert_eq!(CursorPageRequest::first(0).limit, 1);
    }

    #[test]
    fn test_offset_request_next() {
        let req = OffsetPageRequest::new(10, 0);
        let next = req.next();
        assert_eq!(next.offset, 10);
        assert_eq!(next.limit, 10);
    }

    #[test]
    fn test_offset_page_has_more() {
        let req = OffsetPageRequest::new(10, 0);
        let page = OffsetPage::new(vec![1; 10], 25, req);
        assert!(page.has_more);
        assert_eq!(page.total, 25);

        let last = OffsetPage::new(vec![1; 5], 25, OffsetPageRequest::new(10, 20));
        assert!(!last.has_more);
    }

    #[test]
    fn test_offset_page_exact_boundary() {
        let page = OffsetPage::new(vec![1; 10], 20, OffsetPageRequest::new(10, 10));
        assert!(!page.has_more);
    }

    #[test]
    fn test_offset_page_map() {
        let page = OffsetPage::new(vec![1, 2, 3], 3, OffsetPageRequest::new(10, 0));
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.data, vec![2, 4, 6]);
        assert_eq!(mapped.total, 3);
    }

    #[test]
    fn test_offset_page_empty() {
        let page: OffsetPage<i32> = OffsetPage::empty(OffsetPageRequest::first());
        assert!(page.is_empty());
        assert_eq!(page.len(), 0);
        assert!(!page.has_more);
    }

    #[test]
    fn test_cursor_token_round_trip() {
        let position = CursorPosition::new(
            Utc.timestamp_opt(1_700_000_000, 123_000).unwrap(),
            Uuid::now_v7(),
        );
        let decoded = CursorPosition::decode(&position.token()).unwrap();
        assert_eq!(decoded, position);
    }

    #[test]
    fn test_cursor_token_rejects_garbage() {
        let err = CursorPosition::decode(&CursorToken::new("!!not base64!!")).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        // Valid base64, nonsense payload
        let token = CursorToken::new(URL_SAFE_NO_PAD.encode(b"hello world"));
        assert!(CursorPosition::decode(&token).is_err());
    }

    #[test]
    fn test_cursor_page_trims_extra_row() {
        let rows = rows_desc(11);
        let page = CursorPage::from_rows(rows, 10, Row::position);
        assert_eq!(page.len(), 10);
        assert!(page.has_more);
        assert!(page.next_cursor.is_some());
    }

    #[test]
    fn test_cursor_page_final_has_no_token() {
        let rows = rows_desc(7);
        let page = CursorPage::from_rows(rows, 10, Row::position);
        assert_eq!(page.len(), 7);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_cursor_pages_cover_all_rows_without_overlap() {
        // 25 rows at limit 10 must come back as pages of 10, 10, and 5.
        let all = rows_desc(25);
        let mut request = CursorPageRequest::first(10);
        let mut seen: Vec<Row> = Vec::new();
        let mut sizes = Vec::new();

        loop {
            let fetched = keyset_fetch(&all, &request);
            let page = CursorPage::from_rows(fetched, request.limit, Row::position);
            sizes.push(page.len());
            seen.extend(page.data.iter().cloned());
            match page.next_cursor {
                Some(cursor) => request = CursorPageRequest::new(10, Some(cursor)),
                None => break,
            }
        }

        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(seen, all);
    }

    #[test]
    fn test_cursor_scan_ignores_rows_inserted_ahead() {
        let mut all = rows_desc(15);
        let mut request = CursorPageRequest::first(10);

        let first = CursorPage::from_rows(keyset_fetch(&all, &request), request.limit, Row::position);
        assert_eq!(first.len(), 10);

        // A newer row lands at the top of the feed mid-scan.
        all.insert(
            0,
            Row {
                id: Uuid::now_v7(),
                created_at: Utc.timestamp_opt(1_700_000_100, 0).unwrap(),
            },
        );

        request = CursorPageRequest::new(10, first.next_cursor);
        let second = CursorPage::from_rows(keyset_fetch(&all, &request), request.limit, Row::position);
        assert_eq!(second.len(), 5);
        assert!(!second.has_more);

        // No row appears twice and none of the original tail was skipped.
        let mut ids: Vec<Uuid> = first.data.iter().chain(second.data.iter()).map(|r| r.id).collect();
        let expected: Vec<Uuid> = all[1..].iter().map(|r| r.id).collect();
        assert_eq!(ids, expected);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 15);
    }

    #[test]
    fn test_cursor_continuation_survives_row_deletion() {
        let all = rows_desc(20);
        let request = CursorPageRequest::first(10);
        let first = CursorPage::from_rows(keyset_fetch(&all, &request), request.limit, Row::position);
        let cursor = first.next_cursor.clone().unwrap();

        // The row the cursor was minted from disappears.
        let remaining: Vec<Row> = all
            .iter()
            .filter(|r| r.id != first.data.last().unwrap().id)
            .cloned()
            .collect();

        let request = CursorPageRequest::new(10, Some(cursor));
        let second =
            CursorPage::from_rows(keyset_fetch(&remaining, &request), request.limit, Row::position);
        let expected: Vec<Uuid> = all[10..].iter().map(|r| r.id).collect();
        let got: Vec<Uuid> = second.data.iter().map(|r| r.id).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_cursor_page_map() {
        let page = CursorPage::from_rows(rows_desc(3), 10, Row::position);
        let mapped = page.map(|r| r.id);
        assert_eq!(mapped.len(), 3);
        assert!(!mapped.has_more);
    }

    #[test]
    fn test_tie_broken_by_id() {
        // Two rows share a timestamp; the id ordering keeps the scan strict.
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let low = Uuid::parse_str("00000000-0000-7000-8000-000000000001").unwrap();
        let high = Uuid::parse_str("00000000-0000-7000-8000-000000000002").unwrap();
        let all = vec![
            Row { id: high, created_at: ts },
            Row { id: low, created_at: ts },
        ];

        let request = CursorPageRequest::first(1);
        let first = CursorPage::from_rows(keyset_fetch(&all, &request), request.limit, Row::position);
        assert_eq!(first.data[0].id, high);

        let request = CursorPageRequest::new(1, first.next_cursor);
        let second = CursorPage::from_rows(keyset_fetch(&all, &request), request.limit, Row::position);
        assert_eq!(second.data[0].id, low);
        assert!(!second.has_more);
    }
}
