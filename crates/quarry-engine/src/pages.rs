//! Fixed-size page stream over an offset cursor.
//!
//! Each advance issues one bounded fetch. A full page means there may be
//! more; a short page is yielded once and ends the stream; an empty page
//! ends it without yielding. Once exhausted, no further fetches are issued.

use quarry_core::errors::AccessError;
use quarry_core::types::{Params, Row};
use rusqlite::Connection;

use crate::session::{ensure_statement, Session};

/// Offset-cursor state of a page stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub offset: u64,
    pub page_size: u64,
    pub exhausted: bool,
}

/// A single-pass stream of row pages. Owns its connection; the handle is
/// released when the stream is dropped. Not restartable — a new stream
/// scans from offset 0.
#[derive(Debug)]
pub struct PageStream {
    conn: Connection,
    statement: String,
    params: Params,
    state: PageState,
}

impl PageStream {
    pub(crate) fn new(
        conn: Connection,
        statement: &str,
        params: Params,
        page_size: u64,
    ) -> Result<Self, AccessError> {
        if page_size == 0 {
            return Err(AccessError::InvalidArgument {
                message: "page_size must be positive".to_string(),
            });
        }
        let statement = ensure_statement(statement)?
            .trim_end_matches(';')
            .trim_end()
            .to_string();
        Ok(PageStream {
            conn,
            statement,
            params,
            state: PageState {
                offset: 0,
                page_size,
                exhausted: false,
            },
        })
    }

    /// Current offset-cursor state.
    pub fn state(&self) -> PageState {
        self.state
    }

    /// Fetch the next page. `Ok(None)` once exhausted; a short final page is
    /// yielded before the stream stops.
    pub fn advance(&mut self) -> Result<Option<Vec<Row>>, AccessError> {
        if self.state.exhausted {
            return Ok(None);
        }

        let bounded = format!(
            "{} LIMIT {} OFFSET {}",
            self.statement, self.state.page_size, self.state.offset
        );
        let page = match Session::new(&self.conn).fetch_all(&bounded, &self.params) {
            Ok(page) => page,
            Err(e) => {
                self.state.exhausted = true;
                return Err(e);
            }
        };

        if (page.len() as u64) < self.state.page_size {
            self.state.exhausted = true;
        }
        if page.is_empty() {
            return Ok(None);
        }
        self.state.offset += self.state.page_size;
        Ok(Some(page))
    }

    /// Fold every remaining row while holding at most one page in memory.
    pub fn fold_rows<B, F>(mut self, init: B, mut f: F) -> Result<B, AccessError>
    where
        F: FnMut(B, Row) -> B,
    {
        let mut acc = init;
        while let Some(page) = self.advance()? {
            for row in page {
                acc = f(acc, row);
            }
        }
        Ok(acc)
    }
}

impl Iterator for PageStream {
    type Item = Result<Vec<Row>, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
