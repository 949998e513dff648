//! # SORT Command Builder
//!
//! Purpose: Accumulate the options of one `SORT` invocation through chained
//! setters, compile them into a single command, and decode the reply.
//!
//! ## Design Principles
//! 1. **Fluent Accumulator**: Setters return `&mut Self`; scalar options are
//!    last-call-wins, GET patterns append.
//! 2. **Fixed Clause Order**: key, BY, LIMIT, GET..., ASC|DESC, ALPHA, STORE.
//!    Unset clauses are omitted, never padded.
//! 3. **No Silent Truncation**: A reply that does not divide into rows of the
//!    GET pattern count is a decode error.
//!
//! ## Reply Layout
//!
//! ```text
//! SORT pets BY pet:*->age GET # GET pet:*->age
//!
//! wire:  [loki, 0.5, tobi, 1, jane, 3]
//! rows:  [loki, 0.5] [tobi, 1] [jane, 3]     (width = 2, row-major)
//! ```

use tracing::debug;

use rkit_common::{Arg, CommandChannel, KitError, KitResult, Reply};

use crate::key::Key;

/// Sort order of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn token(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Builder for one SORT round trip over a borrowed key.
#[derive(Debug, Clone)]
pub struct SortBuilder<'a> {
    target: &'a Key,
    by: Option<String>,
    get: Vec<String>,
    alpha: bool,
    direction: Direction,
    limit: Option<(i64, i64)>,
    store: Option<String>,
}

impl<'a> SortBuilder<'a> {
    /// Starts an empty builder bound to `target`.
    pub fn new(target: &'a Key) -> Self {
        SortBuilder {
            target,
            by: None,
            get: Vec::new(),
            alpha: false,
            direction: Direction::Asc,
            limit: None,
            store: None,
        }
    }

    /// Compare lexicographically instead of numerically.
    pub fn alpha(&mut self) -> &mut Self {
        self.alpha = true;
        self
    }

    pub fn asc(&mut self) -> &mut Self {
        self.direction = Direction::Asc;
        self
    }

    pub fn desc(&mut self) -> &mut Self {
        self.direction = Direction::Desc;
        self
    }

    /// Sorts by external keys; `*` is replaced by each element and `->field`
    /// dereferences a hash field.
    pub fn by(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.by = Some(pattern.into());
        self
    }

    /// Appends one output column. `#` is the element itself.
    pub fn get(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.get.push(pattern.into());
        self
    }

    /// `limit(offset, count)` pages the result; `limit(count, None)` is
    /// shorthand for `limit(0, count)`.
    pub fn limit(&mut self, offset_or_count: i64, count: impl Into<Option<i64>>) -> &mut Self {
        self.limit = Some(match count.into() {
            Some(count) => (offset_or_count, count),
            None => (0, offset_or_count),
        });
        self
    }

    /// Stores the result under `key` instead of returning it.
    pub fn store(&mut self, key: impl Into<String>) -> &mut Self {
        self.store = Some(key.into());
        self
    }

    /// Compiled arguments, key name first, without the command name.
    pub fn args(&self) -> Vec<Arg> {
        let mut args = Vec::with_capacity(8 + 2 * self.get.len());
        args.push(Arg::from(self.target.name()));
        if let Some(pattern) = &self.by {
            args.push(Arg::from("BY"));
            args.push(Arg::from(pattern));
        }
        if let Some((offset, count)) = self.limit {
            args.push(Arg::from("LIMIT"));
            args.push(Arg::from(offset));
            args.push(Arg::from(count));
        }
        for pattern in &self.get {
            args.push(Arg::from("GET"));
            args.push(Arg::from(pattern));
        }
        args.push(Arg::from(self.direction.token()));
        if self.alpha {
            args.push(Arg::from("ALPHA"));
        }
        if let Some(dest) = &self.store {
            args.push(Arg::from("STORE"));
            args.push(Arg::from(dest));
        }
        args
    }

    /// Sends the compiled command and decodes its reply.
    pub async fn end(&self) -> KitResult<SortReply> {
        let args = self.args();
        debug!(key = self.target.name(), args = args.len(), "issuing sort");
        let reply = self.target.channel().execute("SORT", &args).await?;
        let decoded = self.decode(reply)?;
        debug!(key = self.target.name(), reply = ?decoded.summary(), "sort decoded");
        Ok(decoded)
    }

    /// Decodes a raw SORT reply according to this builder's STORE/GET state.
    pub fn decode(&self, reply: Reply) -> KitResult<SortReply> {
        if self.store.is_some() {
            return match reply {
                Reply::Integer(count) if count >= 0 => Ok(SortReply::Stored(count as u64)),
                other => Err(KitError::decode(format!(
                    "SORT ... STORE expects a non-negative integer, got {}",
                    other.kind()
                ))),
            };
        }

        let items = match reply {
            Reply::Array(items) => items,
            Reply::Nil => Vec::new(),
            other => {
                return Err(KitError::decode(format!(
                    "SORT expects an array, got {}",
                    other.kind()
                )))
            }
        };
        let values = items
            .into_iter()
            .map(bulk_value)
            .collect::<KitResult<Vec<_>>>()?;
        SortRows::regroup(values, self.get.len().max(1)).map(SortReply::Rows)
    }
}

fn bulk_value(item: Reply) -> KitResult<Option<String>> {
    match item {
        Reply::Bulk(None) | Reply::Nil => Ok(None),
        Reply::Bulk(Some(raw)) | Reply::Simple(raw) => String::from_utf8(raw)
            .map(Some)
            .map_err(|_| KitError::decode("SORT value is not valid UTF-8")),
        other => Err(KitError::decode(format!(
            "SORT element must be a bulk string, got {}",
            other.kind()
        ))),
    }
}

/// Decoded SORT reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortReply {
    /// STORE was used; number of elements written to the destination.
    Stored(u64),
    /// Sorted values, one row per element.
    Rows(SortRows),
}

impl SortReply {
    /// The flat row-major values, or `None` for a STORE reply.
    pub fn into_values(self) -> Option<Vec<Option<String>>> {
        match self {
            SortReply::Rows(rows) => Some(rows.into_flat()),
            SortReply::Stored(_) => None,
        }
    }

    /// The stored element count, or `None` when values were returned.
    pub fn stored(&self) -> Option<u64> {
        match self {
            SortReply::Stored(count) => Some(*count),
            SortReply::Rows(_) => None,
        }
    }

    fn summary(&self) -> String {
        match self {
            SortReply::Stored(count) => format!("stored {count}"),
            SortReply::Rows(rows) => format!("{} rows x {}", rows.len(), rows.width()),
        }
    }
}

/// Flat row-major SORT values grouped into rows of `width` columns.
///
/// `None` marks a GET pattern the store could not resolve; it keeps its slot
/// so the rows stay aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortRows {
    width: usize,
    values: Vec<Option<String>>,
}

impl SortRows {
    fn regroup(values: Vec<Option<String>>, width: usize) -> KitResult<Self> {
        if values.len() % width != 0 {
            return Err(KitError::decode(format!(
                "SORT returned {} values for {} GET patterns",
                values.len(),
                width
            )));
        }
        Ok(SortRows { width, values })
    }

    /// Columns per row: the GET pattern count, or 1 without GET.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows (sorted elements).
    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rows in sort order, each `width` long.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> + '_ {
        self.values.chunks_exact(self.width)
    }

    pub fn as_flat(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn into_flat(self) -> Vec<Option<String>> {
        self.values
    }
}
