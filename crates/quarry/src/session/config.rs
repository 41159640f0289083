use quarry_core::driver::IsolationLevel;

/// Settings a [`Session`](super::Session) starts with.
///
/// Set once on the [`Db`](crate::Db) builder; individual sessions may be
/// opened with their own copy through [`Db::session_with`](crate::Db::session_with).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Log every statement at `debug` instead of `trace`.
    pub debug: bool,

    /// Row cap applied by `QuerySet::all` and the untyped projections when
    /// no explicit limit was set. `None` disables the cap.
    pub default_rows_limit: Option<u64>,

    /// Depth used when related rows are loaded without an explicit one.
    pub default_related_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_rows_limit: Some(1000),
            default_related_depth: 2,
        }
    }
}

impl SessionConfig {
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn default_rows_limit(mut self, limit: Option<u64>) -> Self {
        self.default_rows_limit = limit;
        self
    }

    pub fn default_related_depth(mut self, depth: usize) -> Self {
        self.default_related_depth = depth;
        self
    }
}

/// Options for starting a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub isolation: Option<IsolationLevel>,
    pub read_only: bool,
}

impl TxOptions {
    /// Set the isolation level for this transaction.
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    /// Set whether this transaction is read-only.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}
