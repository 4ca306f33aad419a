//! Batching policy and insert options

/// Upper bound on the rows rendered into one `INSERT` statement
pub const MAX_ROWS_PER_STATEMENT: usize = 5000;

/// Options controlling how an insert is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOptions {
    /// Emit `INSERT IGNORE` so duplicate-key rows are skipped by the server
    pub ignore_duplicates: bool,
    /// Treat string values shaped like `NOW()` as raw function calls
    pub detect_sql_functions: bool,
    /// Maximum rows per statement
    pub batch_size: usize,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_duplicates(mut self, ignore: bool) -> Self {
        self.ignore_duplicates = ignore;
        self
    }

    pub fn with_detect_sql_functions(mut self, detect: bool) -> Self {
        self.detect_sql_functions = detect;
        self
    }

    /// Set the rows-per-statement limit (at least 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            ignore_duplicates: false,
            detect_sql_functions: false,
            batch_size: MAX_ROWS_PER_STATEMENT,
        }
    }
}

/// Split rows into consecutive batches of at most `batch_size`.
pub fn partition<T>(rows: &[T], batch_size: usize) -> impl Iterator<Item = &[T]> {
    rows.chunks(batch_size.max(1))
}
