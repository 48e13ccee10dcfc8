pub(crate) const DEFAULT_DATABASE_ID: &str = "(default)";

/// Largest number of values an `IN` filter accepts in a single query.
pub const MAX_IN_FILTER_SIZE: usize = 10;

/// Reserved field path addressing the document name in structured queries.
pub(crate) const DOCUMENT_ID_FIELD: &str = "__name__";
