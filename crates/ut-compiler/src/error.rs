/// Reasons a single filter-list rule is dropped.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("empty pattern")]
    EmptyPattern,

    #[error("subdocument rules are not supported")]
    Subdocument,

    #[error("line is {0} bytes, over the limit")]
    LineTooLong(usize),

    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
