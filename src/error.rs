use thiserror::Error;

/// What went wrong while parsing a range or pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid syntax")]
    Syntax,
    #[error("start is greater than end")]
    ReversedRange,
    #[error("step must be a positive integer")]
    InvalidStep,
    #[error("ambiguous zero padding")]
    PaddingMismatch,
    #[error("unbalanced brackets")]
    UnbalancedBrackets,
    #[error("nested brackets are not supported")]
    NestedBrackets,
    #[error("empty range")]
    EmptyRange,
    #[error("number too large")]
    Overflow,
}

/// A parse failure, pointing at the offending fragment of the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in '{fragment}' at offset {offset}")]
pub struct ParseError {
    kind: ParseErrorKind,
    fragment: String,
    offset: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, fragment: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            fragment: fragment.into(),
            offset,
        }
    }

    /// Shifts the reported offset, for errors raised while parsing an
    /// embedded sub-expression.
    pub(crate) fn at_offset(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// The substring that could not be parsed.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Byte offset of the fragment in the original input.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Any failure reported by the library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("set of {requested} members exceeds the limit of {max}")]
    ResourceLimit { requested: u64, max: u64 },
}

impl Error {
    /// The offending fragment, when the error carries one.
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Error::Parse(e) => Some(e.fragment()),
            Error::ResourceLimit { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let e = ParseError::new(ParseErrorKind::ReversedRange, "9-2", 5);
        assert_eq!(
            e.to_string(),
            "start is greater than end in '9-2' at offset 5"
        );
        assert_eq!(e.fragment(), "9-2");
        assert_eq!(e.offset(), 5);
    }

    #[test]
    fn test_offset_shift() {
        let e = ParseError::new(ParseErrorKind::Syntax, "x", 2).at_offset(10);
        assert_eq!(e.offset(), 12);
    }
}
