// nova-typeck - Error type for the Nova type checker
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type and borrow checking errors.

use std::fmt;

use nova_parser::Span;

/// A type or borrow error, anchored to the span that produced it.
///
/// # Examples
///
/// ```
/// use nova_parser::Span;
/// use nova_typeck::TypeError;
///
/// let err = TypeError::new("Undefined variable: x", Span::new(4, 5));
/// assert_eq!(err.to_string(), "Type error at 4:5: Undefined variable: x");
/// ```
#[derive(Debug, Clone)]
pub struct TypeError {
    pub message: String,
    pub span: Span,
}

impl TypeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        TypeError {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type error at {}:{}: {}",
            self.span.start, self.span.end, self.message
        )
    }
}

impl std::error::Error for TypeError {}
