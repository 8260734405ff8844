//! Error types for the `preygent-program` crate.
//!
//! Execution never fails: underflowing instructions are no-ops and a
//! runaway program simply exhausts its step budget. The only fallible
//! operation is turning text back into a [`Program`].
//!
//! [`Program`]: crate::Program

/// Errors produced while parsing program text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text contained no tokens.
    #[error("program text is empty")]
    Empty,

    /// A closing parenthesis had no matching opening one.
    #[error("unexpected ')' at token {token}")]
    UnexpectedClose {
        /// Zero-based index of the offending token.
        token: usize,
    },

    /// The text ended while lists were still open.
    #[error("{open} unclosed list(s) at end of input")]
    UnclosedList {
        /// Number of lists left open.
        open: usize,
    },

    /// A name did not match any registered instruction.
    #[error("unknown instruction: {name}")]
    UnknownInstruction {
        /// The unrecognized token.
        name: String,
    },

    /// A numeric token did not fit in a 64-bit integer.
    #[error("invalid integer literal: {token}")]
    InvalidInteger {
        /// The offending token.
        token: String,
    },

    /// Lists were nested deeper than the parser accepts.
    #[error("lists nested deeper than {limit}")]
    TooDeep {
        /// Maximum accepted nesting depth.
        limit: usize,
    },
}
