//! cfg-eps computes the nullable non-terminals of a context-free grammar and
//! removes its ε-productions.
//!
//! Grammars use single characters: uppercase letters are non-terminals,
//! lowercase letters and digits are terminals and `ε` is the empty string.
//! The first rule's left-hand side is the start symbol.
//!
//! # Example
//!
//! ```rust
//! use cfg_eps::{compute_nullable, eliminate_epsilon, render_grammar, Grammar};
//!
//! let grammar: Grammar = "S → aSb | ε".parse().unwrap();
//! let nullable = compute_nullable(&grammar);
//! let result = eliminate_epsilon(&grammar, &nullable);
//!
//! assert_eq!(render_grammar(&result), "S → aSb | ab | ε");
//! ```

pub mod eliminate;
pub mod grammar;
pub mod nullable;
pub mod present;
pub mod random;
pub mod utils;

pub use eliminate::{NullableSubsets, eliminate_epsilon};
pub use grammar::{EPSILON, Grammar, GrammarBuilder, GrammarConfig, Production, Symbol};
pub use nullable::{
    LogObserver, NoopObserver, NullableObserver, NullableSet, TraceObserver, compute_nullable,
    compute_nullable_with,
};
pub use present::{Report, render_grammar, render_nullable};
pub use random::{RandomGrammarConfig, random_grammar};
pub use utils::{GrammarError, Result};
