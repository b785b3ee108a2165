//! Shared syntax frontend for the Py++ language: line tokenizer and statement model.
//!
//! This crate is dependency-light and does no I/O; the compiler crate layers
//! preprocessing, module resolution, and C++ emission on top of it.
//!
//! ## Notes
//! - Py++ has no AST. Each line is tokenized on its own and classified into a [`statement::Statement`]; block
//!   structure is tracked by whoever walks the lines.
//! - The tokenizer is lossless, so rewrites (macro expansion, symbol renaming) can operate on tokens and reassemble the
//!   exact original text around them.
//!
//! ## Examples
//! ```rust
//! use pypp_syntax::statement::{BlockEffect, Statement};
//!
//! let stmt = Statement::classify("while i < 10").unwrap();
//! assert_eq!(stmt.block_effect(), BlockEffect::Open);
//! ```

pub mod lexer;
pub mod statement;

pub use lexer::{Token, TokenKind, tokenize};
pub use statement::{BlockEffect, FunctionHeader, Statement, SyntaxError};
