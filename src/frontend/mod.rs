//! Py++ compiler frontend
//!
//! Text-to-text stages that run before statement transpilation:
//! - `preprocessor`: `define` collection and macro expansion
//! - `module`: import resolution with an injectable [`module::SourceLoader`]
//! - `renamer`: top-level declaration scan and cross-module renaming
//! - `ranges`: integer range literals and comprehension recognition
//! - `diagnostics`: the compiler's error type

pub mod diagnostics;
pub mod module;
pub mod preprocessor;
pub mod ranges;
pub mod renamer;
