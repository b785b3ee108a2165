//! Py++ compiler backend
//!
//! Turns the resolved, preprocessed source into a C++17 translation unit and
//! hands it to a native compiler.
//!
//! ## Module Organization
//!
//! - `transpiler.rs` - Block-structured statement translation
//! - `emitter.rs` - Low-level C++ code string builder
//! - `prelude.rs` - Headers and runtime helpers of every unit
//! - `toolchain.rs` - Native compiler invocation

pub mod emitter;
pub mod prelude;
pub mod toolchain;
pub mod transpiler;

pub use toolchain::{NativeCompiler, OutputKind, ToolchainError};
pub use transpiler::{BlockFrame, BlockKind, Transpiler, transpile};
