#![no_main]

use libfuzzer_sys::fuzz_target;
use pypp::{Compiler, CompilerConfig};

fuzz_target!(|data: &[u8]| {
    // Arbitrary text either transpiles or reports a malformed function; it never panics
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Compiler::new(CompilerConfig::new().with_prelude(false)).compile_source(s);
    }
});
