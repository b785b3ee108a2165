//! Runtime prelude of every emitted translation unit
//!
//! The headers make generated programs self-contained; the helpers are
//! written in Py++ and go through the same pipeline as user code.

/// Header block emitted verbatim at the top of the output.
pub const HEADERS: &[&str] = &[
    "#include <iostream>",
    "#include <cstdint>",
    "#include <cstdlib>",
    "#include <limits>",
    "#include <string>",
    "#include <vector>",
    "#include <cstring>",
    "#if __cplusplus >= 201703L",
    "    #include <filesystem>",
    "    namespace fs = std::filesystem;",
    "#else",
    "    #include <experimental/filesystem>",
    "    namespace fs = std::experimental::filesystem;",
    "#endif",
    "#define __THIS__ fs::path(__argv[0])",
];

/// Py++ helpers compiled ahead of user code.
///
/// `sstoi` parses an integer, yielding `-1` on any failure.
pub const RUNTIME_SOURCE: &str = "\
fn sstoi(std::string s) -> int
    try
        return std::stoi(s)
    catch ...
        return -1
    end
end";

/// Number of source lines [`RUNTIME_SOURCE`] contributes.
pub fn runtime_line_count() -> usize {
    RUNTIME_SOURCE.lines().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_source_is_one_function() {
        assert_eq!(runtime_line_count(), 7);
        assert!(RUNTIME_SOURCE.starts_with("fn sstoi("));
    }

    #[test]
    fn test_headers_bind_fs_namespace() {
        assert!(HEADERS.contains(&"#include <iostream>"));
        assert_eq!(HEADERS.iter().filter(|h| h.contains("namespace fs")).count(), 2);
    }
}
