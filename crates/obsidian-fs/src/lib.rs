//! Frontmatter parsing and path utilities for Obsidian notes
//!
//! Handles YAML frontmatter splitting, parsing and serialization, plus the
//! small path helpers used to recognize and name note files. These are pure
//! functions with no I/O - reading and writing notes is left to the caller.

mod frontmatter;

pub use frontmatter::{
    build_note_with_frontmatter, get_at_path, merge_at_path, parse_frontmatter,
    serialize_frontmatter, split_frontmatter, Frontmatter, FrontmatterError, ParsedNote,
    YamlValue,
};

use std::path::{Path, PathBuf};

/// File extensions recognized as markdown notes
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Whether a path names a markdown note (by extension, case-insensitive).
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Whether a directory entry is hidden (.obsidian, .git, .trash, etc.)
pub fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Path of the note named `name` directly inside `dir`.
///
/// The `.md` extension is always appended, so a name that already ends in
/// `.md` still gets its own extension.
pub fn note_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.md", name))
}
