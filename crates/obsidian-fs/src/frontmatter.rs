//! YAML frontmatter parsing for Obsidian notes
//!
//! Parses the YAML frontmatter block at the start of markdown files:
//! ```markdown
//! ---
//! title: My Note
//! tags: [rust, wasm]
//! ---
//!
//! Note content here...
//! ```
//!
//! A note without a block and a note with an empty block are different
//! things: the first parses to `None`, the second to an empty mapping.

pub use serde_yaml::Value as YamlValue;

/// Parsed frontmatter as an ordered YAML mapping.
///
/// Kept as YAML rather than converted to JSON: tags, `.nan`, non-string and
/// complex keys all survive a load/save cycle unchanged.
pub type Frontmatter = serde_yaml::Mapping;

/// A parsed note with frontmatter separated from content.
///
/// The `content` field borrows from `raw` to avoid unnecessary allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote<'a> {
    /// The frontmatter key-value pairs, if a block is present
    pub frontmatter: Option<Frontmatter>,
    /// The note content after the frontmatter (borrows from raw)
    pub content: &'a str,
    /// The raw file content (frontmatter + content)
    pub raw: &'a str,
}

/// Error type for frontmatter operations
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Invalid frontmatter YAML: {0}")]
    InvalidYaml(#[source] serde_yaml::Error),

    #[error("Frontmatter is not a key/value mapping")]
    NotAMapping,

    #[error("Failed to serialize frontmatter: {0}")]
    SerializationError(#[source] serde_yaml::Error),
}

/// Split a note into frontmatter YAML string and content, without parsing the YAML.
///
/// Returns (frontmatter_yaml, content) where frontmatter_yaml is None if
/// no valid frontmatter block was found.
pub fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    // Frontmatter must start at the very beginning with a `---` line
    let Some(block) = raw.strip_prefix("---").and_then(strip_line_break) else {
        return (None, raw);
    };

    // Closing --- must be a line of its own
    let mut pos = 0;
    for line in block.split_inclusive('\n') {
        let trimmed = line.strip_suffix('\n').unwrap_or(line);
        let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
        if trimmed == "---" {
            return (Some(&block[..pos]), &block[pos + line.len()..]);
        }
        pos += line.len();
    }

    // No closing delimiter found
    (None, raw)
}

fn strip_line_break(s: &str) -> Option<&str> {
    s.strip_prefix('\n').or_else(|| s.strip_prefix("\r\n"))
}

/// Parse a note's raw content into frontmatter and content.
///
/// The block is kept as a YAML mapping, so keys and values the caller never
/// touches are written back as they were read. An empty block parses to an
/// empty mapping. A block that is not a mapping (a bare list or scalar) is
/// an error.
pub fn parse_frontmatter(raw: &str) -> Result<ParsedNote<'_>, FrontmatterError> {
    let (yaml_str, content) = split_frontmatter(raw);

    let frontmatter = match yaml_str {
        Some(yaml) => {
            let value = serde_yaml::from_str::<YamlValue>(yaml)
                .map_err(FrontmatterError::InvalidYaml)?;
            Some(into_mapping(value)?)
        }
        None => None,
    };

    Ok(ParsedNote {
        frontmatter,
        content,
        raw,
    })
}

/// Serialize frontmatter to a YAML string.
///
/// Returns the YAML content without the surrounding `---` delimiters.
pub fn serialize_frontmatter(frontmatter: &Frontmatter) -> Result<String, FrontmatterError> {
    serde_yaml::to_string(frontmatter).map_err(FrontmatterError::SerializationError)
}

/// Build a complete note from optional frontmatter and content.
///
/// A present block is always written, even when empty, so that the
/// present/absent distinction survives a round trip.
pub fn build_note_with_frontmatter(
    frontmatter: Option<&Frontmatter>,
    content: &str,
) -> Result<String, FrontmatterError> {
    match frontmatter {
        Some(frontmatter) => {
            let yaml = serialize_frontmatter(frontmatter)?;
            Ok(format!("---\n{}---\n{}", yaml, content))
        }
        None => Ok(content.to_string()),
    }
}

/// Look up a value under a nested key path (`["github", "id"]`).
pub fn get_at_path<'a>(frontmatter: &'a Frontmatter, path: &[&str]) -> Option<&'a YamlValue> {
    let (first, rest) = path.split_first()?;
    let mut current = frontmatter.get(*first)?;
    for key in rest {
        current = current.as_mapping()?.get(*key)?;
    }
    Some(current)
}

/// Replace the value under a nested key path, leaving every other key untouched.
///
/// Missing intermediate keys are created as mappings; intermediates that
/// exist but are not mappings are replaced by one. An existing key keeps
/// its position in the block.
pub fn merge_at_path(frontmatter: &mut Frontmatter, path: &[&str], value: YamlValue) {
    match path {
        [] => {}
        [key] => {
            frontmatter.insert(YamlValue::from(*key), value);
        }
        [key, rest @ ..] => {
            let key = YamlValue::from(*key);
            match frontmatter.get_mut(&key) {
                Some(YamlValue::Mapping(child)) => merge_at_path(child, rest, value),
                _ => {
                    let mut child = Frontmatter::new();
                    merge_at_path(&mut child, rest, value);
                    frontmatter.insert(key, YamlValue::Mapping(child));
                }
            }
        }
    }
}

/// Unwrap the top-level YAML document into a frontmatter mapping
fn into_mapping(yaml: YamlValue) -> Result<Frontmatter, FrontmatterError> {
    match yaml {
        // `---\n---` parses as null
        YamlValue::Null => Ok(Frontmatter::new()),
        YamlValue::Mapping(map) => Ok(map),
        YamlValue::Tagged(tagged) => into_mapping(tagged.value),
        _ => Err(FrontmatterError::NotAMapping),
    }
}
