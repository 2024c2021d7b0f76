//! `${variable}` templates for new notes.
//!
//! Deliberately not a templating language: placeholders are swapped for
//! their values and everything else is copied through as-is.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tokio::fs;

/// Default template for new project notes.
pub const DEFAULT_PROJECT_TEMPLATE: &str = include_str!("../assets/project-note.tpl.md");

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Missing the following variables to make template: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A compiled template and the variables it needs.
#[derive(Debug, Clone)]
pub struct Templater {
    template: String,
    /// Distinct placeholder names, in order of first appearance
    required: Vec<String>,
}

impl Templater {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut seen = HashSet::new();
        let required = PLACEHOLDER
            .captures_iter(&template)
            .map(|caps| caps[1].to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        Self { template, required }
    }

    /// Read and compile a template file.
    pub async fn load(path: &Path) -> Result<Self, TemplateError> {
        let template = fs::read_to_string(path)
            .await
            .map_err(|source| TemplateError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::new(template))
    }

    pub fn required_variables(&self) -> &[String] {
        &self.required
    }

    /// Fill in every placeholder.
    ///
    /// Fails without producing any text if a required variable is missing.
    /// Extra entries in `vars` are ignored. Values are inserted verbatim and
    /// never scanned for placeholders themselves.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String, TemplateError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !vars.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingVariables(missing));
        }

        let rendered = PLACEHOLDER.replace_all(&self.template, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}
