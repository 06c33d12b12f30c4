//! Prompt templates and prompt assembly
//!
//! Templates are looked up by name from a [`TemplateLibrary`]. The library
//! starts from the built-in set and can be overlaid with `<name>.txt` files
//! from a directory, so wording can be tuned without rebuilding.

mod templates;

pub use templates::{
    BLUEPRINT_TEMPLATE, BUILTIN_VERSION, REPORT_SYSTEM_INSTRUCTION, REPORT_TEMPLATE,
};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dataset::{DatasetResult, Sample};

/// Version tag for templates read from disk
pub const FILE_VERSION: &str = "file";

/// Errors from the template library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No template registered under the name
    #[error("Prompt template not found: {0}")]
    NotFound(String),

    /// Template directory or file could not be read or written
    #[error("Template IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A named, versioned prompt template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub version: String,
    pub body: String,
}

impl PromptTemplate {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            body: body.into(),
        }
    }
}

/// Named prompt templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, PromptTemplate>,
}

impl TemplateLibrary {
    /// An empty library
    pub fn empty() -> Self {
        Self::default()
    }

    /// The templates compiled into the crate
    pub fn builtin() -> Self {
        let mut library = Self::empty();
        library.insert(PromptTemplate::new(
            BLUEPRINT_TEMPLATE,
            BUILTIN_VERSION,
            templates::BLUEPRINT_BODY,
        ));
        library.insert(PromptTemplate::new(
            REPORT_TEMPLATE,
            BUILTIN_VERSION,
            templates::REPORT_BODY,
        ));
        library
    }

    /// Add or replace a template
    pub fn insert(&mut self, template: PromptTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.insert(template);
        self
    }

    /// Overlay every `<name>.txt` file in `dir`
    ///
    /// Returns the names that were loaded. Other files are ignored.
    pub fn load_dir(&mut self, dir: &Path) -> TemplateResult<Vec<String>> {
        let io_err = |path: &Path, e: std::io::Error| TemplateError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut loaded = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| io_err(dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            debug!(template = name, path = %path.display(), "Loaded prompt template");
            self.insert(PromptTemplate::new(name, FILE_VERSION, body.trim_end()));
            loaded.push(name.to_string());
        }

        loaded.sort();
        Ok(loaded)
    }

    /// Write every template to `dir` as `<name>.txt`
    pub fn export_dir(&self, dir: &Path) -> TemplateResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir).map_err(|e| TemplateError::Io {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut written = Vec::new();
        for template in self.templates.values() {
            let path = dir.join(format!("{}.txt", template.name));
            std::fs::write(&path, format!("{}\n", template.body)).map_err(|e| {
                TemplateError::Io {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
            written.push(path);
        }
        Ok(written)
    }

    /// Look up a template by name
    pub fn get(&self, name: &str) -> TemplateResult<&PromptTemplate> {
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// Registered template names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}

/// Assemble the planning prompt: template, sample metadata, sample rows as CSV
pub fn blueprint_prompt(template: &PromptTemplate, sample: &Sample) -> DatasetResult<String> {
    Ok(format!(
        "{}\n\n{}\n\n{}",
        template.body,
        sample.metadata(),
        sample.to_csv()?
    ))
}

/// Assemble the report prompt from the blueprint and rendered query results
pub fn report_prompt(template: &PromptTemplate, blueprint: &str, results_text: &str) -> String {
    format!(
        "{}\n\n**BLUEPRINT:**\n{}\n\n**QUERY RESULTS (computed from the full dataset):**\n{}",
        template.body, blueprint, results_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, project};

    #[test]
    fn test_builtin_has_both_templates() {
        let library = TemplateLibrary::builtin();
        assert_eq!(library.names(), vec![BLUEPRINT_TEMPLATE, REPORT_TEMPLATE]);
        assert_eq!(library.get(REPORT_TEMPLATE).unwrap().version, BUILTIN_VERSION);
    }

    #[test]
    fn test_missing_template() {
        let library = TemplateLibrary::empty();
        assert_eq!(
            library.get(BLUEPRINT_TEMPLATE).unwrap_err(),
            TemplateError::NotFound(BLUEPRINT_TEMPLATE.to_string())
        );
    }

    #[test]
    fn test_load_dir_overlays_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report-from-results.txt"), "Custom report\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let mut library = TemplateLibrary::builtin();
        let loaded = library.load_dir(dir.path()).unwrap();

        assert_eq!(loaded, vec!["report-from-results"]);
        let template = library.get(REPORT_TEMPLATE).unwrap();
        assert_eq!(template.body, "Custom report");
        assert_eq!(template.version, FILE_VERSION);
        assert_eq!(
            library.get(BLUEPRINT_TEMPLATE).unwrap().version,
            BUILTIN_VERSION
        );
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = TemplateLibrary::builtin();
        let err = library.load_dir(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }

    #[test]
    fn test_export_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let written = TemplateLibrary::builtin().export_dir(dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let mut library = TemplateLibrary::empty();
        library.load_dir(dir.path()).unwrap();
        assert_eq!(
            library.get(BLUEPRINT_TEMPLATE).unwrap().body,
            TemplateLibrary::builtin().get(BLUEPRINT_TEMPLATE).unwrap().body
        );
    }

    #[test]
    fn test_blueprint_prompt_layout() {
        let dataset = Dataset::new(
            vec!["id".into(), "name".into()],
            vec![vec!["1".into(), "ada".into()]],
        )
        .unwrap();
        let template = PromptTemplate::new("t", "v", "HEAD");

        let prompt = blueprint_prompt(&template, &project(&dataset)).unwrap();
        assert_eq!(
            prompt,
            "HEAD\n\nTotal rows: 1\nColumns: id, name\n\nid,name\n1,ada"
        );
    }

    #[test]
    fn test_report_prompt_layout() {
        let template = PromptTemplate::new("t", "v", "HEAD");
        let prompt = report_prompt(&template, "plan", "-- Query 1: SELECT 1\n[]");
        assert_eq!(
            prompt,
            "HEAD\n\n**BLUEPRINT:**\nplan\n\n**QUERY RESULTS (computed from the full dataset):**\n-- Query 1: SELECT 1\n[]"
        );
    }
}
