//! The `templates` commands

use std::path::Path;

use super::generate::load_templates;
use crate::cli::error::CliError;
use crate::prompt::TemplateLibrary;

/// Handle `templates export`: write the built-in templates for editing
pub fn handle_templates_export(dir: &Path) -> Result<(), CliError> {
    let written = TemplateLibrary::builtin().export_dir(dir)?;
    for path in &written {
        println!("Wrote {}", path.display());
    }
    println!(
        "\nEdit the files and pass --templates-dir {} to use them.",
        dir.display()
    );
    Ok(())
}

/// Handle `templates list`: show effective templates and where they come from
pub fn handle_templates_list(dir: Option<&Path>) -> Result<(), CliError> {
    let library = load_templates(dir)?;
    for name in library.names() {
        let template = library.get(name)?;
        println!(
            "{:<24} {:<10} {} chars",
            template.name,
            template.version,
            template.body.len()
        );
    }
    Ok(())
}
