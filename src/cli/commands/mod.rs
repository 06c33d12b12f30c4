//! CLI command implementations

pub mod generate;
pub mod templates;

pub use generate::{GenerateArgs, handle_generate};
pub use templates::{handle_templates_export, handle_templates_list};
