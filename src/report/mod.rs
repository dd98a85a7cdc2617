//! Report rendering.

pub mod format;
pub mod generator;

pub use generator::{
    generate_connection_markdown, generate_json, generate_page_markdown,
    generate_preferences_markdown, generate_rows_markdown, generate_workflow_markdown,
    generate_workflows_markdown, write_output,
};
