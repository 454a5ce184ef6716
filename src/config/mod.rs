pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{apply_script, apply_script_with, ScriptResult};
pub use loader::{discover_scripts, load_from_path, load_from_str, ConfigError};
pub use schema::{
    EditDefinition, EditKind, EditScript, Metadata, ScriptOptions, ValidationError,
    ValidationIssue,
};
