//! Script applicator: runs every edit of a script against one document.
//!
//! Edits run in script order through a single [`RedlineEditor`], so change
//! ids keep counting up across the whole script. A failing edit is reported
//! and skipped; the edits after it still run.

use crate::config::schema::EditScript;
use crate::document::{Document, RevisionFactory, TrackedChangeFactory};
use crate::edit::{EditError, EditOptions, EditOutcome, RedlineEditor};

/// Outcome of one scripted edit, keyed by its id.
pub type ScriptResult = (String, Result<EditOutcome, EditError>);

/// Apply `script` with default options and a system-clock factory whose ids
/// continue after the document's existing revisions.
pub fn apply_script(document: &mut Document, script: &EditScript) -> Vec<ScriptResult> {
    let factory = RevisionFactory::for_document(document);
    apply_script_with(document, script, &EditOptions::default(), None, factory)
}

/// Apply `script` on top of `base` options with a caller-supplied factory.
///
/// `author_override` beats any author the script names; `base.author` only
/// applies when neither is set.
pub fn apply_script_with<F: TrackedChangeFactory>(
    document: &mut Document,
    script: &EditScript,
    base: &EditOptions,
    author_override: Option<&str>,
    factory: F,
) -> Vec<ScriptResult> {
    let options = script.edit_options(base, author_override);
    tracing::debug!(
        script = %script.meta.name,
        edits = script.edits.len(),
        author = %options.author,
        "applying edit script"
    );
    let mut editor = RedlineEditor::new(options, factory);

    script
        .edits
        .iter()
        .map(|edit| {
            let result = editor.apply_request(document, &edit.to_request());
            if let Err(err) = &result {
                tracing::warn!(edit = %edit.id, error = %err, "edit failed");
            }
            (edit.id.clone(), result)
        })
        .collect()
}
