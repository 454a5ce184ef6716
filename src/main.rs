use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use revision_patcher::config::{apply_script_with, discover_scripts, load_from_path};
use revision_patcher::document::RevisionFactory;
use revision_patcher::edit::{EditError, EditOptions, EditOutcome};
use revision_patcher::locate::{closest_match, LocateError, LocatorOptions, Query, Scope, TextLocator};
use revision_patcher::diff::patch_text;
use revision_patcher::{diff, load_document, save_document, HunkKind, MinimalDiff};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "revision-patcher")]
#[command(about = "Apply word-level tracked changes to documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply edit scripts to a document
    Apply {
        /// Document JSON to edit
        #[arg(short, long)]
        document: PathBuf,

        /// Edit script, or a directory of *.toml scripts
        #[arg(short, long)]
        edits: PathBuf,

        /// Write the result here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Author recorded on every revision, overriding any script author
        #[arg(short, long)]
        author: Option<String>,

        /// Dry run - report outcomes without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// List every match of a text or pattern
    Find {
        #[arg(short, long)]
        document: PathBuf,

        text: String,

        /// Treat TEXT as a regular expression
        #[arg(short, long)]
        regex: bool,
    },

    /// Show the word-level hunks between two strings
    Diff {
        old: String,
        new: String,

        #[arg(long, default_value_t = revision_patcher::DEFAULT_MAX_HUNKS)]
        max_hunks: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            document,
            edits,
            output,
            author,
            dry_run,
        } => cmd_apply(&document, &edits, output.as_deref(), author, dry_run),

        Commands::Find {
            document,
            text,
            regex,
        } => cmd_find(&document, text, regex),

        Commands::Diff { old, new, max_hunks } => {
            cmd_diff(&old, &new, max_hunks);
            Ok(())
        }
    }
}

fn cmd_apply(
    document_path: &Path,
    edits: &Path,
    output: Option<&Path>,
    author: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let mut document = load_document(document_path)?;
    let scripts = discover_scripts(edits)?;

    let base = EditOptions::default();

    println!("Document: {}", document_path.display());
    if dry_run {
        println!("{}", "[DRY RUN - nothing will be written]".cyan());
    }
    println!();

    let mut total_applied = 0;
    let mut total_fallback = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for script_path in scripts {
        println!("Loading edits from {}...", script_path.display());
        let script = load_from_path(&script_path)?;

        // A fresh factory per script still continues after earlier scripts'
        // revisions, since they are already in the document.
        let factory = RevisionFactory::for_document(&document);
        let results =
            apply_script_with(&mut document, &script, &base, author.as_deref(), factory);

        for (edit_id, result) in results {
            match result {
                Ok(outcome @ EditOutcome::Coarse { .. }) => {
                    println!("{} {}: {}", "✓".yellow(), edit_id, outcome);
                    total_fallback += 1;
                }
                Ok(
                    outcome @ (EditOutcome::Minimal { .. } | EditOutcome::Inserted { .. }),
                ) => {
                    println!("{} {}: {}", "✓".green(), edit_id, outcome);
                    total_applied += 1;
                }
                Ok(outcome) => {
                    println!("{} {}: {}", "⊙".yellow(), edit_id, outcome);
                    total_unchanged += 1;
                }
                Err(e) => {
                    eprintln!("{} {}: Error - {}", "✗".red(), edit_id, e);
                    total_failed += 1;
                    report_conflict(&document, &e);
                }
            }
        }
        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!("  {} whole-span fallback", format!("{}", total_fallback).yellow());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if !dry_run {
        let target = output.unwrap_or(document_path);
        save_document(target, &document)
            .with_context(|| format!("failed to write {}", target.display()))?;
        println!("Wrote {}", target.display());
    }

    if total_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Helper: extra diagnostics for search failures.
fn report_conflict(document: &revision_patcher::Document, error: &EditError) {
    match error {
        EditError::Locate(LocateError::NotFound { needle }) => {
            eprintln!("  {}", "CONFLICT: Target text matched no locations".red());
            if let Some(best) = closest_match(document, needle, 0.6) {
                eprintln!(
                    "  Closest: {:?} in {} (similarity {:.2})",
                    best.text, best.paragraph, best.score
                );
            }
        }
        EditError::Locate(LocateError::Ambiguous { candidates, .. }) => {
            eprintln!(
                "  {}",
                format!("CONFLICT: Target matched {} locations (expected 1)", candidates.len())
                    .red()
            );
            for span in candidates {
                eprintln!("    {} chars {}..{}", span.paragraph, span.chars.start, span.chars.end);
            }
            eprintln!("  Action: Restrict the edit with `paragraph` or a longer `find`");
        }
        _ => {}
    }
}

fn cmd_find(document_path: &Path, text: String, regex: bool) -> Result<()> {
    let document = load_document(document_path)?;
    let query = if regex {
        Query::pattern(text)
    } else {
        Query::literal(text)
    };

    let locator = TextLocator::new(LocatorOptions::default());
    let spans = locator.find(&document, &query, &Scope::All)?;
    if spans.is_empty() {
        println!("{}", "No matches".yellow());
        return Ok(());
    }

    for span in &spans {
        let runs = if span.is_split() {
            format!("runs {}..={}", span.first_run(), span.last_run())
        } else {
            format!("run {}", span.first_run())
        };
        println!(
            "{} chars {}..{} ({}): {:?}",
            span.paragraph.to_string().bold(),
            span.chars.start,
            span.chars.end,
            runs.dimmed(),
            span.text
        );
    }
    println!("{} match(es)", spans.len());
    Ok(())
}

fn cmd_diff(old: &str, new: &str, max_hunks: usize) {
    match diff(old, new, max_hunks) {
        MinimalDiff::Unchanged => println!("{}", "No visible change".dimmed()),
        MinimalDiff::Fallback(reason) => {
            println!("{} {}", "Fallback:".yellow(), reason);
            println!("{}", format!("-{old}").red());
            println!("{}", format!("+{new}").green());
        }
        MinimalDiff::Changes(hunks) => {
            for hunk in &hunks {
                let tag = match hunk.kind {
                    HunkKind::Content => "",
                    HunkKind::WhitespaceOnly => " [whitespace]",
                    HunkKind::PunctuationOnly => " [punctuation]",
                };
                println!(
                    "@@ {}..{}{} @@ {}{}",
                    hunk.chars.start,
                    hunk.chars.end,
                    tag,
                    format!("-{:?}", hunk.delete_text).red(),
                    format!(" +{:?}", hunk.insert_text).green()
                );
            }
            // Suppressed whitespace hunks are not in the list, so this can
            // differ from NEW in spacing only.
            println!("{} {}", "Result:".bold(), patch_text(old, &hunks));
        }
    }
}
