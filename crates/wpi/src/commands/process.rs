//! `wpi process` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use wpi_directives::{BlockInfo, DirectiveProcessor};

use super::{StoreArgs, processor_config, read_input, seed_store};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the process command.
#[derive(Args)]
pub(crate) struct ProcessArgs {
    /// HTML file to process (default: stdin).
    file: Option<PathBuf>,

    #[command(flatten)]
    store: StoreArgs,

    /// Treat the document as a block without interactivity support.
    #[arg(long)]
    inert: bool,

    /// Enable verbose output (debug logs).
    #[arg(short, long)]
    pub verbose: bool,
}

/// The whole input document, processed as a single root block.
struct Document {
    interactive: bool,
}

impl BlockInfo for Document {
    fn name(&self) -> &str {
        "wpi/document"
    }

    fn supports_interactivity(&self) -> bool {
        self.interactive
    }
}

impl ProcessArgs {
    /// Execute the process command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, seeding or I/O fails. Directive
    /// problems are reported as warnings and never fail the command.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.store.load_config()?;
        let store = seed_store(&config.store_seeds)?;
        let html = read_input(self.file.as_deref())?;

        let (processed, warnings) = process_document(
            &html,
            &store,
            &config.directives,
            &Document {
                interactive: !self.inert,
            },
        );
        for warning in &warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(processed.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

fn process_document(
    html: &str,
    store: &wpi_store::Store,
    config: &wpi_config::DirectivesConfig,
    root: &dyn BlockInfo,
) -> (String, Vec<String>) {
    let mut processor = DirectiveProcessor::with_config(store.snapshot(), processor_config(config));
    let processed = processor.process(html, root);
    (processed, processor.warnings().to_vec())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wpi_config::{DirectivesConfig, StateResolutionMode};
    use wpi_store::Store;

    use super::*;

    const INTERACTIVE: Document = Document { interactive: true };

    #[test]
    fn test_process_document_binds_state() {
        let store = Store::new();
        store.merge_json(r#"{"state": {"label": "Buy"}}"#).unwrap();

        let (html, warnings) = process_document(
            r#"<button data-wp-bind--aria-label="state.label">x</button>"#,
            &store,
            &DirectivesConfig::default(),
            &INTERACTIVE,
        );

        assert_eq!(
            html,
            r#"<button data-wp-bind--aria-label="state.label" aria-label="Buy">x</button>"#
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_process_document_inert_root() {
        let store = Store::new();
        store.merge_json(r#"{"state": {"label": "Buy"}}"#).unwrap();
        let input = r#"<button data-wp-bind--aria-label="state.label">x</button>"#;

        let (html, _) = process_document(
            input,
            &store,
            &DirectivesConfig::default(),
            &Document { interactive: false },
        );

        assert_eq!(html, input);
    }

    #[test]
    fn test_process_document_namespaced_state() {
        let store = Store::new();
        store
            .merge_json(r#"{"shop": {"state": {"open": true}}}"#)
            .unwrap();
        let config = DirectivesConfig {
            state_resolution: StateResolutionMode::Namespace,
            default_namespace: None,
        };

        let (html, _) = process_document(
            r#"<div data-wp-interactive='{"namespace": "shop"}'><p data-wp-class--open="state.open"></p></div>"#,
            &store,
            &config,
            &INTERACTIVE,
        );

        assert!(html.contains(r#"<p data-wp-class--open="state.open" class="open">"#));
    }

    #[test]
    fn test_process_document_reports_warnings() {
        let store = Store::new();
        let (_, warnings) = process_document(
            "<div data-wp-context='{broken'></div>",
            &store,
            &DirectivesConfig::default(),
            &INTERACTIVE,
        );
        assert_eq!(warnings.len(), 1);
    }
}
