//! `wpi eval` command implementation.

use std::io::Write;

use clap::Args;
use wpi_directives::Evaluator;
use wpi_store::{Map, Value};

use super::{StoreArgs, seed_store, state_resolution};
use crate::error::CliError;

/// Arguments for the eval command.
#[derive(Args)]
pub(crate) struct EvalArgs {
    /// Reference expression, e.g. `state.core.number` or `!context.isOpen`.
    expression: String,

    #[command(flatten)]
    store: StoreArgs,

    /// Context mapping visible to `context.*` references.
    #[arg(long, value_name = "JSON")]
    context: Option<String>,

    /// Active `interactive` namespace, for namespaced state resolution.
    #[arg(short, long)]
    namespace: Option<String>,

    /// Enable verbose output (debug logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl EvalArgs {
    /// Execute the eval command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or seeding fails, or `--context` is
    /// not a JSON object.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let context = parse_context(self.context.as_deref())?;
        let config = self.store.load_config()?;
        let store = seed_store(&config.store_seeds)?;

        let evaluator =
            Evaluator::new(store.snapshot()).with_resolution(state_resolution(&config.directives));
        let value = evaluator.evaluate_in(&self.expression, &context, self.namespace.as_deref());

        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &value)?;
        writeln!(stdout)?;
        Ok(())
    }
}

fn parse_context(json: Option<&str>) -> Result<Map, CliError> {
    let Some(json) = json else {
        return Ok(Map::new());
    };
    match Value::from_json_str(json)? {
        Value::Map(map) => Ok(map),
        other => Err(CliError::Validation(format!(
            "--context expects a JSON object, got {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_context_default_is_empty() {
        assert!(parse_context(None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_context_object() {
        let context = parse_context(Some(r#"{"isOpen": true}"#)).unwrap();
        assert_eq!(context.get("isOpen"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_parse_context_rejects_non_object() {
        let err = parse_context(Some("[true]")).unwrap_err();
        assert_eq!(err.to_string(), "--context expects a JSON object, got array");
    }

    #[test]
    fn test_parse_context_rejects_invalid_json() {
        assert!(matches!(
            parse_context(Some("{nope")),
            Err(CliError::Json(_))
        ));
    }
}
