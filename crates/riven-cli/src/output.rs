//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use riven_gateway::{ApplicationsForm, LoadedForm, SubmitOutcome};
use riven_settings::{FlatFields, ServiceCatalog, SettingsGroup};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_groups<'a>(
    groups: impl Iterator<Item = &'a dyn SettingsGroup>,
    format: OutputFormat,
) -> CliResult<()> {
    let rows: Vec<(&str, Vec<&str>)> = groups
        .map(|group| (group.id().as_str(), group.fetch_keys().to_vec()))
        .collect();
    match format {
        OutputFormat::Json => {
            let listing: serde_json::Map<String, Value> = rows
                .iter()
                .map(|(id, keys)| ((*id).to_string(), Value::from(keys.clone())))
                .collect();
            print_json(&listing)?;
        }
        OutputFormat::Table => {
            println!("{:<14} KEYS", "GROUP");
            for (id, keys) in &rows {
                println!("{id:<14} {}", keys.join(","));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_form(form: &LoadedForm, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(form)?,
        OutputFormat::Table => {
            println!("group: {}", form.group);
            print_fields(&form.fields);
            if !form.is_valid() {
                println!("errors:");
                for error in &form.errors {
                    println!("  {}: {}", error.field, error.message);
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn render_outcome(outcome: &SubmitOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(outcome)?,
        OutputFormat::Table => {
            let keys: Vec<&str> = outcome.patch.keys().collect();
            println!("{}", outcome.message);
            println!("updated keys: {}", keys.join(", "));
        }
    }
    Ok(())
}

pub(crate) fn render_catalog(catalog: &ServiceCatalog, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(catalog)?,
        OutputFormat::Table => print_catalog(catalog),
    }
    Ok(())
}

pub(crate) fn render_applications(
    applications: &ApplicationsForm,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(applications)?,
        OutputFormat::Table => {
            render_form(&applications.form, format)?;
            println!("available services:");
            print_catalog(&applications.items);
        }
    }
    Ok(())
}

fn print_fields(fields: &FlatFields) {
    for (name, value) in fields.as_map() {
        println!("  {name:<46} {}", format_value(value));
    }
}

fn print_catalog(catalog: &ServiceCatalog) {
    println!("{:>4} LABEL", "ID");
    for item in &catalog.items {
        println!("{:>4} {}", item.id, item.label);
    }
}

/// Strings print bare; everything else prints as compact JSON.
#[must_use]
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_render_compactly() {
        assert_eq!(format_value(&json!("plain")), "plain");
        assert_eq!(format_value(&json!(["movie", "show"])), r#"["movie","show"]"#);
        assert_eq!(format_value(&json!(-1)), "-1");
    }

    #[test]
    fn every_renderer_accepts_both_formats() -> anyhow::Result<()> {
        let catalog = ServiceCatalog::parse("sonarr\nradarr\n");
        for format in [OutputFormat::Table, OutputFormat::Json] {
            render_groups(riven_settings::all_groups(), format)
                .map_err(|err| anyhow!(err.display_message()))?;
            render_catalog(&catalog, format).map_err(|err| anyhow!(err.display_message()))?;
        }
        Ok(())
    }
}
