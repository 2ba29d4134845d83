use riven_gateway::SettingsPage;
use riven_settings::GroupId;
use tracing::info;

use crate::cli::{ApplyArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, read_json};
use crate::output::{render_form, render_groups, render_outcome};

pub(crate) fn handle_groups(format: OutputFormat) -> CliResult<()> {
    render_groups(riven_settings::all_groups(), format)
}

pub(crate) async fn handle_show(
    ctx: &AppContext,
    group: GroupId,
    format: OutputFormat,
) -> CliResult<()> {
    let form = SettingsPage::new(group, ctx.gateway.clone()).load().await?;
    render_form(&form, format)
}

pub(crate) async fn handle_apply(
    ctx: &AppContext,
    args: ApplyArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let input = read_json(&args.file).await?;
    if !input.is_object() {
        return Err(CliError::validation(format!(
            "{} must contain a JSON object of form fields",
            args.file.display()
        )));
    }
    let outcome = SettingsPage::new(args.group, ctx.gateway.clone())
        .submit(&input)
        .await?;
    info!(group = %args.group, "settings applied");
    render_outcome(&outcome, format)
}
