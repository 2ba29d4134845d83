use riven_gateway::{ApplicationSubmission, ApplicationsPage};

use crate::cli::{ApplicationAddArgs, OutputFormat};
use crate::client::{AppContext, CliResult};
use crate::output::{render_applications, render_catalog, render_outcome};

fn page(ctx: &AppContext) -> CliResult<ApplicationsPage> {
    Ok(ApplicationsPage::new(ctx.gateway.clone(), ctx.mirror()?.clone()))
}

pub(crate) async fn handle_applications_show(
    ctx: &AppContext,
    format: OutputFormat,
) -> CliResult<()> {
    let applications = page(ctx)?.load().await?;
    render_applications(&applications, format)
}

pub(crate) async fn handle_applications_add(
    ctx: &AppContext,
    args: ApplicationAddArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let submission = ApplicationSubmission {
        id: args.id,
        label: args.label,
        auth_method: args.auth_method,
        domains: args.domains.into_iter().collect(),
    };
    let outcome = page(ctx)?.submit(&submission).await?;
    render_outcome(&outcome, format)
}

pub(crate) async fn handle_catalog(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let catalog = ctx.mirror()?.generate_catalog().await;
    render_catalog(&catalog, format)
}
