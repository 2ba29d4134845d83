//! Command-line client for the Riven settings backend.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use riven_gateway::DEFAULT_BACKEND_URL;
use riven_settings::GroupId;
use riven_telemetry::{
    CommandContext, DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, command_span, init_logging,
};
use tracing::Instrument;
use url::Url;

use crate::client::{AppContext, CliDependencies, CliResult, parse_url};
use crate::commands::applications::{
    handle_applications_add, handle_applications_show, handle_catalog,
};
use crate::commands::settings::{handle_apply, handle_groups, handle_show};

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Parses CLI arguments, executes the requested command, and reports
/// failures on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let context = CommandContext::new(cli.command.label());
    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: option_env!("RIVEN_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err}");
    }

    let span = command_span(&context);
    let result = async {
        let deps = CliDependencies::from_cli(&cli, &context).await?;
        dispatch(cli, &deps).await
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(cli: Cli, deps: &CliDependencies) -> CliResult<()> {
    let ctx = AppContext {
        gateway: deps.gateway.clone(),
        mirror: deps.mirror.clone(),
    };

    match cli.command {
        Command::Groups => handle_groups(cli.output),
        Command::Show(args) => handle_show(&ctx, args.group, cli.output).await,
        Command::Apply(args) => handle_apply(&ctx, args, cli.output).await,
        Command::Applications(applications) => match applications {
            ApplicationsCommand::Show => handle_applications_show(&ctx, cli.output).await,
            ApplicationsCommand::Add(args) => {
                handle_applications_add(&ctx, args, cli.output).await
            }
        },
        Command::Catalog => handle_catalog(&ctx, cli.output).await,
    }
}

#[derive(Parser)]
#[command(name = "riven", about = "Manage Riven backend settings")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "RIVEN_BACKEND_URL",
        value_parser = parse_url,
        default_value = DEFAULT_BACKEND_URL
    )]
    pub(crate) backend_url: Url,
    #[arg(
        long,
        global = true,
        env = "RIVEN_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "RIVEN_HOME",
        help = "Home directory holding the seedbox-compose and projet-riven trees"
    )]
    pub(crate) home: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Serve settings from a local JSON document instead of the backend"
    )]
    pub(crate) offline: Option<PathBuf>,
    #[arg(long, global = true, env = "RIVEN_LOG_FORMAT", value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List settings groups and the backend keys they read.
    Groups,
    /// Load a settings group as a form.
    Show(ShowArgs),
    /// Validate a form document and write it to the backend.
    Apply(ApplyArgs),
    /// Manage hosted applications.
    #[command(subcommand)]
    Applications(ApplicationsCommand),
    /// Regenerate the installable service catalog.
    Catalog,
}

impl Command {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::Show(_) => "show",
            Self::Apply(_) => "apply",
            Self::Applications(ApplicationsCommand::Show) => "applications show",
            Self::Applications(ApplicationsCommand::Add(_)) => "applications add",
            Self::Catalog => "catalog",
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum ApplicationsCommand {
    /// Show the applications form merged with the local mirror.
    Show,
    /// Register an application in the mirror and the backend.
    Add(ApplicationAddArgs),
}

#[derive(Args)]
pub(crate) struct ShowArgs {
    #[arg(value_parser = parse_group)]
    pub(crate) group: GroupId,
}

#[derive(Args)]
pub(crate) struct ApplyArgs {
    #[arg(value_parser = parse_group)]
    pub(crate) group: GroupId,
    #[arg(short = 'f', long = "file", help = "JSON object of form fields")]
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct ApplicationAddArgs {
    #[arg(long, help = "Service label from the catalog")]
    pub(crate) label: String,
    #[arg(long, help = "Catalog id of the service")]
    pub(crate) id: Option<String>,
    #[arg(long = "auth", help = "Authentication method (basique, oauth, authelia, aucune)")]
    pub(crate) auth_method: Option<String>,
    #[arg(
        long = "domain",
        value_parser = parse_domain,
        help = "Domain override as label=domain; a blank domain defaults to the label"
    )]
    pub(crate) domains: Vec<(String, String)>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) fn parse_group(input: &str) -> Result<GroupId, String> {
    input.parse::<GroupId>().map_err(|_| {
        let known: Vec<&str> = GroupId::ALL.iter().map(|id| id.as_str()).collect();
        format!("unknown settings group '{input}' (expected one of {})", known.join(", "))
    })
}

pub(crate) fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input
        .parse::<LogFormat>()
        .map_err(|_| format!("invalid log format '{input}' (expected json or pretty)"))
}

pub(crate) fn parse_domain(input: &str) -> Result<(String, String), String> {
    let (label, domain) = input
        .split_once('=')
        .ok_or_else(|| format!("domain override '{input}' must be label=domain"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err("domain override label cannot be empty".to_string());
    }
    Ok((label.to_string(), domain.trim().to_string()))
}
