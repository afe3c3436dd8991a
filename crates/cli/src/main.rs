use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use segview_insight::{build_view, Dashboard, DashboardView, RefreshOutcome, Snapshot};
use segview_protocol::{serialize_json, serialize_json_pretty, ErrorEnvelope, InsightMap};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::client::{HttpSource, DEFAULT_EXPORT_FILE};
use crate::config::{ClientConfig, ConfigOverrides};

mod client;
mod config;
mod report;
mod upload;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "segview")]
#[command(about = "Customer segmentation dashboard in the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Segmentation service base URL (overrides SEGVIEW_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides SEGVIEW_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Config file (default: ./segview.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest results from the service and print the dashboard
    Show(ShowArgs),

    /// Render saved /clusters and /insights responses without network access
    Render(RenderArgs),

    /// Upload a customer CSV, then refresh and print the dashboard
    Upload(UploadArgs),

    /// Export the segmented dataset as CSV
    Download(DownloadArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Also write the markdown report to this path
    #[arg(long)]
    out_md: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct RenderArgs {
    /// JSON array of records, as returned by GET /clusters
    #[arg(long)]
    records: PathBuf,

    /// JSON object of insights, as returned by GET /insights
    #[arg(long)]
    insights: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct UploadArgs {
    /// Customer dataset (.csv)
    file: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct DownloadArgs {
    /// Destination file
    #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
    out: PathBuf,
}

#[derive(Serialize)]
struct ErrorOutput {
    status: &'static str,
    error: ErrorEnvelope,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Show(args) => args.output.json,
        Commands::Render(args) => args.output.json,
        Commands::Upload(args) => args.output.json,
        Commands::Download(_) => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let overrides = ConfigOverrides {
        api_url: cli.api_url.clone(),
        timeout_secs: cli.timeout_secs,
        config_path: cli.config.clone(),
    };

    match cli.command {
        Commands::Render(args) => run_render(args)?,
        Commands::Show(args) => run_show(args, config::resolve(&overrides)?).await?,
        Commands::Upload(args) => run_upload(args, config::resolve(&overrides)?).await?,
        Commands::Download(args) => run_download(args, config::resolve(&overrides)?).await?,
    }

    Ok(())
}

fn run_render(args: RenderArgs) -> Result<()> {
    let records = fs::read_to_string(&args.records)
        .with_context(|| format!("Failed to read {}", args.records.display()))?;
    let insights = fs::read_to_string(&args.insights)
        .with_context(|| format!("Failed to read {}", args.insights.display()))?;
    let snapshot = Snapshot::from_json(&records, &insights).with_context(|| {
        format!(
            "Invalid payload in {} / {}",
            args.records.display(),
            args.insights.display()
        )
    })?;

    let source = args.records.display().to_string();
    let view = snapshot.view();
    emit(
        &view,
        &report::render_dashboard_report(&source, &view),
        &args.output,
    )
}

async fn run_show(args: ShowArgs, cfg: ClientConfig) -> Result<()> {
    let dashboard = Dashboard::new(HttpSource::new(&cfg)?);
    refresh_and_emit(&dashboard, &args.output).await
}

async fn run_upload(args: UploadArgs, cfg: ClientConfig) -> Result<()> {
    if let Err(err) = upload::validate_csv(&args.file) {
        return fail(&args.output, "invalid_upload", err, None);
    }

    let dashboard = Dashboard::new(HttpSource::new(&cfg)?);
    match dashboard.source().upload(&args.file).await {
        Ok(reply) => log::debug!("Upload reply: {reply}"),
        Err(err) => {
            log::error!("{err:#}");
            return fail(
                &args.output,
                "upload_failed",
                anyhow::anyhow!(upload::UPLOAD_FAILED),
                Some(format!("Is the segmentation service reachable at {}?", cfg.api_url)),
            );
        }
    }

    refresh_and_emit(&dashboard, &args.output).await
}

async fn run_download(args: DownloadArgs, cfg: ClientConfig) -> Result<()> {
    let source = HttpSource::new(&cfg)?;
    let bytes = source
        .download()
        .await
        .context("Failed to download results.")?;
    write_file(&args.out, &bytes)?;
    log::info!("Wrote {} bytes to {}", bytes.len(), args.out.display());
    Ok(())
}

async fn refresh_and_emit(dashboard: &Dashboard<HttpSource>, output: &OutputArgs) -> Result<()> {
    let base_url = dashboard.source().base_url().to_string();
    match dashboard.refresh().await {
        Ok(RefreshOutcome::Updated { records, segments }) => {
            log::info!("Loaded {records} customers in {segments} segments");
        }
        Ok(RefreshOutcome::NoData) => {
            log::info!("The service has no segmented customers yet");
            let view = build_view(&[], &InsightMap::new());
            return emit(&view, &report::render_empty_state(&base_url), output);
        }
        Err(err) => {
            return fail(
                output,
                "fetch_failed",
                err.into(),
                Some(format!("Check that the service is running at {base_url}")),
            );
        }
    }

    let Some(view) = dashboard.view() else {
        anyhow::bail!("No snapshot committed after refresh");
    };
    emit(
        &view,
        &report::render_dashboard_report(&base_url, &view),
        output,
    )
}

fn emit(view: &DashboardView, markdown: &str, output: &OutputArgs) -> Result<()> {
    if let Some(path) = &output.out_md {
        write_file(path, markdown.as_bytes())?;
    }
    let text = if output.json {
        if output.pretty {
            serialize_json_pretty(view)?
        } else {
            serialize_json(view)?
        }
    } else {
        markdown.to_string()
    };
    print_stdout(&text)
}

/// Reports a failure: as a JSON envelope on stdout in `--json` mode, otherwise
/// as the returned error.
fn fail(output: &OutputArgs, code: &str, err: anyhow::Error, hint: Option<String>) -> Result<()> {
    if output.json {
        let mut envelope = ErrorEnvelope::new(code, format!("{err:#}"));
        if let Some(hint) = hint {
            envelope = envelope.with_hint(hint);
        }
        print_stdout(&serialize_json(&ErrorOutput {
            status: "error",
            error: envelope,
        })?)?;
        std::process::exit(1);
    }
    if let Some(hint) = hint {
        log::warn!("{hint}");
    }
    Err(err)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
