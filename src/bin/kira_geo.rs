use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_geo_matrix::app::{App, FetchOptions, FetchResult, LogProgress, ProgressSink, convert};
use kira_geo_matrix::config::ConfigLoader;
use kira_geo_matrix::domain::{GeoSeriesAccession, OutputFormat};
use kira_geo_matrix::error::KiraError;
use kira_geo_matrix::geo::{GeoHttpClient, series_matrix_url};
use kira_geo_matrix::output::{JsonOutput, OutputMode, TextOutput};
use kira_geo_matrix::store::Store;

#[derive(Parser)]
#[command(name = "kira-geo")]
#[command(about = "Download a GEO series matrix and extract its expression and sample metadata tables")]
#[command(version, author)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch a series (or every series in kira-geo.json) and write its tables")]
    Fetch(FetchArgs),
    #[command(about = "Extract tables from a local series matrix file")]
    Convert(ConvertArgs),
    #[command(about = "Print the series matrix URL for an accession")]
    Url(UrlArgs),
}

#[derive(Args)]
struct FetchArgs {
    accession: Option<String>,

    /// Output directory (default: ./<accession>)
    #[arg(long)]
    out: Option<String>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    format: Option<OutputFormat>,

    /// Download again even if the matrix file is already present
    #[arg(long)]
    force: bool,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ConvertArgs {
    file: String,

    #[arg(long)]
    out: String,

    #[arg(long, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(Args)]
struct UrlArgs {
    accession: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::MissingConfig => 2,
        KiraError::GeoHttp(_) | KiraError::GeoStatus { .. } => 3,
        KiraError::Decompression(_) | KiraError::MalformedDirective { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, output_mode),
        Commands::Convert(args) => run_convert(args, output_mode),
        Commands::Url(args) => {
            let accession: GeoSeriesAccession = args.accession.parse()?;
            println!("{}", series_matrix_url(&accession));
            Ok(())
        }
    }
}

fn run_fetch(args: FetchArgs, output_mode: OutputMode) -> miette::Result<()> {
    let geo = GeoHttpClient::new()?;
    let app = App::new(geo);
    let sink = progress_sink(output_mode);

    let result = match args.accession {
        Some(value) => {
            let accession: GeoSeriesAccession = value.parse()?;
            let out = args
                .out
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8PathBuf::from(accession.as_str()));
            let options = FetchOptions {
                format: args.format.unwrap_or_default(),
                force: args.force,
                dry_run: args.dry_run,
            };
            app.fetch(&accession, &Store::new(out), options, sink.as_ref())?
        }
        None => {
            let resolved = ConfigLoader::resolve(args.config.as_deref())?;
            let options = FetchOptions {
                format: args.format.unwrap_or(resolved.format),
                force: args.force,
                dry_run: args.dry_run,
            };
            app.fetch_all(&resolved, options, sink.as_ref())?
        }
    };

    print_result(&result, output_mode)
}

fn run_convert(args: ConvertArgs, output_mode: OutputMode) -> miette::Result<()> {
    let sink = progress_sink(output_mode);
    let matrix = Utf8PathBuf::from(args.file);
    let store = Store::new(Utf8PathBuf::from(args.out));
    let item = convert(&matrix, &store, args.format, None, sink.as_ref())?;
    print_result(&FetchResult { items: vec![item] }, output_mode)
}

fn progress_sink(output_mode: OutputMode) -> Box<dyn ProgressSink> {
    match output_mode {
        OutputMode::Text => Box::new(LogProgress),
        OutputMode::Json => Box::new(JsonOutput),
    }
}

fn print_result(result: &FetchResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Text => TextOutput::print_fetch(result).into_diagnostic(),
        OutputMode::Json => JsonOutput::print_fetch(result).into_diagnostic(),
    }
}
