//! Command line front end: list fields, inspect a SWORD shapefile, and
//! download Hydrocron time series for the reaches matching a filter.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use swordxplorer::{
    bundle_parts, AppState, DateWindow, FetchConfig, Presentation, ProcessRequest, SwordError,
    SwordXplorer, ThrottleDelay, UploadedFile, DEFAULT_FIELDS, HYDROCRON_TIMESERIES_URL,
    VALID_FIELDS,
};

#[derive(Parser, Debug)]
#[command(name = "swordxplorer")]
#[command(about = "Filter SWORD reaches and download their SWOT Hydrocron time series")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every field Hydrocron can return
    Fields,
    /// List the attribute columns of a SWORD shapefile
    Columns(ShapefileArgs),
    /// List the distinct values of one column
    Values {
        #[command(flatten)]
        shapefile: ShapefileArgs,
        #[arg(long)]
        column: String,
    },
    /// Download the time series of every reach where COLUMN equals VALUE
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
struct ShapefileArgs {
    /// Shapefile parts (.shp, .dbf, .shx, ...) or a directory holding them
    #[arg(long = "shapefile", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    #[command(flatten)]
    shapefile: ShapefileArgs,

    /// Attribute column to filter reaches on, e.g. river_name
    #[arg(long)]
    column: String,

    /// Value the column must equal
    #[arg(long)]
    value: String,

    /// First day of the time window (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the time window (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Comma separated Hydrocron fields
    #[arg(long, value_delimiter = ',', conflicts_with = "all_fields")]
    fields: Vec<String>,

    /// Request every known field
    #[arg(long)]
    all_fields: bool,

    /// Seconds to wait after each reach, between 0.1 and 2.0
    #[arg(long, default_value = "0.5")]
    delay: f64,

    /// Directory the swot_<value>_output folder is created in
    #[arg(long, env = "SWORDXPLORER_OUTPUT", default_value = ".")]
    output_root: PathBuf,

    /// Hydrocron timeseries endpoint
    #[arg(long, env = "HYDROCRON_URL", default_value = HYDROCRON_TIMESERIES_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG overrides the default level.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), SwordError> {
    match command {
        Command::Fields => {
            for field in VALID_FIELDS {
                let marker = if DEFAULT_FIELDS.contains(field) {
                    " (default)"
                } else {
                    ""
                };
                println!("{}{}", field, marker);
            }
            Ok(())
        }
        Command::Columns(shapefile) => {
            let explorer = SwordXplorer::new()?;
            let state = load_state(&explorer, &shapefile).await?;
            for column in explorer.columns(&state)? {
                println!("{}", column);
            }
            Ok(())
        }
        Command::Values { shapefile, column } => {
            let explorer = SwordXplorer::new()?;
            let state = load_state(&explorer, &shapefile).await?;
            for value in explorer.filter_values(&state, &column)? {
                println!("{}", value);
            }
            Ok(())
        }
        Command::Fetch(args) => fetch(args).await,
    }
}

async fn fetch(args: FetchArgs) -> Result<(), SwordError> {
    let config = FetchConfig::builder()
        .base_url(args.base_url)
        .output_root(args.output_root)
        .build();
    let explorer = SwordXplorer::with_config(config)?;
    let mut state = load_state(&explorer, &args.shapefile).await?;

    if args.all_fields {
        state.select_all_fields();
    } else if !args.fields.is_empty() {
        state.select_fields(&args.fields)?;
    }

    let default_window = DateWindow::default();
    let window = DateWindow::new(
        args.start.unwrap_or(default_window.start),
        args.end.unwrap_or(default_window.end),
    );
    let request = ProcessRequest::builder()
        .column(args.column)
        .value(args.value)
        .window(window)
        .delay(ThrottleDelay::from_secs(args.delay)?)
        .build();
    println!(
        "Fetching {} fields for reaches where {} = '{}', {} to {}, waiting {} between reaches",
        state.selected_fields().len(),
        request.column,
        request.value,
        window.start,
        window.end,
        request.delay
    );

    let report = explorer
        .process(&state, &request, |progress| {
            println!(
                "[{}/{}] reach {}: {}",
                progress.position, progress.total, progress.reach_id, progress.outcome
            );
        })
        .await?;

    println!(
        "Processed {} reaches with {} errors",
        report.summary.successes(),
        report.summary.errors()
    );
    let not_found: Vec<&str> = report.summary.not_found().collect();
    if !not_found.is_empty() {
        println!(
            "{} reaches rejected by Hydrocron, see {}",
            not_found.len(),
            report.output_dir.join("logger.txt").display()
        );
    }

    match &report.presentation {
        Presentation::Combined(combined) => {
            println!("{}", combined.frame.head(Some(10)));
            println!("Combined {} rows into {}", combined.rows(), combined.path.display());
        }
        Presentation::NoData => println!("No data retrieved."),
    }
    println!("Output folder: {}", report.output_dir.display());
    Ok(())
}

async fn load_state(
    explorer: &SwordXplorer,
    shapefile: &ShapefileArgs,
) -> Result<AppState, SwordError> {
    let files = read_inputs(&shapefile.inputs).await?;
    let mut state = AppState::new();
    explorer.load_upload(&mut state, &files).await?;
    Ok(state)
}

async fn read_inputs(inputs: &[PathBuf]) -> Result<Vec<UploadedFile>, SwordError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let parts = bundle_parts(input)
                .await
                .map_err(|e| SwordError::ReadInput(input.clone(), e))?;
            for path in parts {
                files.push(read_upload(&path).await?);
            }
        } else {
            files.push(read_upload(input).await?);
        }
    }
    Ok(files)
}

async fn read_upload(path: &Path) -> Result<UploadedFile, SwordError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SwordError::ReadInput(path.to_path_buf(), e))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile::new(name, bytes))
}
