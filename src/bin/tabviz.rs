use clap::{Parser, ValueEnum};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tabviz::chart::DeriveOptions;
use tabviz::config::Config;
use tabviz::core::types::Scenario;
use tabviz::core::MultiSheetResponse;
use tabviz::paginate::PaginationWindow;
use tabviz::providers::ExtractionClient;
use tabviz::services::{export_json, DeriveService};
use tabviz::session::Session;
use tracing::error;

/// Derive chart data, projections and table windows from an extraction result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Read the extraction result from a JSON file
    #[arg(long = "input", value_name = "PATH")]
    input: Option<PathBuf>,
    /// Fetch the extraction result for this document reference instead of
    /// reading a file. Requires --url/--token or TABVIZ_API_URL/_TOKEN.
    #[arg(long = "document", value_name = "REF")]
    document: Option<String>,
    /// Extraction service base URL
    #[arg(long = "url", value_name = "URL")]
    url: Option<String>,
    /// Bearer token for the extraction service
    #[arg(long = "token", value_name = "TOKEN")]
    token: Option<String>,
    /// Select a sheet by name (defaults to the first sheet)
    #[arg(long = "sheet", value_name = "NAME")]
    sheet: Option<String>,
    /// Select a table within the sheet (defaults to 0)
    #[arg(long = "table", value_name = "INDEX")]
    table: Option<usize>,
    /// Add a projection. Repeat per projection. Syntax: name:column;key=value;...
    /// Examples: --project 'Upside:2023;percent=15'
    ///           --project 'Stress:Revenue;scenario=lower'
    #[arg(long = "project", value_name = "SPEC")]
    project: Vec<String>,
    /// Write the derived bundle as JSON to this path
    #[arg(long = "export", value_name = "PATH")]
    export: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn) => Some(tracing::Level::WARN),
        Some(LogLevel::Info) => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => Some(tracing::Level::WARN),
    };
    tabviz::logging::init_with(None, level)?;

    let config = Config::from_path(args.config.as_ref())
        .map_err(|e| eyre!("failed to load config: {e}"))?;

    let mut session = Session::new();
    load_response(&args, &mut session)?;

    if let Some(response) = session.response() {
        let response = response.clone();
        if let Some(name) = &args.sheet {
            if !session.selection.select_sheet(&response, name) {
                error!("unknown sheet '{name}', keeping default selection");
                eprintln!("Unknown sheet '{name}'; available: {}", response.sheet_order.join(", "));
            }
        }
        if let Some(index) = args.table {
            session.selection.select_table(&response, index);
        }
    }
    for spec in &args.project {
        apply_project_spec(spec, &mut session)?;
    }

    let mut service = DeriveService::new(config.derive.clone());
    let bundle = service.bundle(&session, &DeriveOptions::default());

    print_summary(&session, &bundle, &config);

    if let Some(path) = &args.export {
        fs::write(path, export_json(&bundle)?)?;
        println!("Exported bundle to {}", path.display());
    }
    Ok(())
}

fn load_response(args: &Args, session: &mut Session) -> Result<()> {
    if let Some(path) = &args.input {
        let raw = fs::read_to_string(path)?;
        let response = MultiSheetResponse::from_json(&raw)?;
        session.install_response(1, response);
        return Ok(());
    }
    if let Some(document) = &args.document {
        let client = match (&args.url, &args.token) {
            (Some(url), Some(token)) => ExtractionClient::new(url.clone(), token.clone()),
            _ => ExtractionClient::from_env().ok_or_else(|| {
                eyre!("--document needs --url and --token, or TABVIZ_API_URL and TABVIZ_API_TOKEN")
            })?,
        };
        let (generation, response) = client
            .fetch_results(document)
            .map_err(|e| eyre!("fetch failed: {e}"))?;
        session.install_response(generation, response);
        return Ok(());
    }
    Err(eyre!("provide --input PATH or --document REF"))
}

/// Parse and apply one `name:column;key=value;...` projection spec.
fn apply_project_spec(spec: &str, session: &mut Session) -> Result<()> {
    let mut parts = spec.split(';');
    let head = parts.next().unwrap_or_default();
    let (name, column) = head
        .split_once(':')
        .ok_or_else(|| eyre!("bad --project spec '{spec}': expected name:column"))?;
    if name.trim().is_empty() || column.trim().is_empty() {
        return Err(eyre!("bad --project spec '{spec}': empty name or column"));
    }

    let id = session.projections.add(name.trim(), column.trim());
    for kv in parts {
        let Some((key, value)) = kv.split_once('=') else {
            return Err(eyre!("bad --project option '{kv}': expected key=value"));
        };
        match key.trim() {
            "percent" => {
                let percent: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| eyre!("bad percent '{value}' in --project spec"))?;
                session.projections.set_percent(id, percent);
            }
            "scenario" => {
                let scenario = Scenario::from_str(value.trim()).map_err(|e| eyre!(e))?;
                session.projections.set_scenario(id, scenario);
            }
            other => return Err(eyre!("unknown --project option '{other}'")),
        }
    }
    Ok(())
}

fn print_summary(session: &Session, bundle: &tabviz::services::DerivedBundle, config: &Config) {
    if let Some(response) = session.response() {
        println!("Sheets: {}", response.sheet_order.join(", "));
    }
    if let Some(message) = &bundle.message {
        println!("{message}");
        return;
    }
    println!(
        "Selected: sheet '{}', table {} ({} columns x {} rows)",
        bundle.sheet,
        bundle.table_index,
        bundle.headers.len(),
        bundle.rows.len()
    );
    let a = &bundle.chart.availability;
    println!(
        "Charts: bar={} line={} area={} donut={} scatter={}",
        a.bar, a.line, a.area, a.donut, a.scatter
    );
    for series in &bundle.chart.series {
        println!("  series '{}': {}", series.name, series.status);
    }
    for projection in &bundle.projections {
        println!(
            "  projection '{}' on '{}' ({}%, {}): {} point(s)",
            projection.name,
            projection.column,
            projection.percent,
            projection.scenario,
            projection.points.len()
        );
    }
    let window = PaginationWindow::from_config(&config.derive);
    println!(
        "Table pages: {} column page(s), {} row page(s)",
        window.total_column_pages(bundle.headers.len()),
        window.total_row_pages(bundle.rows.len())
    );
}
