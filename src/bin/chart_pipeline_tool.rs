use insurance_charts::charts::{ChartKind, PipelineContext};
use insurance_charts::config::PipelineConfig;
use insurance_charts::data::FsFetcher;
use insurance_charts::render::{NullRenderer, Renderer};
use insurance_charts::session::ChartSession;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "usage: chart_pipeline_tool <grouped-bar|grouped-bar-population|scatterplot|rate-comparison|factors|choropleth|trend> --data-root <dir> [--state <name>] [--config <json>] [--output <path>]";

#[derive(Debug)]
struct CliArgs {
    chart: ChartKind,
    data_root: PathBuf,
    state: Option<String>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let _ = insurance_charts::telemetry::init_default_tracing();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("failed to read config `{}`: {e}", path.display()))?;
            PipelineConfig::from_json_str(&raw).map_err(|e| e.to_string())?
        }
        None => PipelineConfig::default(),
    };
    let ctx = PipelineContext::new(Arc::new(FsFetcher::new(&args.data_root)), config)
        .map_err(|e| e.to_string())?;

    let mut session = ChartSession::new(args.chart);
    session
        .run(&ctx, args.state.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    let outcome = session
        .current()
        .ok_or_else(|| format!("no result committed for `{}`", args.chart))?;

    let mut renderer = NullRenderer::default();
    renderer
        .render(&outcome.state)
        .map_err(|e| format!("chart `{}` produced an invalid view: {e}", args.chart))?;
    for advisory in &outcome.diagnostics.advisories {
        eprintln!("advisory: {}: {}", advisory.resource, advisory.message);
    }

    let json = outcome.to_json_pretty().map_err(|e| e.to_string())?;
    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .map_err(|e| format!("failed to create `{}`: {e}", parent.display()))?;
                }
            }
            fs::write(path, json)
                .map_err(|e| format!("failed to write `{}`: {e}", path.display()))?;
            println!(
                "{} -> {} ({} marks)",
                args.chart,
                path.display(),
                renderer.last_mark_count
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let chart = match args.next() {
        Some(value) if value != "--help" && value != "-h" => value
            .parse::<ChartKind>()
            .map_err(|e| format!("{e}\n{USAGE}"))?,
        _ => return Err(USAGE.to_owned()),
    };

    let mut data_root = None::<PathBuf>;
    let mut state = None::<String>;
    let mut config = None::<PathBuf>;
    let mut output = None::<PathBuf>;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--data-root" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --data-root".to_owned())?;
                data_root = Some(PathBuf::from(value));
            }
            "--state" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --state".to_owned())?;
                state = Some(value);
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_owned())?;
                config = Some(PathBuf::from(value));
            }
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --output".to_owned())?;
                output = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Err(USAGE.to_owned()),
            other => return Err(format!("unknown argument: {other}\n{USAGE}")),
        }
    }

    Ok(CliArgs {
        chart,
        data_root: data_root.ok_or_else(|| format!("missing --data-root\n{USAGE}"))?,
        state,
        config,
        output,
    })
}
