use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum, ValueHint};
use geoassist::{GeoAssist, GeoAssistConfig, Layer, SessionContext, bounds_of, logging};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::info;

/// Run map actions against local datasets and print the resulting layers
#[derive(Parser, Debug)]
#[command(name = "geoassist", version, about)]
struct Cli {
    /// JSON file holding one action object or an array of actions
    #[arg(value_hint = ValueHint::FilePath)]
    actions: PathBuf,

    /// Configuration file (TOML); defaults to ./geoassist.toml when present
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// First forecast day of the session (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    reference_date: Option<NaiveDate>,

    /// Output shape
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Layers)]
    format: OutputFormat,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum OutputFormat {
    /// Layers with style and metadata
    Layers,
    /// One GeoJSON FeatureCollection per layer
    Geojson,
}

fn render(layers: &[Layer], format: OutputFormat) -> Result<Value> {
    let rendered = match format {
        OutputFormat::Layers => serde_json::to_value(layers)?,
        OutputFormat::Geojson => Value::Array(layers.iter().map(Layer::to_geojson).collect()),
    };
    let bounds = bounds_of(layers).map(|rect| {
        json!([[rect.min().y, rect.min().x], [rect.max().y, rect.max().x]])
    });
    Ok(json!({"layers": rendered, "bounds": bounds}))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GeoAssistConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging)?;

    let text = tokio::fs::read_to_string(&cli.actions)
        .await
        .with_context(|| format!("Failed to read {}", cli.actions.display()))?;
    let parsed: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", cli.actions.display()))?;
    let raw_actions = match parsed {
        Value::Array(actions) => actions,
        single => vec![single],
    };

    let session = cli
        .reference_date
        .map_or_else(SessionContext::today, SessionContext::new);
    let pipeline = GeoAssist::from_config(&config).await?;
    info!(
        "Processing {} actions from {} (reference date {})",
        raw_actions.len(),
        cli.actions.display(),
        session.reference_date
    );

    let mut outputs = Vec::with_capacity(raw_actions.len());
    for outcome in pipeline.process_actions(&raw_actions, &session).await {
        outputs.push(match outcome {
            Ok(layers) => render(&layers, cli.format)?,
            Err(err) => json!({"error": err.user_message(), "layers": []}),
        });
    }
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}
