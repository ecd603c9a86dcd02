use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pollution_source::config::Settings;
use pollution_source::spatial::{GeodataSource, OverpassClient, StaticGeodata};
use pollution_source::{GeodataPolicy, Pipeline, SourceClassifier};

/// Classify one pollution reading read as JSON from stdin; the result
/// `{"source": ...}` is written to stdout.
#[derive(Parser, Debug)]
#[command(name = "pollution-source", version, about)]
struct Cli {
    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trained model file
    #[arg(short, long, env = "POLLUTION_MODEL_PATH")]
    model: Option<PathBuf>,

    /// Overpass interpreter endpoint
    #[arg(long, env = "OVERPASS_URL")]
    overpass_url: Option<String>,

    /// Search radius around the point, meters
    #[arg(long)]
    radius: Option<f64>,

    /// Use a saved Overpass response instead of querying the service
    #[arg(long)]
    elements: Option<PathBuf>,

    /// Continue with sentinel distances if the geodata fetch fails
    #[arg(long)]
    degraded_geodata: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(model) = &self.model {
            settings.model_path = model.clone();
        }
        if let Some(url) = &self.overpass_url {
            settings.overpass_url = url.clone();
        }
        if let Some(radius) = self.radius {
            settings.search_radius_m = radius;
        }
        settings.geodata_fallback |= self.degraded_geodata;
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    log::debug!("settings: {settings:?}");

    let model = SourceClassifier::load(&settings.model_path).context("loading classifier")?;

    let geodata: Box<dyn GeodataSource> = match &cli.elements {
        Some(path) => Box::new(StaticGeodata::from_file(path)?),
        None => Box::new(OverpassClient::new(
            settings.overpass_url.clone(),
            settings.http_timeout(),
        )?),
    };

    let policy = if settings.geodata_fallback {
        GeodataPolicy::Degrade
    } else {
        GeodataPolicy::Propagate
    };

    Pipeline::new(geodata.as_ref(), &model, settings.search_radius_m)
        .with_policy(policy)
        .run(std::io::stdin().lock(), std::io::stdout().lock())
        .context("classifying request")?;
    Ok(())
}
