use anyhow::Context;
use clap::Parser;
use selfstate_etl::classify::ClassifierSettings;
use selfstate_etl::utils::{logger, validation::Validate};
use selfstate_etl::{EtlEngine, EvidencePipeline, LocalStorage, RunConfig, TimelineReader};
use std::path::Path;

#[derive(Parser)]
#[command(name = "evidence-classifier")]
#[command(about = "Tag adaptive and maladaptive evidence sentences with classical classifiers")]
struct Args {
    /// TOML configuration file with a [classifier] section
    #[arg(short, long)]
    config: Option<String>,

    /// Labeled corpus with adaptive-state, maladaptive-state and neither-state lists
    #[arg(long)]
    training_path: Option<String>,

    /// Timeline JSON file (or directory) to classify
    #[arg(long)]
    input_path: Option<String>,

    #[arg(long)]
    output_path: Option<String>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    monitor: bool,
}

fn split_path(path: &str) -> (String, String) {
    let p = Path::new(path);
    let dir = p
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(|d| d.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    let name = p
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, name)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("🚀 Starting evidence classifier");

    let (mut settings, monitor_from_config) = match &args.config {
        Some(path) => {
            let config = RunConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            (config.classifier_settings(), config.monitoring_enabled())
        }
        None => (ClassifierSettings::default(), false),
    };

    if let Some(path) = args.training_path {
        settings.training_path = path;
    }
    if let Some(path) = args.input_path {
        settings.input_path = path;
    }
    if let Some(path) = args.output_path {
        settings.output_path = path;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    settings
        .validate()
        .context("invalid classifier configuration")?;

    let (corpus_dir, corpus_file) = split_path(&settings.training_path);
    let reader = TimelineReader::for_path(&settings.input_path);
    let output = LocalStorage::new(settings.output_path.clone());
    let pipeline = EvidencePipeline::new(
        LocalStorage::new(corpus_dir),
        &corpus_file,
        reader,
        output,
        settings,
    );

    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor || monitor_from_config);
    let output_path = engine
        .run()
        .await
        .context("evidence classification failed")?;

    println!("✅ Submission written to: {}", output_path);
    Ok(())
}
