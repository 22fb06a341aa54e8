use clap::Parser;
use selfstate_etl::core::prompt_pipeline::submission_file_name;
use selfstate_etl::core::ConfigProvider;
use selfstate_etl::utils::error::EtlError;
use selfstate_etl::utils::{logger, validation::Validate};
use selfstate_etl::{run_models, CliConfig, RunConfig, TimelineReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => match RunConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => RunConfig::from(&cli),
    };

    if cli.json_logs || config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting selfstate-etl");
    if cli.verbose {
        tracing::debug!("Run config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be sent");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let report = run_models(&config, monitor_enabled).await;
    for (model, output_path) in &report.written {
        println!("✅ [{}] {}", model, output_path);
    }
    for (model, severity) in &report.failed {
        eprintln!("❌ [{}] failed ({:?}), see the log for details", model, severity);
    }

    let exit_code = report.exit_code();
    if exit_code > 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

fn display_config_summary(config: &RunConfig) {
    println!("📋 Configuration Summary:");
    println!("  Server: {}", config.endpoint());
    println!("  Models: {}", config.models().join(", "));
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Prompt style: {:?}", config.prompt_style());
    println!("  Response parsing: {:?}", config.parse_mode());
    let policy = config.retry_policy();
    println!(
        "  Retries: {} attempts, {:?} apart",
        policy.max_attempts, policy.delay
    );
    println!();
}

async fn perform_dry_run(config: &RunConfig) -> Result<(), EtlError> {
    println!("🔍 Dry Run Analysis:");

    let batch = TimelineReader::for_path(config.input_path())
        .read_all()
        .await?;
    let posts: usize = batch.timelines.iter().map(|t| t.posts.len()).sum();
    println!(
        "  Timelines: {} ({} posts, {} unreadable files)",
        batch.timelines.len(),
        posts,
        batch.skipped_files
    );
    println!(
        "  Queries per model: {}",
        posts * 3 + batch.timelines.len()
    );

    println!();
    println!("💾 Planned outputs:");
    for model in config.models() {
        println!(
            "  {} -> {}",
            model,
            std::path::Path::new(config.output_path())
                .join(submission_file_name(model, config.file_suffix()))
                .display()
        );
    }

    Ok(())
}
