use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins over the built-in directives.
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

pub fn init_cli_logger(verbose: bool) {
    let directives = if verbose {
        "selfstate_etl=debug,evidence_classifier=debug,info"
    } else {
        "selfstate_etl=info,evidence_classifier=info"
    };

    tracing_subscriber::registry()
        .with(env_filter(directives))
        .with(fmt::layer().with_target(false).compact())
        .init();
}

/// JSON lines on stderr, for runs whose logs are collected by a cluster scheduler.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter("selfstate_etl=info"))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .json(),
        )
        .init();
}
