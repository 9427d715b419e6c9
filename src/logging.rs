use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Events go to stderr so generated output on
/// stdout stays clean.
///
/// `RUST_LOG` is honoured; on top of it `hierfig=info` is applied, or
/// `hierfig=error` when `quiet` is set.
pub fn init_logging(quiet: bool) {
    let directive = if quiet { "hierfig=error" } else { "hierfig=info" };
    let filter = EnvFilter::builder().parse_lossy(filter_directives(
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        directive,
    ));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}

/// `RUST_LOG` followed by `directive`; for the same target the later one wins.
fn filter_directives(from_env: Option<&str>, directive: &str) -> String {
    match from_env.map(str::trim) {
        Some(env) if !env.is_empty() => format!("{env},{directive}"),
        _ => directive.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_appended_to_env() {
        assert_eq!(filter_directives(None, "hierfig=info"), "hierfig=info");
        assert_eq!(filter_directives(Some("  "), "hierfig=error"), "hierfig=error");
        assert_eq!(
            filter_directives(Some("warn"), "hierfig=info"),
            "warn,hierfig=info"
        );
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(true);
        init_logging(false);
    }
}
