use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `HOOKPROMPT_LOG` wins over `RUST_LOG`.
pub fn init_tracing(component: &str) {
    let default_filter = format!("info,hookprompt=debug,{component}=debug");

    let filter = std::env::var("HOOKPROMPT_LOG")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .compact()
        .try_init();
}
