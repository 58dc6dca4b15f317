//! Mouse Idler - keeps the session awake while nobody is at the desk.
//!
//! Shows a control prompt; while it is open the cursor drifts along short
//! random rays, pausing whenever real mouse or keyboard input is seen.

use mouse_idler::config::IdlerConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = IdlerConfig::load_or_default(None)?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_thread_ids(true)
        .init();

    run_application(&config)
}

#[cfg(windows)]
fn run_application(config: &IdlerConfig) -> Result<(), Box<dyn std::error::Error>> {
    use mouse_idler::idler::Orchestrator;
    use mouse_idler::winapi_utils::WIN32_INPUT;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    let orchestrator = Orchestrator::new(Arc::clone(&WIN32_INPUT), config)?;

    // Handle Ctrl+C: stop moving and unhook before exiting
    let shutdown = orchestrator.shutdown_flag();
    ctrlc::set_handler(move || {
        tracing::info!("Shutdown signal received");
        shutdown.store(true, Ordering::SeqCst);
    })?;

    tracing::info!(
        cooldown_secs = config.cooldown_secs,
        min_radius = config.min_radius,
        max_radius = config.max_radius,
        "Mouse idler starting"
    );
    let choice = orchestrator.run()?;
    tracing::info!(?choice, "Mouse idler exited");
    Ok(())
}

#[cfg(not(windows))]
fn run_application(_config: &IdlerConfig) -> Result<(), Box<dyn std::error::Error>> {
    Err("mouse-idler needs the Windows input subsystem".into())
}
