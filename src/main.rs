//! Process entrypoint: loads configuration, installs the tracing
//! subscriber, spawns the planner actor, and runs until shutdown.
//! Grounded on the teacher's `main.rs` startup-banner/tracing-init/
//! ctrl_c-shutdown shape, with `clap` genuinely wired (the teacher
//! declares it as a dependency but never calls it).

use aero_planner::config::Config;
use aero_planner::planner::PlannerActor;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "planner-node", version, about = "Reactive jerk-limited motion planner")]
struct Args {
    /// Path to the planner's TOML configuration file.
    #[arg(default_value = "planner.toml")]
    config: String,

    /// Override the tracing subscriber's level filter.
    #[arg(long)]
    log_level: Option<String>,

    /// Force-enable the debug auxiliary publication channel.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    let filter = args
        .log_level
        .clone()
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    tracing::info!("starting planner-node {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %args.config, "loading configuration");

    let mut config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to load config from '{}': {}", args.config, e);
            return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync>);
        }
    };
    if args.debug {
        config.planner.debug = true;
    }

    tracing::info!(
        max_speed = config.planner.max_speed,
        accel = config.planner.accel,
        jerk = config.planner.jerk,
        goal = ?(config.planner.goal_x, config.planner.goal_y, config.planner.goal_z),
        "kinematic bounds"
    );

    let actor = PlannerActor::new(config);
    let handles = actor.spawn();

    tracing::info!("planner running, press Ctrl+C to shut down");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    let _ = handles.shutdown_tx.send(());

    Ok(())
}
