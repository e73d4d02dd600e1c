//! Demo host for the application context.
//!
//! Loads a configuration file, builds the logger tree, watches the file for
//! changes and logs a heartbeat until Ctrl-C.
//!
//! ```text
//! app-context --config demo.toml
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_context::error::BoxError;
use app_context::lifecycle::signals::shutdown_on_ctrl_c;
use app_context::lifecycle::startup::{bootstrap, StartupOptions};
use app_context::{fields, Application, Module, Shutdown};

#[derive(Parser)]
#[command(name = "app-context")]
#[command(about = "Run a demo application on the configuration-driven logger tree", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON). Searched for when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application name, used for the config search path and the `app` field
    #[arg(short, long, default_value = "app-context")]
    name: String,

    /// Seconds between heartbeat entries
    #[arg(long, default_value_t = 5)]
    interval: u64,
}

/// Logs its own lifecycle through a dedicated child logger.
struct Greeter;

impl Module for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn init(&self, app: &Application) -> Result<(), BoxError> {
        app.set("greeting", format!("hello from {}", app.info().name));
        Ok(())
    }

    fn start(&self, app: &Application) -> Result<(), BoxError> {
        let greeting: String = app.get("greeting")?;
        app.new_logger("greeter", fields! {}).info(greeting);
        Ok(())
    }

    fn stop(&self, app: &Application) -> Result<(), BoxError> {
        app.new_logger("greeter", fields! {}).info("goodbye");
        Ok(())
    }

    fn reload(&self, app: &Application) -> Result<(), BoxError> {
        let logger = app.new_logger("greeter", fields! {});
        logger.info(format!("now logging at {}", logger.level()));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app_context=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let options = StartupOptions {
        name: cli.name,
        config: cli.config,
    };
    let app = bootstrap(&options, vec![Arc::new(Greeter) as Arc<dyn Module>])?;

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    let watch = match app.config_path() {
        Some(path) => Some(app.watch(path, &shutdown)?),
        None => None,
    };

    let heartbeat = app.new_logger("heartbeat", fields! { "interval_secs" => cli.interval });
    let mut ticker = tokio::time::interval(Duration::from_secs(cli.interval.max(1)));
    let mut stop = shutdown.subscribe();
    let mut beats: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                beats += 1;
                heartbeat.emit(app_context::Level::Info, "heartbeat", fields! { "beat" => beats });
                heartbeat.debug("heartbeat detail");
            }
            _ = stop.recv() => break,
        }
    }

    if let Some(watch) = watch {
        let _ = watch.await;
    }
    app.stop()?;
    app.logger().info("shutdown complete");
    Ok(())
}
