use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kiosk::{KioskConfig, KioskOrchestrator};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kiosk", version)]
#[command(about = "Local control service for a kiosk camera and locker relay")]
#[command(long_about = "Serves the kiosk UI, takes stills through rpicam-still or \
libcamera-still on request and drives the locker relay over GPIO. Runs without the \
relay when no GPIO interface is present.")]
struct Args {
    /// TOML configuration file; missing keys fall back to defaults
    #[arg(short, long, default_value = "kiosk.toml")]
    config: String,

    /// Log kiosk internals at debug level
    #[arg(short, long)]
    debug: bool,

    /// Log at info level
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with_all = ["debug", "verbose"])]
    quiet: bool,

    /// Check the configuration and exit
    #[arg(long)]
    validate_config: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Bind the camera and relay, then exit without serving
    #[arg(long)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl Args {
    fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args);

    info!("Starting kiosk service v{}", env!("CARGO_PKG_VERSION"));

    let config = KioskConfig::load_from_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", args.config))?;

    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let orchestrator = KioskOrchestrator::new(config)
        .await
        .context("failed to set up kiosk components")?;
    orchestrator.initialize().await?;

    if args.dry_run {
        println!("✓ Dry run completed - camera and relay initialized");
        return Ok(());
    }

    let exit_code = orchestrator.run().await.context("kiosk server failed")?;
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let level = args.log_level();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kiosk={},tower_http={}", level, level)));

    let fmt_layer = match args.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

fn print_default_config() -> kiosk::Result<()> {
    let rendered = toml::to_string_pretty(&KioskConfig::default())?;
    println!("# Kiosk configuration");
    println!("# Override any key with KIOSK_<SECTION>__<KEY>, e.g. KIOSK_SERVER__PORT=9000");
    println!();
    println!("{}", rendered);
    Ok(())
}
