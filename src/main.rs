use clap::Parser;
use fundgate::{settings, web};
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "fundgate",
    version,
    about = "Role checks and auto-approval gating for the crowdfunding platform"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // role hierarchy + decision engine, fixed for the life of the process
    let state = web::AppState::from_settings(settings)?;

    // start web server
    web::serve(state).await?;
    Ok(())
}
