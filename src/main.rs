use clap::Parser;
use redub::cli::{Cli, Commands};
use redub::commands;
use redub::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("redub=info".parse()?),
        )
        .init();

    // ELEVEN_LABS_KEY and friends may live in a .env file
    redub::synth::credentials::load_dotenv();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Dub(args) => commands::run_dub(Config::load(config_path)?, args),
        Commands::Voices { api_key } => {
            commands::list_voices(&Config::load(config_path)?, api_key.as_deref())
        }
        Commands::Probe { paths } => commands::probe_paths(&Config::load(config_path)?, &paths),
        Commands::PlanTempo { ratio } => commands::plan_tempo(ratio),
        Commands::InitConfig => commands::print_default_config(),
    }
}
