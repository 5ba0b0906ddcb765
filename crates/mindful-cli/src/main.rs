use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod device;
mod output;

#[derive(Parser)]
#[command(name = "mindful", version, about = "Mindful meditation timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Meditation timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Render an ambient theme or the completion chime to a WAV file
    Render(commands::render::RenderArgs),
    /// Show a meditation quote
    Quote(commands::quote::QuoteArgs),
    /// User settings (sound, vibration, completion tone)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Offline cache worker
    Worker {
        #[command(subcommand)]
        action: commands::worker::WorkerAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Log to stderr, filtered by `MINDFUL_LOG` (or `RUST_LOG`), warnings by default.
fn init_tracing() {
    let filter = std::env::var("MINDFUL_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Render(args) => commands::render::run(args),
        Commands::Quote(args) => commands::quote::run(args),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Worker { action } => commands::worker::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "mindful", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
