use clap::{Parser, Subcommand};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "studyquest-cli", version, about = "StudyQuest CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Task completion
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Session statistics and profile
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Badge catalog and progress
    Badge {
        #[command(subcommand)]
        action: commands::badge::BadgeAction,
    },
    /// Streak management
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Holiday calendar (streak freezing)
    Holiday {
        #[command(subcommand)]
        action: commands::holiday::HolidayAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Badge { action } => commands::badge::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Holiday { action } => commands::holiday::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
