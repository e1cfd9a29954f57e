// src/main.rs

use clap::{Parser, Subcommand};
use quizbox::config::Config;
use quizbox::error::AppError;
use quizbox::services::stats::{quiz_attempts, user_stats};
use quizbox::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Quizbox administration
#[derive(Parser)]
#[command(name = "quizbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the owner administrator and sample quizzes
    Init,

    /// Show the best attempts
    #[command(alias = "lb")]
    Leaderboard {
        /// Number of entries to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// List accounts with quiz activity
    Users,

    /// List quizzes with attempt counts
    Quizzes,

    /// Show the notification feed
    Notifications {
        /// Mark every entry as read afterwards
        #[arg(long)]
        mark_read: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "quizbox.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let state = AppState::open(config).await?;

    match cli.command {
        Commands::Init => {
            state.initialize().await?;
            println!("Initialized.");
        }
        Commands::Leaderboard { limit } => {
            let top = state.scores.leaderboard_top(limit).await;
            if top.is_empty() {
                println!("No scores yet.");
            }
            for (rank, s) in top.iter().enumerate() {
                println!(
                    "{:>3}. {:<30} {:<30} {}/{} ({}%) {}",
                    rank + 1,
                    s.user_email,
                    s.quiz_title,
                    s.score,
                    s.total_questions,
                    s.percentage(),
                    s.date.format("%Y-%m-%d %H:%M"),
                );
            }
        }
        Commands::Users => {
            let accounts = state.accounts.list_all().await;
            let scores = state.scores.all().await;
            for admin in accounts.iter().filter(|a| a.is_admin()) {
                let owner = if admin.owner { " (owner)" } else { "" };
                println!("{:<30} admin{}", admin.email, owner);
            }
            for stat in user_stats(&accounts, &scores) {
                let last_active = stat
                    .last_active
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<30} user  quizzes taken: {}, last active: {}",
                    stat.email, stat.quizzes_taken, last_active
                );
            }
        }
        Commands::Quizzes => {
            let attempts = quiz_attempts(&state.scores.all().await);
            for quiz in state.quizzes.list().await {
                println!(
                    "{:<36} {:<40} questions: {}, attempts: {}",
                    quiz.id,
                    quiz.title,
                    quiz.questions.len(),
                    attempts.get(&quiz.id).copied().unwrap_or(0)
                );
            }
        }
        Commands::Notifications { mark_read } => {
            let feed = state.notifications.list_all().await;
            println!("{} unread", state.notifications.unread_count().await);
            for n in &feed {
                let marker = if n.read { ' ' } else { '*' };
                println!("{} {} {}", marker, n.timestamp.format("%Y-%m-%d %H:%M:%S"), n.message);
            }
            if mark_read {
                state.notifications.mark_all_read().await?;
            }
        }
    }

    Ok(())
}
