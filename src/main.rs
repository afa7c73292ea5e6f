use clap::{Parser, Subcommand};
use rusty_library_lending::{
    adapters::postgres::{PostgresBookRepository, PostgresLoanStore, PostgresMemberRepository},
    api::{handlers::AppState, router::create_router},
    application::{
        loan::ServiceDependencies,
        seed::{self, SeedBook, SeedMember},
    },
    config::AppConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "Library lending service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Import or destroy seed data
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
}

#[derive(Subcommand)]
enum SeedAction {
    /// Insert books and members from JSON files
    Import {
        #[arg(long, default_value = "_data/books.json")]
        books: PathBuf,
        #[arg(long, default_value = "_data/members.json")]
        members: PathBuf,
    },
    /// Delete all books and members
    Destroy,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rusty_library_lending=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize adapters
    let service_deps = ServiceDependencies::new(
        Arc::new(PostgresBookRepository::new(pool.clone())),
        Arc::new(PostgresMemberRepository::new(pool.clone())),
        Arc::new(PostgresLoanStore::new(pool)),
        config.loan.policy(),
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app = create_router(Arc::new(AppState { service_deps }));

            let addr = config.server.bind_address();
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(
                borrow_period_days = config.loan.borrow_period_days,
                penalty_period_days = config.loan.penalty_period_days,
                "Server listening on {}",
                addr
            );

            axum::serve(listener, app).await?;
        }
        Command::Seed {
            action: SeedAction::Import { books, members },
        } => {
            let books: Vec<SeedBook> = seed::read_seed_file(&books)?;
            let members: Vec<SeedMember> = seed::read_seed_file(&members)?;
            let report = seed::import(&service_deps, books, members, chrono::Utc::now()).await?;
            println!("Imported {} books and {} members", report.books, report.members);
        }
        Command::Seed {
            action: SeedAction::Destroy,
        } => {
            let report = seed::destroy(&service_deps).await?;
            println!("Destroyed {} books and {} members", report.books, report.members);
        }
    }

    Ok(())
}
