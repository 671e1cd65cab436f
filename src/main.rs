use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier::config::Config;
use atelier::db::{AppState, create_pool, init_db, queries};
use atelier::handlers;
use atelier::models::{CreateProject, CreateUser, UserRole};
use atelier::payments::StripeClient;

#[derive(Parser, Debug)]
#[command(name = "atelier")]
#[command(about = "Client portal and Stripe invoicing backend for a design studio")]
struct Cli {
    /// Seed the database with dev data (an admin, a client, a project)
    #[arg(long)]
    seed: bool,
}

fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seed");

    if queries::list_clients(&conn)
        .map(|c| !c.is_empty())
        .unwrap_or(false)
    {
        tracing::info!("Clients already exist, skipping seed");
        return;
    }

    let admin = queries::create_user(
        &conn,
        &CreateUser {
            email: "studio@example.com".to_string(),
            full_name: "Studio Admin".to_string(),
            role: UserRole::Admin,
            company: None,
            phone: None,
        },
    )
    .expect("Failed to seed admin");

    let client = queries::create_user(
        &conn,
        &CreateUser {
            email: "client@example.com".to_string(),
            full_name: "Sample Client".to_string(),
            role: UserRole::Client,
            company: Some("Sample Co".to_string()),
            phone: None,
        },
    )
    .expect("Failed to seed client");

    queries::create_project(
        &conn,
        &CreateProject {
            client_id: client.id.clone(),
            name: "Brand refresh".to_string(),
            description: Some("Identity and site refresh".to_string()),
        },
    )
    .expect("Failed to seed project");

    tracing::info!("Seeded dev data: admin key {}", admin.api_key);
    tracing::info!("Seeded dev data: client key {}", client.api_key);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = pool.get().expect("Failed to get db connection");
        init_db(&conn).expect("Failed to initialize schema");
    }

    if config.stripe_secret_key.is_empty() && !config.dev_mode {
        tracing::warn!("STRIPE_SECRET_KEY is not set; provider calls will fail");
    }

    let state = AppState {
        db: pool,
        billing: Arc::new(StripeClient::new(&config.stripe_secret_key)),
    };

    if cli.seed {
        if !config.dev_mode {
            eprintln!("--seed requires ATELIER_ENV=dev");
            std::process::exit(1);
        }
        seed_dev_data(&state);
    }

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
