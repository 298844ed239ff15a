/// Prelude Server - self-hosted media-library server
use clap::{Parser, Subcommand};
use prelude_core::{Scope, User};
use prelude_server::{config::ServerConfig, router, state::AppState};
use prelude_storage::{users, Pagination};
use std::{net::SocketAddr, path::PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "prelude-server")]
#[command(about = "Prelude media-library server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "PRELUDE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a new user
    AddUser {
        /// Username
        #[arg(short, long)]
        username: String,
        /// Password
        #[arg(short, long)]
        password: String,
        /// Scope to grant; repeat for several
        #[arg(short, long = "scope")]
        scopes: Vec<String>,
        /// Create the account disabled
        #[arg(long)]
        disabled: bool,
    },
    /// List all users
    ListUsers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prelude_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::AddUser {
            username,
            password,
            scopes,
            disabled,
        } => add_user(config, &username, &password, &scopes, disabled).await?,
        Commands::ListUsers => list_users(config).await?,
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Prelude Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let state = AppState::connect(config).await?;
    tracing::info!("Database connected");

    let app = router(state);

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn add_user(
    config: ServerConfig,
    username: &str,
    password: &str,
    scopes: &[String],
    disabled: bool,
) -> anyhow::Result<()> {
    let scopes = scopes
        .iter()
        .map(|scope| scope.parse::<Scope>())
        .collect::<Result<Vec<_>, _>>()?;

    let state = AppState::connect(config).await?;
    let password_hash = state.auth_service.hash_password(password).await?;

    let mut user = User::new(username, password_hash, scopes);
    user.disabled = disabled;
    users::save(state.pool(), &user).await?;

    tracing::info!(user = %user.id, "Created user {}", user.username);
    println!("{}", user.id);

    Ok(())
}

async fn list_users(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::connect(config).await?;
    let page = users::list(state.pool(), Pagination::new(u32::MAX, 0)).await?;

    println!("Users ({}):", page.total);
    for user in page.resources {
        let scopes: Vec<&str> = user.scopes.iter().map(|scope| scope.as_str()).collect();
        let status = if user.disabled { " (disabled)" } else { "" };
        println!("  {} - {}{} [{}]", user.id, user.username, status, scopes.join(", "));
    }

    Ok(())
}
