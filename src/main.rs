//! bookshelf-rs server entry point.

use bookshelf_rs::{
    auth::AuthService,
    config::{BookCommand, Cli, Command, Config, UserCommand},
    db::{self, Database},
    library::{BookService, CatalogService, NewBook},
    server,
};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    match cli.command {
        Some(Command::Init { force }) => cmd_init(force).await,
        Some(Command::User { action }) => cmd_user(action, &config).await,
        Some(Command::Book { action }) => cmd_book(action, &config).await,
        Some(Command::Serve { bind }) => cmd_serve(config, bind).await,
        None => cmd_serve(config, None).await,
    }
}

/// Initialize config and database.
async fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let _db = Database::open(&config.database.path)?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nEdit config.toml to configure your server.");
    println!("Then run: bookshelf-rs user add <username> --password <password> --role ADMIN");

    Ok(())
}

/// User management commands.
async fn cmd_user(action: UserCommand, config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let auth = AuthService::new(db);

    match action {
        UserCommand::Add {
            username,
            password,
            roles,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("Password: ")?,
            };

            let user = auth.create_user(&username, &password, &roles)?;
            println!(
                "Created user: {} (roles: {}, id: {})",
                user.username,
                format_roles(&user.roles),
                user.id
            );
        }

        UserCommand::Del { username } => {
            if auth.delete_user(&username)? {
                println!("Deleted user: {}", username);
            } else {
                println!("User not found: {}", username);
            }
        }

        UserCommand::List => {
            let users = auth.list_users()?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<20} {:<12} {:<36} CREATED", "USERNAME", "ROLES", "ID");
                println!("{}", "-".repeat(84));
                for user in users {
                    let created = db::timestamp_to_datetime(user.created_at)
                        .format("%Y-%m-%d %H:%M")
                        .to_string();
                    println!(
                        "{:<20} {:<12} {:<36} {}",
                        user.username,
                        format_roles(&user.roles),
                        user.id,
                        created
                    );
                }
            }
        }

        UserCommand::Passwd { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("New password: ")?,
            };

            if auth.change_password(&username, &password)? {
                println!("Password changed for: {}", username);
            } else {
                println!("User not found: {}", username);
            }
        }
    }

    Ok(())
}

/// Catalog management commands.
async fn cmd_book(action: BookCommand, config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let catalog = CatalogService::new(db);

    match action {
        BookCommand::List => {
            let books = catalog.find_all()?;
            if books.is_empty() {
                println!("No books found.");
            } else {
                println!("{:<6} {:<40} DESCRIPTION", "ID", "TITLE");
                println!("{}", "-".repeat(80));
                for book in books {
                    println!("{:<6} {:<40} {}", book.id, book.title, book.description);
                }
            }
        }

        BookCommand::Add { title, description } => {
            let book = catalog.save(NewBook::new(title, description))?;
            println!("Added book: {} (id: {})", book.title, book.id);
        }

        BookCommand::Del { id } => {
            if catalog.delete(id)? {
                println!("Deleted book: {}", id);
            } else {
                println!("Book not found: {}", id);
            }
        }
    }

    Ok(())
}

/// Start the server.
async fn cmd_serve(mut config: Config, bind: Option<std::net::SocketAddr>) -> anyhow::Result<()> {
    if let Some(addr) = bind {
        config.server.bind = addr;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf_rs=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Database::open(&config.database.path)?;

    tracing::info!(
        title = %config.server.title,
        bind = %config.server.bind,
        database = %config.database.path.display(),
        "Starting bookshelf-rs server"
    );

    // First start: load sample data and default accounts
    CatalogService::new(db.clone()).seed(&config.seed.books)?;
    AuthService::new(db.clone()).seed(&config.seed.user_entries())?;

    let bind_addr = config.server.bind;
    let state = server::AppState::new_with_db(db);
    let app = server::create_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(address = %bind_addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn format_roles(roles: &[bookshelf_rs::auth::Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Prompt for password input.
fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok(password.trim().to_string())
}
