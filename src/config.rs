use crate::auth::Role;
use crate::library::book::NewBook;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Library catalog REST server.
#[derive(Parser, Debug, Clone)]
#[command(name = "bookshelf-rs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "BOOKSHELF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the server (default if no command given).
    Serve {
        /// Address to bind the server to.
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// User management commands.
    User {
        /// User subcommand action.
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Catalog management commands.
    Book {
        /// Book subcommand action.
        #[command(subcommand)]
        action: BookCommand,
    },

    /// Initialize database and create default config.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// User management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// Add a new user.
    Add {
        /// Username.
        username: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
        /// Role to grant (USER or ADMIN); repeat for several.
        #[arg(short, long = "role", default_value = "USER")]
        roles: Vec<Role>,
    },

    /// Delete a user.
    Del {
        /// Username to delete.
        username: String,
    },

    /// List all users.
    List,

    /// Change user password.
    Passwd {
        /// Username.
        username: String,
        /// New password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// Catalog management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BookCommand {
    /// List all books.
    List,

    /// Add a book.
    Add {
        /// Book title.
        title: String,
        /// Book description.
        description: String,
    },

    /// Delete a book.
    Del {
        /// Book ID.
        id: i64,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Initial data for an empty database.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Catalog title.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            title: default_title(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        8080,
    )
}

fn default_title() -> String {
    "Library".to_string()
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/bookshelf.db")
}

/// Seed data, applied only to empty tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Accounts created when no user exists.
    #[serde(default = "default_seed_users")]
    pub users: Vec<SeedUser>,

    /// Books inserted when the catalog is empty.
    #[serde(default = "default_seed_books")]
    pub books: Vec<NewBook>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            users: default_seed_users(),
            books: default_seed_books(),
        }
    }
}

/// Seeded account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    /// Username.
    pub username: String,
    /// Plain-text password, hashed on insert.
    pub password: String,
    /// Granted roles.
    pub roles: Vec<Role>,
}

impl SeedConfig {
    /// Seed users as `(username, password, roles)` tuples.
    pub fn user_entries(&self) -> Vec<(String, String, Vec<Role>)> {
        self.users
            .iter()
            .map(|u| (u.username.clone(), u.password.clone(), u.roles.clone()))
            .collect()
    }
}

fn default_seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "user".to_string(),
            password: "pass".to_string(),
            roles: vec![Role::User],
        },
        SeedUser {
            username: "admin".to_string(),
            password: "pass".to_string(),
            roles: vec![Role::User, Role::Admin],
        },
    ]
}

fn default_seed_books() -> Vec<NewBook> {
    vec![
        NewBook::new(
            "SUEÑOS DE ACERO Y NEON",
            "Los personajes que protagonizan este relato sobreviven en una sociedad en decadencia.",
        ),
        NewBook::new(
            "LA VIDA SECRETA DE LA MENTE",
            "La vida secreta de la mente es un viaje especular que recorre el cerebro y el pensamiento.",
        ),
        NewBook::new(
            "CASI SIN QUERER",
            "El amor puede ser una trampa, un juego de espejos, una ilusión.",
        ),
        NewBook::new(
            "TERMINAMOS Y OTROS POEMAS SIN TERMINAR",
            "Recopilación de nuevos poemas, textos en prosa y pensamientos.",
        ),
        NewBook::new(
            "LA LEGIÓN PERDIDA",
            "En el año 53 a. C. el cónsul Craso cruzó el Éufrates para conquistar Oriente.",
        ),
    ]
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        Self::first_existing(Self::config_candidates())
    }

    /// Config locations in lookup order.
    pub fn config_candidates() -> Vec<PathBuf> {
        let mut candidates = vec![
            PathBuf::from("config.toml"),
            PathBuf::from("bookshelf-rs.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("bookshelf-rs").join("config.toml"));
        }
        candidates.push(PathBuf::from("/etc/bookshelf-rs/config.toml"));
        candidates
    }

    pub(crate) fn first_existing(
        candidates: impl IntoIterator<Item = PathBuf>,
    ) -> Option<PathBuf> {
        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# bookshelf-rs configuration

[server]
bind = "0.0.0.0:8080"
title = "Library"

[database]
# path = "/var/lib/bookshelf-rs/bookshelf.db"

# Accounts created on first start when no user exists.
# Roles are independent: ADMIN does not imply USER.
[[seed.users]]
username = "user"
password = "pass"
roles = ["USER"]

[[seed.users]]
username = "admin"
password = "pass"
roles = ["USER", "ADMIN"]

# Books inserted on first start when the catalog is empty.
# [[seed.books]]
# title = "Clean Code"
# description = "A handbook of agile software craftsmanship"
"#
        .to_string()
    }
}
