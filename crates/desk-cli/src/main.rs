//! Facility desk CLI - command-line front end for the maintenance desk API.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::Desk;
use desk_api::{RequestFilter, RequestStatus};
use desk_config_and_utils::{init_logging, Config, Paths};
use tracing::{debug, warn};

/// Facility desk CLI - Browse and work on maintenance requests.
#[derive(Parser)]
#[command(name = "desk")]
#[command(about = "Facility desk CLI for maintenance requests and administration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// API base URL, overriding config and DESK_API_BASE
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Login name; prompted for when missing
    #[arg(short, long, global = true, env = "DESK_LOGIN")]
    login: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with login name and password
    Login,

    /// Show the logged-in user and role
    Whoami,

    /// Work with maintenance requests
    Requests {
        #[command(subcommand)]
        command: RequestCommands,
    },

    /// Manage users (admin)
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage shops (admin)
    Shops {
        #[command(subcommand)]
        command: ShopCommands,
    },

    /// Manage scheduled notifications (admin)
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
}

#[derive(Subcommand)]
enum RequestCommands {
    /// List requests
    List {
        /// Show archived requests instead of active ones
        #[arg(long)]
        archived: bool,
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
        /// Only requests of this shop
        #[arg(long)]
        shop: Option<i32>,
        /// Only requests past their deadline
        #[arg(long)]
        overdue: bool,
        /// Only requests with this status (e.g. "In work", "Done", "Closed")
        #[arg(long)]
        status: Option<String>,
        /// Page number, starting at 0
        #[arg(short, long, default_value = "0")]
        page: u32,
    },
    /// Show comments on a request
    ShowComments {
        /// Request ID
        id: i32,
    },
    /// Add a comment to a request
    Comment {
        /// Request ID
        id: i32,
        /// Comment text
        text: String,
    },
    /// Mark a request as done
    Complete {
        /// Request ID
        id: i32,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List {
        /// Only users with this role
        #[arg(short, long)]
        role: Option<String>,
        /// Page number, starting at 0
        #[arg(short, long, default_value = "0")]
        page: u32,
    },
}

#[derive(Subcommand)]
enum ShopCommands {
    /// List shops
    List {
        /// Page number, starting at 0
        #[arg(short, long, default_value = "0")]
        page: u32,
    },
}

#[derive(Subcommand)]
enum NotificationCommands {
    /// List notifications
    List {
        /// Only active notifications
        #[arg(long, conflicts_with = "paused")]
        active: bool,
        /// Only paused notifications
        #[arg(long)]
        paused: bool,
        /// Page number, starting at 0
        #[arg(short, long, default_value = "0")]
        page: u32,
    },
}

fn load_config(cli: &Cli) -> Config {
    let mut config = match Paths::new().and_then(|paths| Config::load(&paths)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: using default configuration ({})", e);
            Config::new()
        }
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(api_base) = &cli.api_base {
        config.api_base = api_base.clone();
    }
    config
}

async fn run(desk: &Desk, cli: &Cli) -> anyhow::Result<()> {
    let format = &cli.format;
    let login = cli.login.as_deref();

    match &cli.command {
        Commands::Login => commands::login(desk, login, format).await,
        Commands::Whoami => commands::whoami(desk, login, format).await,
        Commands::Requests { command } => {
            desk.sign_in(login).await?;
            match command {
                RequestCommands::List {
                    archived,
                    search,
                    shop,
                    overdue,
                    status,
                    page,
                } => {
                    let filter = RequestFilter {
                        archived: *archived,
                        search_term: search.clone(),
                        shop_id: *shop,
                        overdue: *overdue,
                        status: status.clone().map(RequestStatus::from),
                        ..RequestFilter::default()
                    };
                    commands::requests_list(desk, filter, *page, format).await
                }
                RequestCommands::ShowComments { id } => {
                    commands::requests_show_comments(desk, *id, format).await
                }
                RequestCommands::Comment { id, text } => {
                    commands::requests_comment(desk, *id, text, format).await
                }
                RequestCommands::Complete { id } => {
                    commands::requests_complete(desk, *id, format).await
                }
            }
        }
        Commands::Users { command } => {
            desk.sign_in(login).await?;
            match command {
                UserCommands::List { role, page } => {
                    commands::users_list(desk, role.as_deref(), *page, format).await
                }
            }
        }
        Commands::Shops { command } => {
            desk.sign_in(login).await?;
            match command {
                ShopCommands::List { page } => commands::shops_list(desk, *page, format).await,
            }
        }
        Commands::Notifications { command } => {
            desk.sign_in(login).await?;
            match command {
                NotificationCommands::List {
                    active,
                    paused,
                    page,
                } => {
                    let filter = match (*active, *paused) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    };
                    commands::notifications_list(desk, filter, *page, format).await
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli);

    // Initialize logging via observability crate
    init_logging("cli", &config);
    debug!(api_base = %config.api_base, "Configuration loaded");

    let desk = match Desk::connect(&config) {
        Ok(desk) => desk,
        Err(e) => {
            output::print_error(&e.to_string(), &cli.format);
            std::process::exit(1);
        }
    };

    let result = run(&desk, &cli).await;

    // The refresh cookie is not kept between invocations, so always end the session.
    desk.close().await;

    if let Err(e) = result {
        warn!(error = %e, "Command failed");
        output::print_error(&e.to_string(), &cli.format);
        std::process::exit(1);
    }
}
