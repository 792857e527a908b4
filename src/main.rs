//! boringctl
//!
//! A CLI tool for managing a boringproxy server from the terminal.
//!
//! Administrators manage users and their access tokens; users manage their
//! tunnel clients and expose local ports through tunnels.
//!
//! The client authenticates using access tokens obtained from the boringproxy web UI.

#![deny(clippy::correctness)]
#![warn(clippy::suspicious)]
#![warn(clippy::style)]
#![warn(clippy::complexity)]
#![warn(clippy::perf)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use boringproxy_client::config::Config;
use boringproxy_client::protocol::{BasicAuth, ClientName, ClientScope, TlsMode, TunnelPort};
use boringproxy_client::{AdminClient, TransportConfig, TunnelOptions, UserClient};

#[derive(Parser, Debug)]
#[command(name = "boringctl")]
#[command(author, version, about = "Manage boringproxy users, clients and tunnels")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Server hostname
    #[arg(short, long, global = true, env = "BORINGPROXY_SERVER")]
    server: Option<String>,

    /// Access token for authentication (from the boringproxy web UI)
    #[arg(short = 'k', long, global = true, env = "BORINGPROXY_TOKEN")]
    token: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Authenticate and save your access token
    Login,

    /// Manage users (admin token required)
    Users {
        #[command(subcommand)]
        action: Option<UserCommands>,
    },

    /// Manage access tokens (admin token required)
    Tokens {
        #[command(subcommand)]
        action: Option<TokenCommands>,
    },

    /// Manage your tunnel clients
    Clients {
        /// Owner of the clients (defaults to the configured user)
        #[arg(short, long)]
        user: Option<String>,

        #[command(subcommand)]
        action: Option<ClientCommands>,
    },

    /// Expose a local port through a tunnel until interrupted
    Expose(ExposeArgs),
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// List registered users
    List,
    /// Create a user
    Create { username: String },
    /// Delete a user
    Delete { username: String },
    /// Create a user and an access token, skipping whatever already exists
    Full { username: String },
}

#[derive(Subcommand, Debug)]
enum TokenCommands {
    /// List all tokens
    List,
    /// Show the token of a user
    Get { username: String },
    /// Issue a new token for a user
    Create {
        username: String,
        /// Restrict the token to one client
        #[arg(long)]
        client: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ClientCommands {
    /// List your clients
    List,
    /// Register a client
    Create { name: String },
    /// Delete a client
    Delete { name: String },
}

#[derive(Parser, Debug)]
struct ExposeArgs {
    /// Owner of the client (defaults to the configured user)
    #[arg(short, long)]
    user: Option<String>,

    /// Client to open the tunnel for, registered if missing
    #[arg(short, long)]
    client: String,

    /// Local port to forward to
    #[arg(short, long)]
    port: u16,

    /// Local address to forward to
    #[arg(short = 'a', long, default_value = "127.0.0.1")]
    addr: String,

    /// Server-side port ("Random" or a number)
    #[arg(long, default_value = "Random")]
    tunnel_port: TunnelPort,

    /// TLS termination mode: client-tls, server-tls or passthrough
    #[arg(long, default_value = "client-tls")]
    tls: TlsMode,

    /// Protect the tunnel with HTTP basic auth (user:password)
    #[arg(long)]
    basic_auth: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    // Resolve server from CLI > config > error
    let server = cli
        .server
        .clone()
        .or(config.auth.server.clone())
        .unwrap_or_else(|| "localhost".to_string());

    let Some(command) = cli.command else {
        // If no subcommand, show help
        eprintln!("No command specified. Use --help for usage information.");
        eprintln!();
        eprintln!("Quick start:");
        eprintln!("  boringctl login -s <server>                 Authenticate");
        eprintln!("  boringctl users -s <server>                 List users");
        eprintln!("  boringctl expose -c <client> -p <port>      Expose a local port");
        std::process::exit(1);
    };

    let token = cli.token.or(config.auth.token.clone());

    match command {
        Commands::Login => run_login(&server, &config).await,
        Commands::Users { action } => {
            init_logging(cli.verbose);
            let transport = transport_config(&config, &server, token)?;
            run_users(&transport, action, cli.json).await
        }
        Commands::Tokens { action } => {
            init_logging(cli.verbose);
            let transport = transport_config(&config, &server, token)?;
            run_tokens(&transport, action, cli.json).await
        }
        Commands::Clients { user, action } => {
            init_logging(cli.verbose);
            let transport = transport_config(&config, &server, token)?;
            let user = resolve_user(user, &config)?;
            run_clients(&transport, &user, action, cli.json).await
        }
        Commands::Expose(args) => {
            init_logging(cli.verbose);
            let transport = transport_config(&config, &server, token)?;
            let user = resolve_user(args.user.clone(), &config)?;
            run_expose(&transport, &user, args).await
        }
    }
}

fn transport_config(config: &Config, server: &str, token: Option<String>) -> Result<TransportConfig> {
    let token = token.ok_or_else(|| {
        anyhow::anyhow!(
            "Access token required. Run 'boringctl login' first, use --token \n\
             or set the BORINGPROXY_TOKEN environment variable."
        )
    })?;
    Ok(config.transport_config(server, &token))
}

fn resolve_user(user: Option<String>, config: &Config) -> Result<String> {
    user.or(config.auth.user.clone()).ok_or_else(|| {
        anyhow::anyhow!(
            "Username required. Use --user or add `user` to the [auth] section of {:?}",
            Config::config_path().unwrap_or_default()
        )
    })
}

fn print_list<T: Serialize + std::fmt::Display>(items: &[T], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for item in items {
            println!("{}", item);
        }
    }
    Ok(())
}

async fn run_login(server: &str, config: &Config) -> Result<()> {
    let login_url = config.login_url(server)?;

    println!("To authenticate, visit the following URL in your browser:");
    println!();
    println!("  {}", login_url);
    println!();
    println!("Copy your access token from the Tokens page and paste it below.");
    println!();

    // Try to open browser
    if open::that(login_url.as_str()).is_err() {
        println!("(Could not open browser automatically)");
        println!();
    }

    print!("Access Token: ");
    use std::io::{self, Write};
    io::stdout().flush()?;

    let mut token = String::new();
    io::stdin().read_line(&mut token)?;
    let token = token.trim().to_string();

    if token.is_empty() {
        anyhow::bail!("No token provided");
    }

    print!("Username (leave empty for admin-only use): ");
    io::stdout().flush()?;
    let mut user = String::new();
    io::stdin().read_line(&mut user)?;
    let user = user.trim();

    // Save to config
    let mut config = Config::load().unwrap_or_default();
    config.auth.token = Some(token);
    config.auth.server = Some(server.to_string());
    if !user.is_empty() {
        config.auth.user = Some(user.to_string());
    }
    config.save()?;

    println!();
    println!(
        "Token saved to {:?}",
        Config::config_path().unwrap_or_default()
    );
    println!("You can now run: boringctl clients");

    Ok(())
}

async fn run_users(
    transport: &TransportConfig,
    action: Option<UserCommands>,
    json: bool,
) -> Result<()> {
    let mut admin = AdminClient::connect(transport)
        .await
        .context("Failed to load users")?;

    match action.unwrap_or(UserCommands::List) {
        UserCommands::List => {
            let users: Vec<_> = admin.users().iter().cloned().collect();
            print_list(&users, json)?;
        }
        UserCommands::Create { username } => {
            admin.create_user(&username).await?;
            println!("User '{}' created", username);
        }
        UserCommands::Delete { username } => {
            admin.delete_user(&username).await?;
            println!("User '{}' deleted", username);
        }
        UserCommands::Full { username } => {
            let outcome = admin.create_full_user(&username).await?;
            let token = admin.get_user_token(&username).await?;
            println!(
                "User '{}' ready (user created: {}, token created: {})",
                username, outcome.user_created, outcome.token_created
            );
            if let Some(token) = token {
                println!("Token: {}", token);
            }
        }
    }

    Ok(())
}

async fn run_tokens(
    transport: &TransportConfig,
    action: Option<TokenCommands>,
    json: bool,
) -> Result<()> {
    let admin = AdminClient::connect(transport)
        .await
        .context("Failed to contact server")?;

    match action.unwrap_or(TokenCommands::List) {
        TokenCommands::List => {
            let tokens = admin.user_tokens().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for record in tokens.records() {
                    println!("{} (Owner: {}) (Client: {})", record.token, record.owner, record.scope);
                }
            }
        }
        TokenCommands::Get { username } => match admin.get_user_token(&username).await? {
            Some(token) => println!("{}", token),
            None => anyhow::bail!("No token found for '{}'", username),
        },
        TokenCommands::Create { username, client } => {
            let scope = client
                .map(|c| ClientScope::Client(ClientName::from(c)))
                .unwrap_or_default();
            admin.create_token(&username, &scope).await?;
            println!("Token created for '{}' (client: {})", username, scope);
        }
    }

    Ok(())
}

async fn run_clients(
    transport: &TransportConfig,
    user: &str,
    action: Option<ClientCommands>,
    json: bool,
) -> Result<()> {
    let mut client = UserClient::connect(transport, user)
        .await
        .context("Failed to load clients")?;

    match action.unwrap_or(ClientCommands::List) {
        ClientCommands::List => {
            let clients: Vec<_> = client.clients().iter().cloned().collect();
            print_list(&clients, json)?;
        }
        ClientCommands::Create { name } => {
            client.create_client(&name).await?;
            println!("Client '{}' registered", name);
        }
        ClientCommands::Delete { name } => {
            client.delete_client(&name).await?;
            println!("Client '{}' deleted", name);
        }
    }

    Ok(())
}

async fn run_expose(transport: &TransportConfig, user: &str, args: ExposeArgs) -> Result<()> {
    let basic_auth = match args.basic_auth.as_deref() {
        Some(pair) => {
            let (username, password) = pair
                .split_once(':')
                .context("--basic-auth must look like user:password")?;
            Some(BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            })
        }
        None => None,
    };

    let options = TunnelOptions {
        tunnel_port: args.tunnel_port,
        local_addr: args.addr.clone(),
        tls_mode: args.tls,
        basic_auth,
    };

    let mut user_client = UserClient::connect(transport, user)
        .await
        .context("Failed to load clients")?;
    let mut tunnels = user_client.create_client(&args.client).await?;
    let domain = tunnels.create_tunnel(args.port, &options).await?;

    println!("Forwarding https://{} -> {}:{}", domain, args.addr, args.port);
    println!("Press Ctrl-C to close the tunnel");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tunnels
        .delete_tunnel(args.port)
        .await
        .with_context(|| format!("Failed to close tunnel {}", domain))?;
    println!("Tunnel {} closed", domain);

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
