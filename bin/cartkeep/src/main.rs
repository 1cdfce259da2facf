mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cartkeep")]
#[command(about = "Save, restore and clear a shop cart; hide prices while browsing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration
    Onboard {
        /// Overwrite an existing configuration without asking
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and stored state
    Status,

    /// Work with the live remote cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },

    /// Manage saved carts
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },

    /// Price visibility
    Prices {
        #[command(subcommand)]
        command: PricesCommands,
    },

    /// Deliver a host shortcut command as the browser would
    Shortcut {
        /// Shortcut command name, e.g. toggle-prices
        command: String,

        /// URL of the active tab
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartCommands {
    /// Print the current cart
    Show,
    /// Remove every line from the cart
    Clear,
    /// Replace the cart with a saved cart
    Load {
        /// Saved cart name
        name: String,
    },
}

#[derive(Subcommand)]
enum SavedCommands {
    /// List saved carts
    List,
    /// Save the current cart under a name (replaces a cart with the same name)
    Save {
        name: String,
    },
    /// Replace a saved cart's contents with the current cart
    Overwrite {
        index: usize,
    },
    /// Delete a saved cart
    Delete {
        index: usize,
    },
}

#[derive(Subcommand)]
enum PricesCommands {
    /// Flip the persisted price visibility
    Toggle,
    /// Show the persisted price visibility
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Onboard { force } => {
            commands::onboard::run(force).await?;
        }
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Cart { command } => match command {
            CartCommands::Show => commands::cart::show().await?,
            CartCommands::Clear => commands::cart::clear().await?,
            CartCommands::Load { name } => commands::cart::load(&name).await?,
        },
        Commands::Saved { command } => match command {
            SavedCommands::List => commands::saved::list().await?,
            SavedCommands::Save { name } => commands::saved::save(&name).await?,
            SavedCommands::Overwrite { index } => commands::saved::overwrite(index).await?,
            SavedCommands::Delete { index } => commands::saved::delete(index).await?,
        },
        Commands::Prices { command } => match command {
            PricesCommands::Toggle => commands::prices::toggle().await?,
            PricesCommands::Status => commands::prices::status().await?,
        },
        Commands::Shortcut { command, url } => {
            commands::shortcut::run(&command, url.as_deref()).await?;
        }
    }

    Ok(())
}
