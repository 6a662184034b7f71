use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::time::Duration;

use funko_server::client::Client;
use funko_server::model::{Funko, FunkoGenre, FunkoPatch, FunkoType};
use funko_server::protocol::{Command, Request};
use funko_server::server::dial_address;

#[derive(Parser)]
#[command(name = "funko-cli")]
#[command(about = "Client for the Funko collection server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:60300")]
    server: SocketAddr,

    #[arg(short, long)]
    user: String,

    /// Seconds to wait for the server's answer
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a Funko to the collection
    Add(AddArgs),
    /// Change fields of an existing Funko
    Update(UpdateArgs),
    /// Remove a Funko
    Remove { id: String },
    /// Show one Funko
    Show { id: String },
    /// List the whole collection
    List,
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: String,
    #[arg(long = "type", value_parser = wire_name::<FunkoType>)]
    kind: FunkoType,
    #[arg(long, value_parser = wire_name::<FunkoGenre>)]
    genre: FunkoGenre,
    #[arg(long)]
    franchise: String,
    #[arg(long)]
    number: u32,
    #[arg(long)]
    exclusive: bool,
    #[arg(long)]
    market_value: f64,
}

#[derive(Args)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long = "type", value_parser = wire_name::<FunkoType>)]
    kind: Option<FunkoType>,
    #[arg(long, value_parser = wire_name::<FunkoGenre>)]
    genre: Option<FunkoGenre>,
    #[arg(long)]
    franchise: Option<String>,
    #[arg(long)]
    number: Option<u32>,
    #[arg(long)]
    exclusive: Option<bool>,
    #[arg(long)]
    market_value: Option<f64>,
}

/// Parse a category by its wire name or alias ("Pop!", "pop-rides", "anime").
fn wire_name<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new(dial_address(cli.server)).with_timeout(Duration::from_secs(cli.timeout));

    let command = match cli.command {
        Commands::Add(args) => Command::Add(Funko {
            id: String::new(),
            name: args.name,
            description: args.description,
            kind: args.kind,
            genre: args.genre,
            franchise: args.franchise,
            number: args.number,
            exclusive: args.exclusive,
            market_value: args.market_value,
        }),
        Commands::Update(args) => {
            let patch = FunkoPatch {
                name: args.name,
                description: args.description,
                kind: args.kind,
                genre: args.genre,
                franchise: args.franchise,
                number: args.number,
                exclusive: args.exclusive,
                market_value: args.market_value,
            };
            if patch.is_empty() {
                eprintln!("Error: update needs at least one field to change");
                std::process::exit(2);
            }
            Command::Update { id: args.id, patch }
        }
        Commands::Remove { id } => Command::Remove { id },
        Commands::Show { id } => Command::Show { id },
        Commands::List => Command::List,
    };

    let response = client.send(&Request::new(cli.user, command)).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}
