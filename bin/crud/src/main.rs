use clap::{Parser, Subcommand};
use log::{debug, error, info};
use thiserror::Error;

use config::{Config, ConfigError};
use storage::bson::{self, doc, Bson, Document};
use storage::{Crud, DBError};

#[derive(Parser, Debug)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert one JSON document
    Create { document: String },

    /// Print every document matching a JSON query
    Read { query: String },

    /// Apply an update operator spec, e.g. '{"$set": {"species": "Canine"}}'
    Update {
        query: String,
        update: String,
        /// Update every match instead of the first
        #[arg(short, long)]
        many: bool,
    },

    /// Delete documents matching a JSON query
    Delete {
        query: String,
        /// Delete every match instead of the first
        #[arg(short, long)]
        many: bool,
    },

    /// Create, read, update and delete a sample document
    Demo,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to load config: {0}")]
    Config(ConfigError),

    #[error(transparent)]
    Storage(#[from] DBError),

    #[error("Invalid JSON argument: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to convert JSON to BSON: {0}")]
    Bson(#[from] bson::ser::Error),
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let args = Args::parse();
    debug!("Args: {:?}", args);

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    // Load configuration from yaml
    let config = Config::from_file(&args.config).map_err(CliError::Config)?;

    let crud =
        Crud::connect(&config.connection, &config.target.database, &config.target.collection)
            .await?;

    let result = execute(&crud, args.command).await;
    crud.shutdown().await;
    result
}

async fn execute(crud: &Crud, command: Command) -> Result<(), CliError> {
    match command {
        Command::Create { document } => {
            let created = crud.create(parse_json(&document)?).await?;
            println!("{}", created);
        }
        Command::Read { query } => {
            for document in crud.read(parse_json(&query)?).await? {
                print_document(document)?;
            }
        }
        Command::Update { query, update, many } => {
            let modified = crud.update(parse_json(&query)?, parse_json(&update)?, many).await?;
            println!("{}", modified);
        }
        Command::Delete { query, many } => {
            let deleted = crud.delete(parse_json(&query)?, many).await?;
            println!("{}", deleted);
        }
        Command::Demo => run_demo(crud).await?,
    }
    Ok(())
}

async fn run_demo(crud: &Crud) -> Result<(), CliError> {
    info!("Running CRUD demo");

    let created = crud.create(doc! { "name": "Rex", "species": "Dog" }).await?;
    info!("create -> {}", created);

    for document in crud.read(doc! { "name": "Rex" }).await? {
        print_document(document)?;
    }

    let modified =
        crud.update(doc! { "name": "Rex" }, doc! { "$set": { "species": "Canine" } }, false).await?;
    info!("update -> {}", modified);

    for document in crud.read(doc! { "name": "Rex" }).await? {
        print_document(document)?;
    }

    let deleted = crud.delete(doc! { "name": "Rex" }, false).await?;
    info!("delete -> {}", deleted);

    let remaining = crud.read(doc! { "name": "Rex" }).await?;
    info!("read after delete -> {} document(s)", remaining.len());

    Ok(())
}

fn parse_json(s: &str) -> Result<Bson, CliError> {
    let value: serde_json::Value = serde_json::from_str(s)?;
    Ok(bson::to_bson(&value)?)
}

fn print_document(document: Document) -> Result<(), CliError> {
    let json = Bson::Document(document).into_relaxed_extjson();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
