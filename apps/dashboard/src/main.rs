use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpFoodsApi, PlateListController, PlateListEvent};
use shared::domain::{DraftPlate, PlateId};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "List, add, edit and delete food plates")]
struct Cli {
    /// Root URL of the foods backend, e.g. http://localhost:3333
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Settings file; defaults to ./dashboard.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print the resulting plate list as JSON instead of cards.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: String,
        #[arg(long)]
        price: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Fields left out keep their current values.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    info!(api_url = %settings.api_url, "dashboard: starting");

    let api = HttpFoodsApi::with_timeout(&settings.api_url, settings.request_timeout())?;
    let controller = PlateListController::new(Arc::new(api));
    let mut events = controller.subscribe();

    let outcome = run(&controller, cli.command).await;
    print_status(&mut events);
    outcome?;

    let state = controller.state().await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&state.plates)?);
    } else {
        print!("{}", render::render_list(&state));
    }
    Ok(())
}

async fn run(controller: &PlateListController, command: Command) -> Result<()> {
    controller.mount().await?;

    match command {
        Command::List => {}
        Command::Add {
            name,
            image,
            price,
            description,
        } => {
            controller.toggle_add_form().await;
            let created = controller
                .create(DraftPlate {
                    name,
                    image,
                    price,
                    description,
                })
                .await;
            controller.toggle_add_form().await;
            created?;
        }
        Command::Edit {
            id,
            name,
            image,
            price,
            description,
        } => {
            let plate = controller
                .plates()
                .await
                .into_iter()
                .find(|plate| plate.id == PlateId(id))
                .ok_or_else(|| anyhow!("plate {id} not found"))?;

            // The edit form starts from the current values.
            let mut draft = plate.draft();
            if let Some(v) = name {
                draft.name = v;
            }
            if let Some(v) = image {
                draft.image = v;
            }
            if let Some(v) = price {
                draft.price = v;
            }
            if let Some(v) = description {
                draft.description = v;
            }

            controller.request_edit(plate).await;
            let updated = controller.submit_edit(draft).await;
            controller.toggle_edit_form().await;
            updated?;
        }
        Command::Delete { id } => {
            if !controller.delete(PlateId(id)).await? {
                info!(plate_id = id, "dashboard: plate was not in the list");
            }
        }
    }

    Ok(())
}

fn print_status(events: &mut broadcast::Receiver<PlateListEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => {
                if let Some(line) = render::describe_event(&event) {
                    eprintln!("{line}");
                }
            }
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
