use anyhow::{Context, Result};
use recipe_finder::api_connection::Provider;
use recipe_finder::catalog::RecipeCatalog;
use recipe_finder::cli::{parse_args, Cli, Command};
use recipe_finder::generation::OpenRouterGenerator;
use recipe_finder::images::UnsplashClient;
use recipe_finder::logging;
use recipe_finder::server::{self, AppState};
use recipe_finder::store::JsonFileStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

async fn open_catalog(cli: &Cli) -> Result<RecipeCatalog> {
    let store = JsonFileStore::open(&cli.recipes_path)
        .await
        .with_context(|| format!("Failed to open recipe collection at {:?}", cli.recipes_path))?;
    info!(path = %store.path().display(), "recipe store ready");

    let http = reqwest::Client::new();
    let generator = OpenRouterGenerator::new(
        Provider::openrouter(&cli.api_key_env_var),
        http.clone(),
        cli.model.clone(),
    );
    info!(model = generator.model(), "generation model configured");
    let images = UnsplashClient::new(http, cli.unsplash_access_key.clone());

    Ok(RecipeCatalog::new(
        Arc::new(store),
        Arc::new(generator),
        Arc::new(images),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();
    logging::init(&cli.log_level);

    match cli.command() {
        Command::Serve => {
            // A broken store should not take the process down; requests report it instead.
            let state = match open_catalog(&cli).await {
                Ok(catalog) => AppState::new(catalog),
                Err(e) => {
                    error!(error = ?e, "recipe store unavailable, serving without it");
                    AppState::uninitialized()
                }
            };
            server::serve(state, SocketAddr::new(cli.serve.host, cli.serve.port)).await
        }
        Command::Generate { n } => {
            let catalog = open_catalog(&cli).await?;
            let outcome = catalog
                .generate(n)
                .await
                .context("Recipe generation failed")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Command::UpdateImages => {
            let catalog = open_catalog(&cli).await?;
            let updated = catalog
                .refresh_placeholder_images()
                .await
                .context("Failed to update recipe images")?;
            info!(updated, "image update process completed");
            Ok(())
        }
    }
}
