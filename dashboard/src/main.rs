//! `tubegenie`: terminal front end for the TubeGenie API.
//!
//! Reads `TUBEGENIE_API_URL` and the bearer token from the environment
//! (see [`Config::from_env`]). Logs go to stderr as JSON, filtered by
//! `RUST_LOG`.

mod args;
mod render;

use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tubegenie_client::schema::{
    check_content_id, ContentItem, DeletePayload, GeneratePayload, GenerateRequest,
    ToggleFavoritePayload,
};
use tubegenie_client::{ApiClient, Config, Error, MutationCallbacks, Query, ValidationError};

use args::{Cli, Commands};

type CommandResult = std::result::Result<(), Arc<Error>>;

/// Read a query and require data.
async fn load<T>(query: Query<T>) -> std::result::Result<Arc<T>, Arc<Error>>
where
    T: Send + Sync + 'static,
{
    query.fetch().await.into_result()?.ok_or_else(|| {
        Arc::new(Error::Internal(format!(
            "Query {} is disabled",
            query.key()
        )))
    })
}

fn checked_id(id: &str) -> std::result::Result<(), Arc<Error>> {
    check_content_id(id).map_err(|e| Arc::new(Error::from(e)))
}

/// Notification printed after a mutation succeeds.
fn notify(message: Option<&str>, fallback: &str) {
    println!("{}", render::notice(message, fallback));
}

fn generated_callbacks() -> MutationCallbacks<GeneratePayload> {
    MutationCallbacks::new()
        .on_success(|_: &GeneratePayload| notify(None, "Content generated successfully!"))
}

fn deleted_callbacks() -> MutationCallbacks<DeletePayload> {
    MutationCallbacks::new().on_success(|deleted: &DeletePayload| {
        notify(deleted.extra.message.as_deref(), "Content deleted successfully")
    })
}

fn toggled_callbacks() -> MutationCallbacks<ToggleFavoritePayload> {
    MutationCallbacks::new().on_success(|toggled: &ToggleFavoritePayload| {
        notify(toggled.extra.message.as_deref(), "Favorite updated")
    })
}

async fn dashboard(client: &ApiClient) -> CommandResult {
    if let Ok(Some(user)) = client.current_user().await {
        println!("Signed in as {}", user.email.as_deref().unwrap_or(&user.user_id));
    }

    let (analytics, history) = tokio::join!(
        load(client.analytics()),
        load(client.content_history(Some(5)))
    );
    print!("{}", render::dashboard(&analytics?.data, &history?.data));
    Ok(())
}

async fn generate(client: &ApiClient, topic: String, model: Option<String>) -> CommandResult {
    let topic = topic.trim().to_string();
    if topic.is_empty() {
        return Err(Arc::new(
            ValidationError::at("topic", "Topic is required").into(),
        ));
    }

    let model = match model {
        Some(model) => model,
        None => {
            let models = load(client.models()).await?;
            let selected = models.default_selection().ok_or_else(|| {
                Arc::new(Error::Internal("No AI models are available".to_string()))
            })?;
            debug!(model = %selected.id, "Using default model");
            selected.id.clone()
        }
    };

    println!("Generating content for {:?} with {}...", topic, model);
    let generated = client
        .generate_content()
        .mutate(
            GenerateRequest::new(topic, model),
            generated_callbacks(),
        )
        .await
        .map_err(Arc::new)?;

    print!("\n{}", render::generated(&generated.data));
    Ok(())
}

async fn history(
    client: &ApiClient,
    limit: Option<u32>,
    search: Option<String>,
    model: Option<String>,
) -> CommandResult {
    let history = load(client.content_history(limit)).await?;
    let items: Vec<ContentItem> = history
        .data
        .iter()
        .filter(|item| search.as_deref().map_or(true, |term| render::matches_search(item, term)))
        .filter(|item| model.as_deref().map_or(true, |model| render::matches_model(item, model)))
        .cloned()
        .collect();
    print!("{}", render::content_list(&items));
    Ok(())
}

async fn run(client: &ApiClient, command: Commands) -> CommandResult {
    match command {
        Commands::Dashboard => dashboard(client).await,
        Commands::Generate { topic, model } => generate(client, topic, model).await,
        Commands::History {
            limit,
            search,
            model,
        } => history(client, limit, search, model).await,
        Commands::Favorites => {
            let favorites = load(client.favorites()).await?;
            println!("{} favorite(s)", favorites.extra.count);
            print!("{}", render::content_list(&favorites.data));
            Ok(())
        }
        Commands::Show { id } => {
            checked_id(&id)?;
            let content = load(client.content_by_id(id)).await?;
            print!("{}", render::content_detail(&content.data));
            Ok(())
        }
        Commands::Delete { id } => {
            client
                .delete_content()
                .mutate(id, deleted_callbacks())
                .await
                .map_err(Arc::new)?;
            Ok(())
        }
        Commands::Favorite { id } => {
            let toggled = client
                .toggle_favorite()
                .mutate(id, toggled_callbacks())
                .await
                .map_err(Arc::new)?;
            info!(content_id = %toggled.data.id, favorite = toggled.data.is_favorite, "Favorite toggled");
            Ok(())
        }
        Commands::Models => {
            let models = load(client.models()).await?;
            print!("{}", render::models(&models));
            Ok(())
        }
        Commands::Analytics => {
            let analytics = load(client.analytics()).await?;
            print!("{}", render::analytics(&analytics.data));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env_with_url(cli.api_url)?;
    let client = ApiClient::from_config(&config)?;
    info!(api = %config.api_base_url, "TubeGenie client ready");

    let command = cli.command.unwrap_or(Commands::Dashboard);
    if let Err(err) = run(&client, command).await {
        eprintln!("{}", render::failure(&err));
        std::process::exit(1);
    }
    Ok(())
}
