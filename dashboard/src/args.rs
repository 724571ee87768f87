use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tubegenie")]
#[command(about = "Generate and manage YouTube content ideas from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// API base URL (overrides TUBEGENIE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Usage stats and recent content (default)
    Dashboard,

    /// Generate titles, description, tags and an outline for a topic
    #[command(alias = "g")]
    Generate {
        /// What the video is about
        #[arg(short, long)]
        topic: String,

        /// Model id (defaults to the server's default model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List generated content, newest first
    #[command(alias = "ls")]
    History {
        /// How many items to fetch (1-100)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Only show items whose topic, titles or description contain this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only show items generated by a matching model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List favorite content
    Favorites,

    /// Show one content item in full
    Show { id: String },

    /// Delete a content item
    #[command(alias = "rm")]
    Delete { id: String },

    /// Add or remove a content item from favorites
    #[command(alias = "fav")]
    Favorite { id: String },

    /// List available AI models
    Models,

    /// Detailed usage analytics
    Analytics,
}
