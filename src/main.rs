use arc_folder_export::arc::ArcExtractor;
use arc_folder_export::builder::BookmarkBuilder;
use arc_folder_export::favicon::FaviconResolver;
use arc_folder_export::fetch::{Fetcher, HttpFetcher};
use arc_folder_export::{Extractor, Node};
use clap::Parser;
use scraper::Html;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use url::Url;

/// Export a shared arc.net folder as a browser-importable bookmarks file.
#[derive(Parser, Debug)]
struct Cli {
    /// URL of the shared folder page (https://arc.net/folder/...)
    url: String,

    /// Skip favicon lookups; icon attributes are left empty
    #[arg(long)]
    no_icons: bool,

    /// Where to write the bookmarks file
    #[arg(long, default_value = "bookmarks.html")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();
    let page_url = Url::parse(&cli.url)?;

    let fetcher = HttpFetcher::new();
    let nodes = match fetcher.get(&page_url).await {
        Ok(page) => {
            if !page.is_ok() {
                warn!(
                    "Failed to fetch {} - status code: {}",
                    page_url, page.status
                );
            }
            let doc = Html::parse_document(&page.body);
            ArcExtractor {}.extract(&doc)
        }
        Err(e) => {
            warn!("Failed to fetch {} - {}", page_url, e);
            vec![]
        }
    };

    let folders = nodes
        .iter()
        .filter(|n| matches!(n, Node::Folder { .. }))
        .count();
    let bookmarks = nodes.len() - folders;
    info!("Found {} folders and {} bookmarks", folders, bookmarks);

    let icons = (!cli.no_icons).then(|| FaviconResolver::new(HttpFetcher::new()));
    let mut builder = BookmarkBuilder::new(icons);
    for node in nodes {
        match &node {
            Node::Folder { name } => info!("Processing folder: {}", name),
            Node::Bookmark { title, .. } => info!("Processing bookmark: {:?}", title),
        }
        builder.add(node).await;
    }

    let document = builder.finish();
    std::fs::write(&cli.output, document.render())?;
    info!("Finished! Bookmarks saved to {}", cli.output.display());

    Ok(())
}
