use scraper::Html;

pub mod arc;
pub mod builder;
pub mod favicon;
pub mod fetch;

mod error;

pub use error::ExportError;

/// One element of the flat sequence scraped off the shared-folder page,
/// in on-page document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Folder {
        name: String,
    },
    Bookmark {
        title: String,
        url: String,
        inline_icon: Option<String>,
    },
}

/// Strategy for turning a fetched page into the ordered node sequence.
///
/// The selectors behind this are coupled to an external, unversioned page
/// structure and will break eventually; swapping the implementation must
/// not touch the builder or the favicon resolver.
pub trait Extractor {
    fn extract(&self, doc: &Html) -> Vec<Node>;
}
