use crate::fetch::Fetcher;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};
use url::Url;

const E: &str = "Invalid selector";
lazy_static! {
    static ref ICON_LINK: Selector = Selector::parse(r#"link[rel="icon"]"#).expect(E);
}

/// Best-effort favicon lookup, memoized by origin for the lifetime of one
/// resolver instance (one run). Only verified icon URLs enter the cache;
/// unverified `/favicon.ico` guesses are returned but never cached, so a
/// transient outage on one bookmark cannot poison later same-origin lookups.
pub struct FaviconResolver<F> {
    fetcher: F,
    cache: HashMap<u64, String>,
}

impl<F: Fetcher> FaviconResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
        }
    }

    /// Resolves an icon URL for the bookmark's origin. Never fails: every
    /// network error degrades to the `<origin>/favicon.ico` guess, and a
    /// bookmark URL with no parseable origin resolves to an empty icon.
    pub async fn resolve(&mut self, bookmark_url: &str) -> String {
        let Some(origin) = origin_of(bookmark_url) else {
            warn!("No origin for bookmark url: {}", bookmark_url);
            return String::new();
        };

        let key = origin_key(origin.as_str());
        if let Some(hit) = self.cache.get(&key) {
            debug!("Favicon cache hit for {}", origin);
            return hit.clone();
        }

        let fallback = match origin.join("/favicon.ico") {
            Ok(u) => u.to_string(),
            Err(e) => {
                warn!("Failed to build fallback icon url for {}: {}", origin, e);
                return String::new();
            }
        };

        debug!("Resolving favicon for {}", origin);
        let page = match self.fetcher.get(&origin).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                warn!("Failed to fetch {} - status code: {}", origin, page.status);
                return fallback;
            }
            Err(e) => {
                warn!("Failed to fetch {} - {}", origin, e);
                return fallback;
            }
        };

        let Some(href) = icon_href(&page.body) else {
            return fallback;
        };
        let Ok(icon_url) = origin.join(&href) else {
            warn!("Unresolvable icon href on {}: {}", origin, href);
            return fallback;
        };

        if self.fetch_ok(&icon_url).await {
            return self.remember(key, icon_url.to_string());
        }
        if let Ok(guess) = Url::parse(&fallback) {
            if self.fetch_ok(&guess).await {
                return self.remember(key, fallback);
            }
        }
        fallback
    }

    async fn fetch_ok(&self, url: &Url) -> bool {
        matches!(self.fetcher.get(url).await, Ok(page) if page.is_ok())
    }

    fn remember(&mut self, key: u64, icon_url: String) -> String {
        self.cache.insert(key, icon_url.clone());
        icon_url
    }
}

/// Normalizes a bookmark URL to its origin: scheme + host, path `/`,
/// query and fragment dropped.
fn origin_of(url: &str) -> Option<Url> {
    let mut origin = Url::parse(url).ok()?;
    origin.host_str()?;
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    Some(origin)
}

fn origin_key(origin: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    origin.hash(&mut hasher);
    hasher.finish()
}

fn icon_href(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    doc.select(&ICON_LINK)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(ToString::to_string)
}
