use crate::{Extractor, Node};
use lazy_regex::regex;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

const E: &str = "Invalid selector";
lazy_static! {
    // FIXME: styled-component class names, 100% this breaks on the next
    // arc.net deploy. Swap the Extractor impl when it does.
    static ref FOLDER_ITEMS: Selector = Selector::parse(".PJLV.PJLV-iieNCbK-css").expect(E);
    static ref IMG: Selector = Selector::parse("img").expect(E);
}

/// Trailing marker arc.net appends to bookmark titles.
const EXTERNAL_LINK_ARROW: char = '\u{2197}';

/// Extracts the flat folder/bookmark sequence from a shared arc.net folder
/// page. `div` elements are folder markers, `a` elements are bookmarks;
/// anything else matched by the selector is logged and skipped.
#[derive(Debug)]
pub struct ArcExtractor {}

impl Extractor for ArcExtractor {
    fn extract(&self, doc: &Html) -> Vec<Node> {
        let mut nodes = vec![];
        for el in doc.select(&FOLDER_ITEMS) {
            match el.value().name() {
                "div" => nodes.push(Node::Folder {
                    name: element_text(&el),
                }),
                "a" => {
                    let Some(url) = el.value().attr("href") else {
                        warn!("Bookmark without href, skipped: {}", element_text(&el));
                        continue;
                    };
                    nodes.push(Node::Bookmark {
                        title: element_text(&el)
                            .replace(EXTERNAL_LINK_ARROW, "")
                            .trim()
                            .to_string(),
                        url: url.to_string(),
                        inline_icon: inline_icon(&el),
                    });
                }
                other => warn!("Unknown element: <{}>", other),
            }
        }
        nodes
    }
}

fn element_text(el: &ElementRef) -> String {
    let text: String = el.text().collect();
    regex!(r"\s+").replace_all(&text, " ").trim().to_string()
}

fn inline_icon(el: &ElementRef) -> Option<String> {
    el.select(&IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(ToString::to_string)
}
