use crate::favicon::FaviconResolver;
use crate::fetch::Fetcher;
use crate::Node;
use std::fmt::Write;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BookmarkDocument {
    pub folders: Vec<Folder>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Folder {
    /// Empty for the implicit root folder that collects bookmarks seen
    /// before any folder marker; rendered without a heading.
    pub name: String,
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    pub icon: String,
}

impl BookmarkDocument {
    /// Serializes to the Netscape bookmark format browsers import. Each
    /// folder is a `<dt><h3>` heading with a sibling `<dl>` of entries.
    /// Deterministic: the same document always renders byte-identical.
    pub fn render(&self) -> String {
        let mut out = String::from(
            "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n\
             <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">\n\
             <title>Bookmarks</title>\n\
             <h1>Bookmarks</h1>\n\
             <dl>\n",
        );
        for folder in &self.folders {
            if !folder.name.is_empty() {
                let _ = writeln!(out, "  <dt><h3>{}</h3></dt>", escape(&folder.name));
            }
            out.push_str("  <dl>\n");
            for bookmark in &folder.bookmarks {
                let _ = writeln!(
                    out,
                    "    <dt><a href=\"{}\" icon_uri=\"{}\">{}</a></dt>",
                    escape(&bookmark.url),
                    escape(&bookmark.icon),
                    escape(&bookmark.title)
                );
            }
            out.push_str("  </dl>\n");
        }
        out.push_str("</dl>\n");
        out
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Turns the flat node sequence into folder sections. Folders are emitted
/// as flat siblings in first-seen order; a folder marker repeating
/// immediately is ignored, but a non-adjacent repeat opens a second
/// section with the same name (matching the source page, not merged).
pub struct BookmarkBuilder<F> {
    document: BookmarkDocument,
    current: Option<String>,
    icons: Option<FaviconResolver<F>>,
}

impl<F: Fetcher> BookmarkBuilder<F> {
    /// `icons: None` disables favicon lookups; bookmarks without an inline
    /// icon get an empty icon attribute.
    pub fn new(icons: Option<FaviconResolver<F>>) -> Self {
        Self {
            document: BookmarkDocument::default(),
            current: None,
            icons,
        }
    }

    pub async fn add(&mut self, node: Node) {
        match node {
            Node::Folder { name } => self.add_folder(&name),
            Node::Bookmark {
                title,
                url,
                inline_icon,
            } => self.add_bookmark(&title, &url, inline_icon.as_deref()).await,
        }
    }

    pub fn add_folder(&mut self, name: &str) {
        if self.current.as_deref() == Some(name) {
            return;
        }
        self.current = Some(name.to_string());
        self.document.folders.push(Folder {
            name: name.to_string(),
            bookmarks: vec![],
        });
    }

    /// Icon priority: inline icon from the page, else empty when lookups
    /// are disabled, else the resolver's answer.
    pub async fn add_bookmark(&mut self, title: &str, url: &str, inline_icon: Option<&str>) {
        let icon = match inline_icon {
            Some(inline) if !inline.is_empty() => inline.to_string(),
            _ => match self.icons.as_mut() {
                Some(resolver) => resolver.resolve(url).await,
                None => String::new(),
            },
        };

        if self.document.folders.is_empty() {
            self.document.folders.push(Folder {
                name: String::new(),
                bookmarks: vec![],
            });
        }
        let folder = self
            .document
            .folders
            .last_mut()
            .expect("at least one folder");
        folder.bookmarks.push(Bookmark {
            title: title.to_string(),
            url: url.to_string(),
            icon,
        });
    }

    pub fn finish(self) -> BookmarkDocument {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use lazy_static::lazy_static;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};

    fn builder() -> BookmarkBuilder<HttpFetcher> {
        BookmarkBuilder::new(None)
    }

    #[tokio::test]
    async fn bookmarks_land_under_most_recently_opened_folder() {
        let mut b = builder();
        b.add_folder("A");
        b.add_bookmark("T1", "http://x.test/1", None).await;
        b.add_bookmark("T2", "http://x.test/2", None).await;
        b.add_folder("B");
        b.add_bookmark("T3", "http://x.test/3", None).await;
        let doc = b.finish();

        assert_eq!(doc.folders.len(), 2);
        assert_eq!(doc.folders[0].name, "A");
        assert_eq!(doc.folders[0].bookmarks.len(), 2);
        assert_eq!(doc.folders[1].name, "B");
        assert_eq!(doc.folders[1].bookmarks.len(), 1);
        assert_eq!(doc.folders[1].bookmarks[0].title, "T3");
    }

    #[tokio::test]
    async fn consecutive_duplicate_folder_is_a_noop() {
        let mut b = builder();
        b.add_folder("X");
        b.add_folder("X");
        b.add_bookmark("T", "http://x.test/", None).await;
        let doc = b.finish();

        assert_eq!(doc.folders.len(), 1);
        assert_eq!(doc.folders[0].bookmarks.len(), 1);
    }

    #[test]
    fn non_adjacent_duplicate_folders_are_not_merged() {
        let mut b = builder();
        b.add_folder("X");
        b.add_folder("Y");
        b.add_folder("X");
        let doc = b.finish();

        let names: Vec<&str> = doc.folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y", "X"]);
    }

    #[tokio::test]
    async fn bookmark_before_any_folder_goes_to_implicit_root() {
        let mut b = builder();
        b.add_bookmark("T", "http://x.test/", None).await;
        b.add_folder("A");
        b.add_bookmark("T2", "http://x.test/2", None).await;
        let doc = b.finish();

        assert_eq!(doc.folders.len(), 2);
        assert_eq!(doc.folders[0].name, "");
        assert_eq!(doc.folders[0].bookmarks[0].title, "T");
        assert_eq!(doc.folders[1].bookmarks[0].title, "T2");
    }

    #[tokio::test]
    async fn inline_icon_wins_over_disabled_lookup() {
        let mut b = builder();
        b.add_folder("A");
        b.add_bookmark("T", "http://x.test/", Some("http://x.test/inline.png"))
            .await;
        b.add_bookmark("T2", "http://x.test/2", Some("")).await;
        let doc = b.finish();

        assert_eq!(doc.folders[0].bookmarks[0].icon, "http://x.test/inline.png");
        assert_eq!(doc.folders[0].bookmarks[1].icon, "");
    }

    #[tokio::test]
    async fn node_sequence_with_icons_disabled() {
        let nodes = vec![
            Node::Folder {
                name: "A".to_string(),
            },
            Node::Bookmark {
                title: "T1".to_string(),
                url: "http://x.test/1".to_string(),
                inline_icon: None,
            },
            Node::Folder {
                name: "B".to_string(),
            },
            Node::Bookmark {
                title: "T2".to_string(),
                url: "http://x.test/2".to_string(),
                inline_icon: None,
            },
        ];

        let mut b = builder();
        for node in nodes {
            b.add(node).await;
        }
        let doc = b.finish();

        assert_eq!(
            doc,
            BookmarkDocument {
                folders: vec![
                    Folder {
                        name: "A".to_string(),
                        bookmarks: vec![Bookmark {
                            title: "T1".to_string(),
                            url: "http://x.test/1".to_string(),
                            icon: String::new(),
                        }],
                    },
                    Folder {
                        name: "B".to_string(),
                        bookmarks: vec![Bookmark {
                            title: "T2".to_string(),
                            url: "http://x.test/2".to_string(),
                            icon: String::new(),
                        }],
                    },
                ],
            }
        );
    }

    #[tokio::test]
    async fn render_is_deterministic_and_escapes() {
        let mut b = builder();
        b.add_folder("R&D <stuff>");
        b.add_bookmark("Q\"A\"", "http://x.test/?a=1&b=2", None).await;
        let doc = b.finish();

        let rendered = doc.render();
        assert_eq!(rendered, doc.render());
        assert!(rendered.starts_with("<!DOCTYPE NETSCAPE-Bookmark-file-1>\n"));
        assert!(rendered.contains("<dt><h3>R&amp;D &lt;stuff&gt;</h3></dt>"));
        assert!(rendered
            .contains(r#"<dt><a href="http://x.test/?a=1&amp;b=2" icon_uri="">Q&quot;A&quot;</a></dt>"#));
    }

    lazy_static! {
        static ref HEADINGS_AND_ANCHORS: Selector = Selector::parse("h3, a").expect("selector");
    }

    #[tokio::test]
    async fn rendered_document_reparses_to_the_same_structure() {
        let mut b = builder();
        b.add_folder("A");
        b.add_bookmark("T1", "http://x.test/1", None).await;
        b.add_bookmark("T2", "http://x.test/2", None).await;
        b.add_folder("B");
        b.add_bookmark("T3", "http://y.test/", None).await;
        let doc = b.finish();

        let reparsed = Html::parse_document(&doc.render());
        let mut recovered = vec![];
        for el in reparsed.select(&HEADINGS_AND_ANCHORS) {
            let text: String = el.text().collect();
            match el.value().name() {
                "h3" => recovered.push(format!("folder:{text}")),
                "a" => recovered.push(format!(
                    "bookmark:{text}:{}",
                    el.value().attr("href").unwrap_or_default()
                )),
                other => panic!("unexpected element {other}"),
            }
        }

        assert_eq!(
            recovered,
            vec![
                "folder:A",
                "bookmark:T1:http://x.test/1",
                "bookmark:T2:http://x.test/2",
                "folder:B",
                "bookmark:T3:http://y.test/",
            ]
        );
    }
}
