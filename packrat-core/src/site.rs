//! Ledger → static index page.
//!
//! Rebuilds a hierarchical listing from all ledger entries — grouped by
//! uploader, then nested along the forward-slash path segments — and renders
//! it with [maud](https://maud.lambda.xyz/) into a single static HTML file.
//! Folders become nested lists, files become download links pointing at
//! `<base>/<item_id>/<relative_path>`. An empty ledger renders nothing, so an
//! existing page is never overwritten with an empty one.

use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::contract::{StateStore, StoreError};
use crate::ledger::LedgerEntry;

const STYLE: &str = "\
body { font-family: sans-serif; line-height: 1.6; }
.folder { color: #2c3e50; }
.file { color: #34495e; }
ul { list-style: none; padding-left: 20px; }
li { margin: 5px 0; }
a { color: #2980b9; text-decoration: none; }
a:hover { text-decoration: underline; }
";

/// One node of the listing: a folder of further nodes, or a file with its
/// download URL.
#[derive(Debug, PartialEq, Eq)]
pub enum Node {
    Dir(BTreeMap<String, Node>),
    File(String),
}

#[derive(Debug)]
pub enum SiteError {
    Io(std::io::Error),
    State(StoreError),
}

impl From<std::io::Error> for SiteError {
    fn from(e: std::io::Error) -> Self {
        SiteError::Io(e)
    }
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteError::Io(e) => write!(f, "site I/O error: {e}"),
            SiteError::State(e) => write!(f, "site state error: {e}"),
        }
    }
}

impl std::error::Error for SiteError {}

/// Group entries by uploader and nest each uploader's files along their path
/// segments. Leaves carry the full download URL.
pub fn build_tree(entries: &[LedgerEntry], base_url: &str) -> BTreeMap<String, Node> {
    let base = base_url.trim_end_matches('/');
    let mut tree: BTreeMap<String, Node> = BTreeMap::new();
    for entry in entries {
        let url = format!("{}/{}/{}", base, entry.item_id, entry.relative_path);
        let segments: Vec<&str> = entry.relative_path.split('/').collect();
        let uploader_root = tree
            .entry(entry.uploader.clone())
            .or_insert_with(|| Node::Dir(BTreeMap::new()));
        if let Node::Dir(nodes) = uploader_root {
            insert_path(nodes, &segments, url);
        }
    }
    tree
}

fn insert_path(nodes: &mut BTreeMap<String, Node>, segments: &[&str], url: String) {
    match segments {
        [] => {}
        [leaf] => {
            nodes.insert((*leaf).to_string(), Node::File(url));
        }
        [folder, rest @ ..] => {
            let child = nodes
                .entry((*folder).to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            if let Node::Dir(children) = child {
                insert_path(children, rest, url);
            }
        }
    }
}

/// Render the full index page, or `None` when the ledger has no entries.
pub fn render(entries: &[LedgerEntry], base_url: &str) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let tree = build_tree(entries, base_url);
    let markup = html! {
        (DOCTYPE)
        html {
            head {
                title { "Archive Uploads" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { "Archived Files" }
                @for (uploader, node) in &tree {
                    h2 { "Uploader: " (uploader) }
                    @if let Node::Dir(children) = node {
                        ul { (render_nodes(children)) }
                    }
                }
            }
        }
    };
    Some(markup.into_string())
}

fn render_nodes(nodes: &BTreeMap<String, Node>) -> Markup {
    html! {
        @for (name, node) in nodes {
            @match node {
                Node::Dir(children) => {
                    li class="folder" {
                        (name)
                        ul { (render_nodes(children)) }
                    }
                }
                Node::File(url) => {
                    li class="file" {
                        a href=(url) { (name) }
                    }
                }
            }
        }
    }
}

/// Render the ledger to `site_path` and mark the result pending publish.
/// Returns `false` (and touches nothing) when the ledger is empty.
pub fn write_site(
    entries: &[LedgerEntry],
    base_url: &str,
    site_path: &Path,
    state: &dyn StateStore,
) -> Result<bool, SiteError> {
    let Some(page) = render(entries, base_url) else {
        info!("No uploaded files, skipping page render");
        return Ok(false);
    };
    fs::write(site_path, page)?;
    state.set_pending().map_err(SiteError::State)?;
    info!(path = %site_path.display(), entries = entries.len(), "Rendered index page");
    Ok(true)
}
