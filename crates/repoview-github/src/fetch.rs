use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use repoview_core::tree::PathEntry;

use crate::model::{self, RepoLocator};
use crate::preview::{self, PreviewData};

/// Command sent from the UI thread to the fetcher thread.
#[derive(Debug)]
pub enum FetchCmd {
    /// Fetch the whole-tree listing.
    Listing,
    /// Fetch one file's raw content for the preview pane.
    Preview { path: String, name: String },
}

/// Error from a failed fetch. Plain message only — both failure kinds are
/// rendered inline in their panel and never retried.
#[derive(Debug, Clone)]
pub struct FetchError {
    pub message: String,
}

/// Result received from the fetcher thread.
#[derive(Debug)]
pub enum FetchOutcome {
    Listing(Result<Vec<PathEntry>, FetchError>),
    Preview(Result<PreviewData, FetchError>),
}

/// Sender/Receiver pair for communicating with the fetcher thread.
///
/// Requests are fire-and-forget: a preview request does not cancel an
/// earlier in-flight one, so the last response to arrive wins the pane.
pub struct Fetcher {
    sender: mpsc::Sender<FetchCmd>,
    receiver: mpsc::Receiver<FetchOutcome>,
}

impl Fetcher {
    /// Spawn the background fetcher thread with a tokio runtime.
    pub fn spawn(locator: RepoLocator) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<FetchCmd>();
        let (result_tx, result_rx) = mpsc::channel::<FetchOutcome>();

        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime");

            rt.block_on(async move {
                let client = match reqwest::Client::builder()
                    .user_agent(concat!("repoview/", env!("CARGO_PKG_VERSION")))
                    .build()
                {
                    Ok(client) => client,
                    Err(e) => {
                        warn!("failed to build HTTP client: {e}");
                        return;
                    }
                };

                while let Ok(cmd) = cmd_rx.recv() {
                    let outcome = match cmd {
                        FetchCmd::Listing => {
                            FetchOutcome::Listing(fetch_listing(&client, &locator).await)
                        }
                        FetchCmd::Preview { path, name } => {
                            FetchOutcome::Preview(fetch_preview(&client, &locator, path, name).await)
                        }
                    };
                    if result_tx.send(outcome).is_err() {
                        break; // Main thread dropped the receiver
                    }
                }
            });
        });

        Self {
            sender: cmd_tx,
            receiver: result_rx,
        }
    }

    /// Send a fetch command (non-blocking).
    pub fn request(&self, cmd: FetchCmd) {
        let _ = self.sender.send(cmd);
    }

    /// Try to receive an outcome (non-blocking).
    pub fn try_recv(&self) -> Option<FetchOutcome> {
        self.receiver.try_recv().ok()
    }
}

/// Fetch and parse the recursive-tree listing.
async fn fetch_listing(
    client: &reqwest::Client,
    locator: &RepoLocator,
) -> Result<Vec<PathEntry>, FetchError> {
    let url = locator.listing_url();
    debug!(%url, "fetching repository listing");

    let response = client.get(&url).send().await.map_err(|e| FetchError {
        message: format!("{e}"),
    })?;

    if !response.status().is_success() {
        return Err(FetchError {
            message: format!("GitHub API error: {}", response.status().as_u16()),
        });
    }

    let body = response.text().await.map_err(|e| FetchError {
        message: format!("Failed to read listing body: {e}"),
    })?;

    model::parse_listing(&body).map_err(|e| FetchError {
        message: format!("{e}"),
    })
}

/// Fetch one file's raw content and classify it for the preview pane.
async fn fetch_preview(
    client: &reqwest::Client,
    locator: &RepoLocator,
    path: String,
    name: String,
) -> Result<PreviewData, FetchError> {
    let raw_url = locator.raw_url(&path);
    debug!(%raw_url, "fetching file preview");

    let response = client.get(&raw_url).send().await.map_err(|e| FetchError {
        message: format!("{e}"),
    })?;

    if !response.status().is_success() {
        return Err(FetchError {
            message: format!("Failed to fetch file: {}", response.status().as_u16()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let size_bytes = response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let last_modified = response
        .headers()
        .get(reqwest::header::LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(preview::format_last_modified);

    let bytes = response.bytes().await.map_err(|e| FetchError {
        message: format!("Failed to read file body: {e}"),
    })?;

    // The content-length header is sometimes absent; fall back to the
    // body length.
    let size_bytes = size_bytes.or(Some(bytes.len() as u64));

    let content = preview::classify_content(content_type.as_deref(), &bytes)
        .map_err(|e| FetchError {
            message: format!("{e}"),
        })?;

    Ok(PreviewData {
        name,
        path,
        raw_url,
        size_bytes,
        last_modified,
        content,
    })
}
