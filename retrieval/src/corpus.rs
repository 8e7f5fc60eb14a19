//! Corpus download and chunking.

use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use crate::document::Document;
use crate::error::{Result, RetrievalError};

/// Download `url` into `path` unless `path` already exists.
///
/// Returns `true` when a download happened. Any transport failure or
/// non-success status is a [`RetrievalError::Fetch`]; nothing is written in
/// that case.
pub async fn fetch_if_missing(client: &reqwest::Client, url: &str, path: &Path) -> Result<bool> {
    if fs::try_exists(path).await? {
        debug!("Corpus already present at {}", path.display());
        return Ok(false);
    }

    info!("Downloading corpus from {url}");

    let fetch_error = |reason: String| RetrievalError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("status {status}")));
    }

    let text = response
        .text()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, &text).await?;

    info!("Saved {} bytes of corpus to {}", text.len(), path.display());
    Ok(true)
}

/// Split corpus text immediately before every line starting with `marker`.
///
/// Each section keeps its text verbatim, including the newline that
/// preceded the heading. Whitespace-only sections are dropped.
pub fn split_sections<'a>(text: &'a str, marker: &str) -> Vec<&'a str> {
    let boundary = format!("\n{marker}");
    let mut sections = Vec::new();
    let mut start = 0;

    for (position, _) in text.match_indices(&boundary) {
        sections.push(&text[start..position]);
        start = position;
    }
    sections.push(&text[start..]);

    sections
        .into_iter()
        .filter(|section| !section.trim().is_empty())
        .collect()
}

/// Turn corpus text into documents, recording chunk position and source.
pub fn documents_from_text(text: &str, marker: &str, source: &str) -> Vec<Document> {
    split_sections(text, marker)
        .into_iter()
        .enumerate()
        .map(|(chunk, content)| {
            Document::new(content)
                .with_metadata("chunk", chunk)
                .with_metadata("source", source)
        })
        .collect()
}
