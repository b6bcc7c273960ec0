// Paginated folder listing

use futures::stream::{self, Stream, TryStreamExt};

use super::types::{FilePage, FolderRecord, ListQuery, FOLDER_FIELDS};
use crate::error::{AppError, Result};
use crate::http_client::DriveHttpClient;

/// Where the listing stands between pages
enum Cursor {
    Start(Option<String>),
    Next(String),
    Done,
}

/// Authenticated `files.list` caller
pub struct DriveClient {
    http: DriveHttpClient,
    base_url: String,
    access_token: String,
}

impl DriveClient {
    pub fn new(http: DriveHttpClient, base_url: impl Into<String>, access_token: String) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Fetch a single page
    pub async fn fetch_page(&self, query: &ListQuery, page_token: Option<&str>) -> Result<FilePage> {
        let page_size = query.page_size.to_string();
        let mut params = vec![
            ("q", query.filter.as_str()),
            ("pageSize", page_size.as_str()),
            ("fields", FOLDER_FIELDS),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let request = self
            .http
            .client()
            .get(format!("{}/files", self.base_url))
            .query(&params)
            .bearer_auth(&self.access_token)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build request: {}", e)))?;

        let response = self.http.execute(request).await?;
        let page: FilePage = response.json().await.map_err(|e| {
            AppError::TransportError(format!("Failed to parse file list response: {}", e))
        })?;

        tracing::debug!(
            files = page.files.len(),
            has_more = page.continuation().is_some(),
            "Fetched page"
        );

        Ok(page)
    }

    /// Every record matching `query`, page by page, in API order
    ///
    /// One request per page, issued only when the previous page's records
    /// have been consumed. The first error ends the stream.
    pub fn list_all(&self, query: &ListQuery) -> impl Stream<Item = Result<FolderRecord>> + '_ {
        let query = query.clone();
        let start = Cursor::Start(query.start_page_token.clone());

        stream::try_unfold(start, move |cursor| {
            let query = query.clone();
            async move {
                let token = match cursor {
                    Cursor::Done => return Ok::<_, AppError>(None),
                    Cursor::Start(token) => token,
                    Cursor::Next(token) => Some(token),
                };

                let page = self.fetch_page(&query, token.as_deref()).await?;
                let next = match page.continuation() {
                    Some(t) => Cursor::Next(t.to_string()),
                    None => Cursor::Done,
                };

                Ok(Some((page.files, next)))
            }
        })
        .map_ok(|files| stream::iter(files.into_iter().map(Ok)))
        .try_flatten()
    }
}
