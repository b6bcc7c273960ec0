// Drive API types

use serde::Deserialize;

/// Drive v3 REST root
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Folders that are not in the trash
pub const DEFAULT_FOLDER_QUERY: &str =
    "mimeType='application/vnd.google-apps.folder' and trashed=false";

/// Field projection requested for every page
pub const FOLDER_FIELDS: &str = "nextPageToken, files(id, name, createdTime, modifiedTime, parents)";

/// Page size used by the Drive web client and by default here
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page size the Drive API accepts
pub const MAX_PAGE_SIZE: u32 = 1000;

/// One folder as returned by `files.list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

/// One `files.list` response page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<FolderRecord>,
    pub next_page_token: Option<String>,
}

impl FilePage {
    /// Continuation token; empty tokens count as absent
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Parameters of a listing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Drive search expression (`q`)
    pub filter: String,
    pub page_size: u32,
    /// Resume from this token instead of the first page
    pub start_page_token: Option<String>,
}

impl ListQuery {
    pub fn new(filter: impl Into<String>, page_size: u32) -> Self {
        Self {
            filter: filter.into(),
            page_size,
            start_page_token: None,
        }
    }

    pub fn with_start_page_token(mut self, token: Option<String>) -> Self {
        self.start_page_token = token.filter(|t| !t.is_empty());
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDER_QUERY, DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_parsing() {
        let page: FilePage = serde_json::from_str(
            r#"{
                "nextPageToken": "T2",
                "files": [
                    {"id": "1a", "name": "Projects", "createdTime": "2024-03-01T10:00:00.000Z",
                     "modifiedTime": "2024-03-02T11:00:00.000Z", "parents": ["0root"]},
                    {"id": "1b", "name": "Shared"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.continuation(), Some("T2"));
        assert_eq!(page.files.len(), 2);
        assert_eq!(page.files[0].parents, vec!["0root".to_string()]);
        assert_eq!(
            page.files[0].created_time.as_deref(),
            Some("2024-03-01T10:00:00.000Z")
        );
        assert!(page.files[1].parents.is_empty());
        assert!(page.files[1].modified_time.is_none());
    }

    #[test]
    fn test_empty_page() {
        let page: FilePage = serde_json::from_str("{}").unwrap();
        assert!(page.files.is_empty());
        assert_eq!(page.continuation(), None);
    }

    #[test]
    fn test_empty_token_is_absent() {
        let page = FilePage {
            files: vec![],
            next_page_token: Some(String::new()),
        };
        assert_eq!(page.continuation(), None);
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.filter, DEFAULT_FOLDER_QUERY);
        assert_eq!(query.page_size, 100);
        assert_eq!(query.start_page_token, None);

        let query = ListQuery::default().with_start_page_token(Some(String::new()));
        assert_eq!(query.start_page_token, None);
    }
}
