// Google Drive folder listing

mod display;
mod lister;
mod types;

pub use display::{FolderPrinter, RULE_WIDTH};
pub use lister::DriveClient;
pub use types::{
    FilePage, FolderRecord, ListQuery, DEFAULT_API_BASE_URL, DEFAULT_FOLDER_QUERY,
    DEFAULT_PAGE_SIZE, FOLDER_FIELDS, MAX_PAGE_SIZE,
};
