// Console rendering of folder records

use std::io::{self, Write};

use super::types::FolderRecord;

/// Width of the separator rule
pub const RULE_WIDTH: usize = 80;

/// Writes one block per folder as records stream in, then a total
pub struct FolderPrinter<W: Write> {
    out: W,
    count: usize,
}

impl<W: Write> FolderPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }

    pub fn print(&mut self, folder: &FolderRecord) -> io::Result<()> {
        if self.count == 0 {
            writeln!(self.out, "\nFolders in Google Drive:\n")?;
            writeln!(self.out, "{}", rule())?;
        }

        writeln!(self.out, "Name: {}", folder.name)?;
        writeln!(self.out, "ID: {}", folder.id)?;
        writeln!(
            self.out,
            "Created: {}",
            folder.created_time.as_deref().unwrap_or("N/A")
        )?;
        writeln!(
            self.out,
            "Modified: {}",
            folder.modified_time.as_deref().unwrap_or("N/A")
        )?;
        if let Some(parent) = folder.parents.first() {
            writeln!(self.out, "Parent Folder ID: {}", parent)?;
        }
        writeln!(self.out, "{}", rule())?;

        self.count += 1;
        Ok(())
    }

    /// Write the closing line and return how many folders were printed
    pub fn finish(mut self) -> io::Result<usize> {
        if self.count == 0 {
            writeln!(self.out, "No folders found in Google Drive.")?;
        } else {
            writeln!(self.out, "\nTotal folders: {}", self.count)?;
        }
        self.out.flush()?;
        Ok(self.count)
    }
}

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, parents: &[&str]) -> FolderRecord {
        FolderRecord {
            id: id.to_string(),
            name: format!("Folder {}", id),
            created_time: Some("2024-01-01T00:00:00.000Z".to_string()),
            modified_time: None,
            parents: parents.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_blocks_and_total() {
        let mut buf = Vec::new();
        let mut printer = FolderPrinter::new(&mut buf);
        printer.print(&folder("a1", &["root", "other"])).unwrap();
        printer.print(&folder("b2", &[])).unwrap();
        assert_eq!(printer.finish().unwrap(), 2);

        let text = String::from_utf8(buf).unwrap();
        let rule = "-".repeat(80);
        assert_eq!(text.matches(&rule).count(), 3);
        assert!(text.contains("Name: Folder a1\nID: a1\nCreated: 2024-01-01T00:00:00.000Z\nModified: N/A\nParent Folder ID: root\n"));
        assert!(!text.contains("Parent Folder ID: other"));
        assert!(text.contains("ID: b2\nCreated: 2024-01-01T00:00:00.000Z\nModified: N/A\n----"));
        assert!(text.ends_with("\nTotal folders: 2\n"));
    }

    #[test]
    fn test_no_folders() {
        let mut buf = Vec::new();
        let printer = FolderPrinter::new(&mut buf);
        assert_eq!(printer.finish().unwrap(), 0);
        assert_eq!(String::from_utf8(buf).unwrap(), "No folders found in Google Drive.\n");
    }
}
