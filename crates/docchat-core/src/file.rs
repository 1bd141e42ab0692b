//! The document the user picked, and the checks it must pass before upload.

use std::path::{Path, PathBuf};

use crate::error::FileError;

/// Size and type restrictions applied when a file is selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLimits {
    pub max_upload_bytes: Option<u64>,
    /// Lowercase extensions without the dot. Empty accepts everything.
    pub accepted_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub kind: FileKind,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn from_path(path: impl AsRef<Path>, limits: &FileLimits) -> Result<Self, FileError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FileError::NotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !limits.accepted_extensions.is_empty() {
            let ext = extension_of(&name).unwrap_or_default();
            if !limits.accepted_extensions.iter().any(|e| *e == ext) {
                return Err(FileError::UnsupportedType(ext));
            }
        }

        let size = metadata.len();
        if let Some(limit) = limits.max_upload_bytes {
            if size > limit {
                return Err(FileError::TooLarge { name, size, limit });
            }
        }

        Ok(Self {
            kind: FileKind::from_name(&name),
            name,
            size,
            path: path.to_path_buf(),
        })
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    pub fn display_size(&self) -> String {
        format_size(self.size)
    }
}

/// Icon category shown next to the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    Text,
    Image,
    Archive,
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        let ext = extension_of(name).unwrap_or_default();
        match ext.as_str() {
            "pdf" => return FileKind::Pdf,
            "doc" | "docx" | "odt" | "rtf" | "pages" => return FileKind::Document,
            "xls" | "xlsx" | "ods" | "csv" | "tsv" | "numbers" => return FileKind::Spreadsheet,
            "ppt" | "pptx" | "odp" | "key" => return FileKind::Presentation,
            _ => {}
        }

        let Some(mime) = mime_guess::from_path(name).first() else {
            return FileKind::Other;
        };
        match (mime.type_().as_str(), mime.subtype().as_str()) {
            ("text", _) => FileKind::Text,
            ("image", _) => FileKind::Image,
            ("application", "zip" | "gzip" | "x-tar" | "x-7z-compressed" | "vnd.rar") => {
                FileKind::Archive
            }
            ("application", "json" | "xml" | "javascript") => FileKind::Text,
            _ => FileKind::Other,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            FileKind::Pdf => "[PDF]",
            FileKind::Document => "[DOC]",
            FileKind::Spreadsheet => "[XLS]",
            FileKind::Presentation => "[PPT]",
            FileKind::Text => "[TXT]",
            FileKind::Image => "[IMG]",
            FileKind::Archive => "[ZIP]",
            FileKind::Other => "[FILE]",
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    // Compare the value as printed, so 1023.96 KB shows as 1.0 MB
    while (value * 10.0).round() / 10.0 >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Turn text pasted into the terminal (which is what a file drop becomes)
/// into a filesystem path.
pub fn normalize_dropped_path(text: &str) -> PathBuf {
    let mut s = text.trim();

    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            s = &s[1..s.len() - 1];
            break;
        }
    }

    let s = s.strip_prefix("file://").unwrap_or(s);

    PathBuf::from(s.replace("\\ ", " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![b'a'; bytes]).unwrap();
        path
    }

    #[test]
    fn selects_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "report.pdf", 2048);

        let file = SelectedFile::from_path(&path, &FileLimits::default()).unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size, 2048);
        assert_eq!(file.kind, FileKind::Pdf);
        assert_eq!(file.mime_type(), "application/pdf");
        assert_eq!(file.display_size(), "2.0 KB");
    }

    #[test]
    fn rejects_missing_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let limits = FileLimits::default();

        assert!(matches!(
            SelectedFile::from_path(dir.path().join("nope.txt"), &limits),
            Err(FileError::NotFound(_))
        ));
        assert!(matches!(
            SelectedFile::from_path(dir.path(), &limits),
            Err(FileError::NotAFile(_))
        ));
    }

    #[test]
    fn enforces_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "big.txt", 100);
        let limits = FileLimits {
            max_upload_bytes: Some(99),
            accepted_extensions: Vec::new(),
        };

        match SelectedFile::from_path(&path, &limits) {
            Err(FileError::TooLarge { size, limit, .. }) => {
                assert_eq!(size, 100);
                assert_eq!(limit, 99);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn enforces_accepted_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let limits = FileLimits {
            max_upload_bytes: None,
            accepted_extensions: vec!["pdf".to_string(), "txt".to_string()],
        };

        let ok = write_file(dir.path(), "Notes.TXT", 1);
        assert!(SelectedFile::from_path(&ok, &limits).is_ok());

        let bad = write_file(dir.path(), "photo.png", 1);
        assert!(matches!(
            SelectedFile::from_path(&bad, &limits),
            Err(FileError::UnsupportedType(ext)) if ext == "png"
        ));
    }

    #[test]
    fn kinds_come_from_extension_and_mime() {
        assert_eq!(FileKind::from_name("a.docx"), FileKind::Document);
        assert_eq!(FileKind::from_name("a.csv"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_name("a.pptx"), FileKind::Presentation);
        assert_eq!(FileKind::from_name("a.md"), FileKind::Text);
        assert_eq!(FileKind::from_name("a.png"), FileKind::Image);
        assert_eq!(FileKind::from_name("a.zip"), FileKind::Archive);
        assert_eq!(FileKind::from_name("no_extension"), FileKind::Other);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(1_048_575), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 - 52), "1023.9 KB");
    }

    #[test]
    fn dropped_paths_are_cleaned_up() {
        assert_eq!(
            normalize_dropped_path("  '/tmp/My Report.pdf'\n"),
            PathBuf::from("/tmp/My Report.pdf")
        );
        assert_eq!(
            normalize_dropped_path("\"/tmp/a.pdf\""),
            PathBuf::from("/tmp/a.pdf")
        );
        assert_eq!(
            normalize_dropped_path("file:///tmp/a.pdf"),
            PathBuf::from("/tmp/a.pdf")
        );
        assert_eq!(
            normalize_dropped_path("/tmp/My\\ Report.pdf"),
            PathBuf::from("/tmp/My Report.pdf")
        );
    }
}
