use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::WalkBuilder;

const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".context-finder",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "venv",
    "__pycache__",
    ".cache",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg", "pdf", "zip", "tar", "gz", "bz2",
    "xz", "7z", "rar", "exe", "dll", "so", "dylib", "a", "o", "bin", "wasm", "class", "jar",
    "woff", "woff2", "ttf", "eot", "mp3", "mp4", "mov", "avi", "wav", "flac", "db", "sqlite",
    "sqlite3", "lock",
];

/// One file the scanner considered worth chunking, with the metadata the
/// staleness watermark needs.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub mtime_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Extra directory/file names to skip, beyond the built-in denylist and
    /// `.gitignore`.
    pub extra_ignore_patterns: Vec<String>,
    pub max_file_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extra_ignore_patterns: Vec::new(),
            max_file_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Walks a project root honoring `.gitignore`, never following symlinks,
/// skipping known binary extensions and oversized files.
pub struct FileScanner {
    root: PathBuf,
    config: ScanConfig,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_config(root, ScanConfig::default())
    }

    pub fn with_config(root: impl AsRef<Path>, config: ScanConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn scan(&self) -> Vec<ScannedFile> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .follow_links(false)
            .parents(true);

        let mut overrides = ignore::overrides::OverrideBuilder::new(&self.root);
        for dir in DEFAULT_IGNORE_DIRS {
            let _ = overrides.add(&format!("!{dir}"));
            let _ = overrides.add(&format!("!**/{dir}"));
        }
        for pattern in &self.config.extra_ignore_patterns {
            let _ = overrides.add(&format!("!{pattern}"));
        }
        if let Ok(built) = overrides.build() {
            builder.overrides(built);
        }

        let mut out = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            if is_binary_extension(path) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let size_bytes = metadata.len();
            if size_bytes > self.config.max_file_bytes {
                continue;
            }
            let mtime_ms = metadata
                .modified()
                .ok()
                .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            out.push(ScannedFile {
                path: path.to_path_buf(),
                size_bytes,
                mtime_ms,
            });
        }
        out
    }
}

fn is_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scan_skips_ignored_dirs_and_binaries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("logo.png"), [0u8, 1, 2]).unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/artifact.rs"), "junk").unwrap();

        let files = FileScanner::new(dir.path()).scan();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert!(names.contains(&"main.rs".to_string()));
        assert!(!names.contains(&"logo.png".to_string()));
        assert!(!names.contains(&"artifact.rs".to_string()));
    }

    #[test]
    fn scan_respects_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "ignored.rs\n").unwrap();
        fs::write(dir.path().join("ignored.rs"), "fn x() {}").unwrap();
        fs::write(dir.path().join("kept.rs"), "fn y() {}").unwrap();

        let files = FileScanner::new(dir.path()).scan();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert!(names.contains(&"kept.rs".to_string()));
        assert!(!names.contains(&"ignored.rs".to_string()));
    }

    #[test]
    fn scan_skips_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig {
            max_file_bytes: 4,
            ..ScanConfig::default()
        };
        fs::write(dir.path().join("big.rs"), "way too large").unwrap();
        let files = FileScanner::with_config(dir.path(), config).scan();
        assert!(files.is_empty());
    }
}
