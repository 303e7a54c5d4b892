//! File discovery for finding images in a folder.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::InputConfig;

/// Discovers image files by extension.
pub struct FileDiscovery {
    supported_formats: Vec<String>,
    recursive: bool,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            supported_formats: config
                .supported_formats
                .iter()
                .map(|f| f.to_lowercase())
                .collect(),
            recursive: config.recursive,
        }
    }

    /// Discover all supported image files at a path.
    ///
    /// A file path is returned as is when supported. A directory is scanned one
    /// level deep unless discovery is recursive. Unreadable entries are skipped.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            if self.is_supported(path) {
                if let Ok(meta) = std::fs::metadata(path) {
                    return vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                    }];
                }
            }
            return vec![];
        }

        let walker = WalkDir::new(path).follow_links(true);
        let walker = if self.recursive {
            walker
        } else {
            walker.max_depth(1)
        };

        let mut files: Vec<DiscoveredFile> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported(e.path()))
            .filter_map(|e| {
                e.metadata().ok().map(|meta| DiscoveredFile {
                    path: e.path().to_path_buf(),
                    size: meta.len(),
                })
            })
            .collect();

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension (case-insensitive).
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.supported_formats.iter().any(|fmt| *fmt == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
