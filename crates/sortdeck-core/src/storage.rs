//! Category folders on disk.
//!
//! Every category gets one folder under the categorized root, named after the
//! sanitized category label. Images are copied (never moved) into it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Characters that are not allowed in folder names on common filesystems.
const RESERVED: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Turn a category label into a folder- and file-safe name.
///
/// Each reserved character becomes `_`; everything else is kept as is.
pub fn sanitize_category_name(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

/// Root folder holding one subfolder per category.
///
/// Remembers which source wrote each destination, so two inputs with the
/// same file name never land on the same bucket file within one store.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    root: PathBuf,
    claimed: HashMap<PathBuf, PathBuf>,
}

impl CategoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            claimed: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder for a category, whether or not it exists yet.
    pub fn bucket_path(&self, category: &str) -> PathBuf {
        self.root.join(sanitize_category_name(category))
    }

    /// Create the category folder if missing and return its path.
    pub fn ensure_bucket(&self, category: &str) -> Result<PathBuf, PipelineError> {
        let path = self.bucket_path(category);
        std::fs::create_dir_all(&path).map_err(|e| PipelineError::BucketUnavailable {
            category: category.to_string(),
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(path)
    }

    /// Copy `source` into `bucket`, keeping its file name where possible.
    ///
    /// Files left by earlier runs are overwritten. If another source already
    /// took the name through this store, the copy gets a `-1`, `-2`, ...
    /// suffix before the extension.
    pub fn copy_into(&mut self, bucket: &Path, source: &Path) -> Result<PathBuf, PipelineError> {
        let file_name = source.file_name().ok_or_else(|| PipelineError::Storage {
            path: source.to_path_buf(),
            message: "source has no file name".to_string(),
        })?;
        let dest = self.destination_for(bucket, Path::new(file_name), source);
        std::fs::copy(source, &dest).map_err(|e| PipelineError::Storage {
            path: source.to_path_buf(),
            message: format!("copy to {:?} failed: {e}", dest),
        })?;
        if dest.file_name() != Some(file_name) {
            tracing::info!("{:?} renamed to {:?} to avoid a name clash", source, dest);
        }
        self.claimed.insert(dest.clone(), source.to_path_buf());
        Ok(dest)
    }

    fn destination_for(&self, bucket: &Path, file_name: &Path, source: &Path) -> PathBuf {
        let free = |candidate: &PathBuf| match self.claimed.get(candidate) {
            Some(owner) => owner == source,
            None => true,
        };

        let first = bucket.join(file_name);
        if free(&first) {
            return first;
        }

        let stem = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = file_name.extension().map(|e| e.to_string_lossy().into_owned());
        let mut n = 1usize;
        loop {
            let candidate = match &extension {
                Some(ext) => bucket.join(format!("{stem}-{n}.{ext}")),
                None => bucket.join(format!("{stem}-{n}")),
            };
            if free(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// BLAKE3 hex digest of a file's contents, streamed in 64KB chunks.
pub fn content_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_every_reserved_char() {
        assert_eq!(sanitize_category_name(r#"a\b/c*d?e:f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_keeps_other_characters() {
        assert_eq!(
            sanitize_category_name("Success & Hard Work"),
            "Success & Hard Work"
        );
        assert_eq!(
            sanitize_category_name("Life Lessons / General Motivation"),
            "Life Lessons _ General Motivation"
        );
        assert_eq!(sanitize_category_name("Ünïcode ok"), "Ünïcode ok");
    }

    #[test]
    fn test_ensure_bucket_creates_sanitized_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = CategoryStore::new(dir.path().join("Final_images"));

        let bucket = store.ensure_bucket("Time & Productivity: 24/7").unwrap();
        assert!(bucket.is_dir());
        assert_eq!(
            bucket.file_name().unwrap().to_str().unwrap(),
            "Time & Productivity_ 24_7"
        );

        // Idempotent
        assert_eq!(store.ensure_bucket("Time & Productivity: 24/7").unwrap(), bucket);
    }

    #[test]
    fn test_ensure_bucket_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("not_a_dir");
        std::fs::write(&root, b"x").unwrap();
        let store = CategoryStore::new(&root);

        let err = store.ensure_bucket("Habits").unwrap_err();
        assert!(matches!(err, PipelineError::BucketUnavailable { .. }));
    }

    #[test]
    fn test_copy_into_keeps_name_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("quote.png");
        std::fs::write(&src, b"first").unwrap();

        let mut store = CategoryStore::new(dir.path().join("out"));
        let bucket = store.ensure_bucket("Habits").unwrap();

        let dest = store.copy_into(&bucket, &src).unwrap();
        assert_eq!(dest, bucket.join("quote.png"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"first");

        std::fs::write(&src, b"second").unwrap();
        store.copy_into(&bucket, &src).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"second");
        assert!(src.exists(), "source must be left in place");
    }

    #[test]
    fn test_copy_into_same_name_from_other_folder_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["a", "b", "c"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("quote.png"), sub).unwrap();
        }
        std::fs::write(dir.path().join("README"), b"plain").unwrap();

        let mut store = CategoryStore::new(dir.path().join("out"));
        let bucket = store.ensure_bucket("Habits").unwrap();

        let a = store.copy_into(&bucket, &dir.path().join("a/quote.png")).unwrap();
        let b = store.copy_into(&bucket, &dir.path().join("b/quote.png")).unwrap();
        let c = store.copy_into(&bucket, &dir.path().join("c/quote.png")).unwrap();
        assert_eq!(a, bucket.join("quote.png"));
        assert_eq!(b, bucket.join("quote-1.png"));
        assert_eq!(c, bucket.join("quote-2.png"));
        assert_eq!(std::fs::read(&a).unwrap(), b"a");
        assert_eq!(std::fs::read(&b).unwrap(), b"b");
        assert_eq!(std::fs::read(&c).unwrap(), b"c");

        // Copying the first source again reuses its own name.
        let again = store.copy_into(&bucket, &dir.path().join("a/quote.png")).unwrap();
        assert_eq!(again, a);

        let plain = store.copy_into(&bucket, &dir.path().join("README")).unwrap();
        assert_eq!(plain, bucket.join("README"));
    }

    #[test]
    fn test_copy_into_missing_source_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CategoryStore::new(dir.path());
        let bucket = store.ensure_bucket("Habits").unwrap();

        let err = store
            .copy_into(&bucket, &dir.path().join("gone.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Storage { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_content_hash_matches_blake3() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"hello sortdeck").unwrap();

        assert_eq!(
            content_hash(&path).unwrap(),
            blake3::hash(b"hello sortdeck").to_hex().to_string()
        );
        assert!(content_hash(&dir.path().join("missing")).is_err());
    }
}
