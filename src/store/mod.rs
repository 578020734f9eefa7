//! Storage: object store seam, path composition, and batch upload.

pub mod local;
pub mod memory;

use std::collections::HashSet;

use crate::classify::ApprovedBatch;
use crate::config::DuplicatePolicy;
use crate::error::Result;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// Maximum length of a stored file name.
const MAX_FILE_NAME_LEN: usize = 150;

/// A bucket-like destination for attachment objects.
pub trait ObjectStore {
    /// Write `contents` at `path`, recording `content_type` on the object.
    /// An existing object at `path` is replaced.
    fn put(&self, path: &str, contents: &[u8], content_type: &str) -> Result<()>;
}

/// Upload every attachment of an approved batch under
/// `{prefix}/{timestamp}/{file_name}` and return the written paths.
pub fn upload_batch(
    store: &dyn ObjectStore,
    prefix: &str,
    timestamp: i64,
    batch: &ApprovedBatch,
    duplicates: DuplicatePolicy,
) -> Result<Vec<String>> {
    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(batch.len());

    for attachment in batch.attachments() {
        let mut file_name = sanitize_file_name(&attachment.file_name);
        if duplicates == DuplicatePolicy::Rename {
            file_name = unique_name(&file_name, &used);
        }
        used.insert(file_name.clone());

        let path = object_path(prefix, timestamp, &file_name);
        store.put(&path, &attachment.contents, &attachment.content_type)?;

        tracing::info!(
            path = %path,
            content_type = %attachment.content_type,
            size = %humansize::format_size(attachment.size(), humansize::BINARY),
            "Stored attachment"
        );
        written.push(path);
    }

    Ok(written)
}

/// `{prefix}/{timestamp}/{file_name}` with surrounding slashes of the prefix
/// removed.
pub fn object_path(prefix: &str, timestamp: i64, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{timestamp}/{file_name}")
    } else {
        format!("{prefix}/{timestamp}/{file_name}")
    }
}

/// Reduce a client-supplied file name to a single safe path component.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._@-]`
/// become `_`, and names made only of dots become `unknown`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '@') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// If `name` is already used, append a counter to its stem.
fn unique_name(name: &str, used: &HashSet<String>) -> String {
    if !used.contains(name) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };

    (1..)
        .map(|i| format!("{stem}_{i}{ext}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| format!("{stem}_dup{ext}"))
}
