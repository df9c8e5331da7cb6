//! Image resolver — matches a case's fluoroscopy and CT images on disk.
//!
//! A case's image field looks like `KEY_rest`; every file in the image
//! directory whose name contains `KEY` and ends in an allowed extension
//! belongs to that case. The directory is re-read on each resolution.

use std::io;
use std::path::Path;

use serde::Serialize;

use crate::cases::CaseRecord;

pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".png", ".jpeg"];

/// Fluoroscopy and CT file names for one case, each sorted lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageSet {
    pub fluoro: Vec<String>,
    pub ct: Vec<String>,
}

/// Text before the first underscore, untrimmed. `None` when that text is empty.
#[must_use]
pub fn key_prefix(field: &str) -> Option<&str> {
    field.split('_').next().filter(|k| !k.is_empty())
}

fn has_image_extension(name: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Image files in `dir` whose names contain `key`, sorted.
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be listed.
pub fn list_matching(dir: &Path, key: &str) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.contains(key) && has_image_extension(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Files for one image field. A missing key or unreadable directory yields no images.
fn resolve_field(dir: &Path, field: &str, modality: &'static str) -> Vec<String> {
    let Some(key) = key_prefix(field) else {
        return Vec::new();
    };
    match list_matching(dir, key) {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!(error = %e, dir = %dir.display(), %key, modality, "image directory read failed");
            Vec::new()
        }
    }
}

/// Resolve both image lists for `record`, independently.
#[must_use]
pub fn resolve_case(dir: &Path, record: &CaseRecord) -> ImageSet {
    let set = ImageSet {
        fluoro: resolve_field(dir, &record.image, "fluoro"),
        ct: resolve_field(dir, &record.image_ct, "ct"),
    };
    if set.ct.is_empty() {
        tracing::info!(diagnosis = %record.diagnosis, "no matched CT images");
    }
    set
}

#[cfg(test)]
#[path = "images_test.rs"]
mod tests;
