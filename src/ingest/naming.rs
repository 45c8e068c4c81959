//! Storage name generation for uploads

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Longest extension kept from a client-supplied file name
const MAX_EXTENSION_LEN: usize = 16;

/// Generates `<unix millis>-<sequence>` base names.
///
/// The sequence is shared by every request in the process, so two uploads
/// arriving in the same millisecond still get distinct names.
#[derive(Debug, Default)]
pub struct NameGenerator {
    sequence: AtomicU64,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&self) -> String {
        let millis = Utc::now().timestamp_millis();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", millis, seq)
    }
}

/// Extract the extension (without the dot) from a client-supplied file name.
///
/// Only the final path component is considered, and anything that is not a
/// short ASCII alphanumeric run is dropped, so the result is always safe to
/// splice into a storage path. Returns an empty string when there is none.
pub fn extension_of(original_name: &str) -> String {
    let file_name = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_name);

    match file_name.rfind('.') {
        Some(idx) => {
            let ext = &file_name[idx + 1..];
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
            {
                ext.to_string()
            } else {
                String::new()
            }
        }
        None => String::new(),
    }
}
