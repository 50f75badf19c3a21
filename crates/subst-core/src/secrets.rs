//! Secret file discovery and loading
//!
//! Every `*.ejson` file under the root is decrypted through a [`Decryptor`]
//! and its keys are merged under the reserved [`SECRET_NAMESPACE`] key, so
//! templates reach them as `.ejson.<key>` and they can never collide with
//! override values.
//!
//! Decrypted values are never written anywhere and never logged.

use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};

use crate::decrypt::{Decryptor, PUBLIC_KEY_FIELD};
use crate::report::{ResolutionReport, SourceKind};
use crate::values::Values;

/// File name suffix of secret files
pub const SECRET_FILE_SUFFIX: &str = ".ejson";

/// Top-level key holding all decrypted secrets
pub const SECRET_NAMESPACE: &str = "ejson";

/// Find secret files under `root`, sorted by path
///
/// Sorting makes collisions between files deterministic: the file that sorts
/// last wins for a duplicated key.
pub fn find_secret_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(SECRET_FILE_SUFFIX))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Loads decrypted secrets into their namespace
pub struct SecretLoader<'a> {
    decryptor: &'a dyn Decryptor,
}

impl<'a> SecretLoader<'a> {
    pub fn new(decryptor: &'a dyn Decryptor) -> Self {
        Self { decryptor }
    }

    /// Decrypt every secret file under `root`
    ///
    /// Returns a mapping with a single [`SECRET_NAMESPACE`] key when at least
    /// one file contributed, empty values otherwise. Plaintext files are
    /// skipped silently; unreadable or undecryptable files are recorded in
    /// `report`.
    pub fn load(&self, root: &Path, report: &mut ResolutionReport) -> Values {
        let mut namespace: Map<String, JsonValue> = Map::new();
        let mut contributed = false;

        for path in find_secret_files(root) {
            let content = match std::fs::read(&path) {
                Ok(content) => content,
                Err(e) => {
                    report.skip(SourceKind::Secret, &path, e);
                    continue;
                }
            };

            match self.decryptor.is_encrypted(&content) {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    tracing::debug!(path = %path.display(), "not an encrypted ejson file, skipping");
                    continue;
                }
            }

            let decrypted = match self.decryptor.decrypt(&content) {
                Ok(decrypted) => decrypted,
                Err(e) => {
                    report.skip(SourceKind::Secret, &path, e);
                    continue;
                }
            };

            let before = namespace.len();
            merge_secrets(&mut namespace, decrypted);
            contributed = true;
            tracing::debug!(
                path = %path.display(),
                new_keys = namespace.len() - before,
                "loaded secrets"
            );
        }

        let mut values = Values::new();
        if contributed {
            values.set(SECRET_NAMESPACE, JsonValue::Object(namespace));
        }
        values
    }
}

/// Merge decrypted pairs into the namespace, dropping the public key marker
///
/// Keys are replaced wholesale; a later file wins for the same key.
pub fn merge_secrets(namespace: &mut Map<String, JsonValue>, decrypted: Map<String, JsonValue>) {
    for (key, value) in decrypted {
        if key != PUBLIC_KEY_FIELD {
            namespace.insert(key, value);
        }
    }
}
