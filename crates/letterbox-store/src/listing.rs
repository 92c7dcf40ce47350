// ABOUTME: Directory enumeration for the user store.
// ABOUTME: Lists handles by file extension and loads every user, fail-fast or lazily.

use std::fs;
use std::vec;

use letterbox_core::User;

use crate::store::{StoreError, UserStore};

impl UserStore {
    /// Scan the user directory and return the handle of every user file,
    /// sorted by name. Entries without the storage extension, or whose stem
    /// is not a valid handle, are skipped.
    pub fn handles(&self) -> Result<Vec<String>, StoreError> {
        let extension = self.config().extension.as_str();
        let mut handles = Vec::new();

        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                tracing::debug!("skipping non-UTF-8 file name {:?}", name);
                continue;
            };
            match name_str.strip_suffix(extension) {
                Some(handle) if self.validate_handle(handle).is_ok() => {
                    handles.push(handle.to_string())
                }
                _ => {
                    tracing::debug!("skipping non-user file in {}: {}", self.dir().display(), name_str);
                }
            }
        }

        handles.sort();
        Ok(handles)
    }

    /// Lazily load every user. Each item pairs the handle with its load
    /// result, so callers can skip or report bad files individually.
    pub fn iter_users(&self) -> Result<UserIter<'_>, StoreError> {
        Ok(UserIter {
            store: self,
            handles: self.handles()?.into_iter(),
        })
    }

    /// Load every user. The first listing or load error aborts the whole
    /// scan and no users are returned.
    pub fn all_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::new();
        for (handle, result) in self.iter_users()? {
            match result {
                Ok(user) => {
                    if user.handle != handle {
                        tracing::warn!(
                            "user file {} holds detail for handle {:?}",
                            handle,
                            user.handle
                        );
                    }
                    users.push(user);
                }
                Err(e) => {
                    tracing::warn!("failed to load user {}: {}", handle, e);
                    return Err(e);
                }
            }
        }

        tracing::debug!("loaded {} users from {}", users.len(), self.dir().display());
        Ok(users)
    }
}

/// Iterator returned by [`UserStore::iter_users`].
pub struct UserIter<'a> {
    store: &'a UserStore,
    handles: vec::IntoIter<String>,
}

impl Iterator for UserIter<'_> {
    type Item = (String, Result<User, StoreError>);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.handles.next()?;
        let result = self.store.load(&handle);
        Some((handle, result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.handles.size_hint()
    }
}
