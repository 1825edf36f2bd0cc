use synapse_shared::{StorageError, TaskStorage};

/// Browser local storage as a [`TaskStorage`] backend.
///
/// Storage is looked up on every call. A missing window or blocked storage
/// comes back as [`StorageError::Unavailable`] instead of throwing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl TaskStorage for BrowserStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        local_storage()?
            .get_item(key)
            .map_err(|err| StorageError::Unavailable(format!("{err:?}")))
    }

    fn write(&mut self, key: &str, contents: &str) -> Result<(), StorageError> {
        local_storage()?
            .set_item(key, contents)
            .map_err(|err| StorageError::Write {
                key: key.to_string(),
                reason: format!("{err:?}"),
            })
    }
}

fn local_storage() -> Result<web_sys::Storage, StorageError> {
    available(web_sys::window().and_then(|window| window.local_storage().ok().flatten()))
}

fn available<T>(storage: Option<T>) -> Result<T, StorageError> {
    storage.ok_or_else(|| StorageError::Unavailable("local storage is not accessible".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_storage_is_reported_not_thrown() {
        assert_eq!(
            available::<()>(None),
            Err(StorageError::Unavailable("local storage is not accessible".to_string()))
        );
        assert_eq!(available(Some(7)), Ok(7));
    }
}
