//! Small JSON documents in browser LocalStorage
//!
//! Native builds have no backing store: loads find nothing and saves report
//! `StorageError::Unavailable`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage is not available")]
    Unavailable,
    #[error("could not serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("local storage rejected the write")]
    Write,
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Read the document under `key`; unreadable documents are discarded
#[cfg(target_arch = "wasm32")]
pub fn load<T: DeserializeOwned>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding unreadable `{}`: {}", key, e);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn save<T: Serialize>(key: &str, value: &T) -> Result<(), StorageError> {
    let storage = local_storage().ok_or(StorageError::Unavailable)?;
    let json = serde_json::to_string(value)?;
    storage.set_item(key, &json).map_err(|_| StorageError::Write)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load<T: DeserializeOwned>(_key: &str) -> Option<T> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save<T: Serialize>(_key: &str, _value: &T) -> Result<(), StorageError> {
    Err(StorageError::Unavailable)
}
