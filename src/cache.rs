//! Keeps contexts around between calls, as JSON files in the user's cache folder.
//!
//! To use the cache system, implement the Cacheable and CacheKey traits, then you can
//! use the read(), read_all() and write() functions.
use crate::context::{Context, ContextName};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Where a cached item lives, relative to the folder of its type.
pub trait CacheKey {
    fn as_path(&self) -> String;
}

/// Anything that can be cached needs to implement this trait.
///
/// Binding the key type to the cached type means the compiler checks that we read things back
/// with the same kind of key we wrote them with:
/// ```no_run
/// use rusty_odata::cache::read;
/// use rusty_odata::context::{Context, ContextName};
///
/// let context: Context = read(&ContextName::from("production"))?;
/// # Ok::<(), rusty_odata::Error>(())
/// ```
pub trait Cacheable {
    type CacheKey;

    fn cache_key(&self) -> Self::CacheKey;

    /// All items of the same type are saved in the same folder, named after this id. Ids must
    /// be unique.
    fn type_id() -> &'static str;
}

pub fn read<D, K>(cache_key: &K) -> Result<D, crate::Error>
where
    D: Cacheable<CacheKey = K> + DeserializeOwned,
    K: CacheKey,
{
    let file_location = get_cache_path(D::type_id(), cache_key.as_path().as_str())?;
    info!("Reading {} from {}", D::type_id(), file_location.display());

    let data = serde_json::from_reader(fs::File::open(file_location)?)?;

    Ok(data)
}

/// Reads every cached item of one type.
pub fn read_all<D>() -> Result<Vec<D>, crate::Error>
where
    D: Cacheable + DeserializeOwned,
{
    let folder = require_cache_folder(D::type_id())?;
    let mut items = Vec::new();

    for entry in fs::read_dir(folder)? {
        let path = entry?.path();

        if path.is_file() {
            items.push(serde_json::from_reader(fs::File::open(path)?)?);
        }
    }

    Ok(items)
}

pub fn write<D, K>(data: &D) -> Result<(), crate::Error>
where
    D: Cacheable<CacheKey = K> + Serialize,
    K: CacheKey,
{
    let file_location = get_cache_path(D::type_id(), data.cache_key().as_path().as_str())?;
    info!("Writing {} to {}", D::type_id(), file_location.display());

    let data = serde_json::to_string(&data)?;

    fs::write(file_location, data)?;

    Ok(())
}

fn get_cache_path(type_id: &'static str, cache_key: &str) -> Result<PathBuf, crate::Error> {
    let mut location = require_cache_folder(type_id)?;

    location.push(cache_key);

    Ok(location)
}

fn require_cache_folder(type_id: &'static str) -> Result<PathBuf, crate::Error> {
    let home = std::env::var("HOME")?;

    let mut path = PathBuf::from(home);
    path.push(".cache");
    path.push("rusty-odata");
    path.push("cache");
    path.push("v1");
    path.push(type_id);

    fs::create_dir_all(&path)?;

    Ok(path)
}

// Please dump all impls here, so we keep the rest of the code base clean.

impl Cacheable for Context {
    type CacheKey = ContextName;

    fn cache_key(&self) -> Self::CacheKey {
        self.name.clone()
    }

    fn type_id() -> &'static str {
        "context"
    }
}

impl CacheKey for ContextName {
    fn as_path(&self) -> String {
        format!("context_{}.json", self)
    }
}

/// The name of the context in use is cached on its own, always under the same key.
impl Cacheable for ContextName {
    type CacheKey = SharedCacheKey;

    fn cache_key(&self) -> Self::CacheKey {
        SharedCacheKey(Self::type_id().to_owned())
    }

    fn type_id() -> &'static str {
        "current_context"
    }
}

pub struct SharedCacheKey(String);

impl CacheKey for SharedCacheKey {
    fn as_path(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys() {
        let name = ContextName::from("staging");

        assert_eq!(name.as_path(), "context_staging.json");
        assert_eq!(name.cache_key().as_path(), "current_context");
    }
}
