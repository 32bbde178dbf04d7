use anyhow::{Context, Result};

/// One-way hash of a source address with bcrypt, so raw addresses never reach the store.
///
/// bcrypt salts every call, so equal addresses produce different hashes.
pub fn hash_address(address: &str, cost: u32) -> Result<String> {
    bcrypt::hash(address.as_bytes(), cost).context("Failed to hash address")
}

/// Hash on the blocking pool; bcrypt is CPU bound.
pub async fn hash_address_blocking(address: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_address(&address, cost))
        .await
        .context("Address hashing task failed")?
}
