use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hash a password on the blocking pool
pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}
