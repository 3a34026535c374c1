use crate::error::PortalError;

/// Hash on the blocking pool; bcrypt at the default cost takes a few hundred ms.
pub async fn hash_password(password: &str) -> Result<String, PortalError> {
    hash_with_cost(password, bcrypt::DEFAULT_COST).await
}

pub(crate) async fn hash_with_cost(password: &str, cost: u32) -> Result<String, PortalError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(std::io::Error::other)?
        .map_err(PortalError::from)
}

/// `false` for a wrong password and for a stored value that is not a bcrypt hash.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PortalError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(std::io::Error::other)?;
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_with_cost("Secr3t!pass", 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("Secr3t!pass", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn locked_accounts_never_verify() {
        assert!(!verify_password("anything", "!locked").await.unwrap());
    }
}
