use crate::errors::PortcullisError;
use crate::settings::Database as DbCfg;
use base64ct::Encoding;
use rand::RngCore;
use sea_orm::{Database, DatabaseConnection};

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, PortcullisError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

/// Opaque identifier for access requests: 24 random bytes, base64url.
pub fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_unique_and_url_safe() {
        let a = random_id();
        let b = random_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
