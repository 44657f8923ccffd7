use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serializes tests that mutate process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Mutex::new(()));
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Database coordinates as the outside environment provided them,
/// snapshotted before any test rewrites the variables. None when
/// neither DATABASE_URL nor POSTGRES_PASSWORD is set.
pub(crate) fn live_database_url() -> Option<String> {
    static SNAPSHOT: OnceLock<Option<String>> = OnceLock::new();
    SNAPSHOT
        .get_or_init(|| {
            dotenvy::dotenv().ok();

            if let Ok(url) = std::env::var("DATABASE_URL") {
                if !url.trim().is_empty() {
                    return Some(url);
                }
            }

            let password =
                std::env::var("POSTGRES_PASSWORD").ok().filter(|value| !value.is_empty())?;
            let server = std::env::var("POSTGRES_SERVER").unwrap_or_else(|_| "localhost".into());
            let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
            let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "aula".into());
            let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "aula_db".into());

            Some(format!("postgresql://{user}:{password}@{server}:{port}/{db}"))
        })
        .clone()
}

pub(crate) fn set_test_env() {
    // Take the snapshot before the variables below are rewritten.
    let _ = live_database_url();

    std::env::set_var("AULA_ENV", "test");
    std::env::set_var("AULA_STRICT_CONFIG", "0");
    std::env::remove_var("PROJECT_NAME");
    std::env::remove_var("DATABASE_URL");
    std::env::set_var("POSTGRES_SERVER", "localhost");
    std::env::set_var("POSTGRES_PORT", "5432");
    std::env::set_var("POSTGRES_USER", "aula_test");
    std::env::set_var("POSTGRES_PASSWORD", "aula_test");
    std::env::set_var("POSTGRES_DB", "aula_test");
    std::env::remove_var("S3_ACCESS_KEY");
    std::env::remove_var("S3_SECRET_KEY");
    std::env::remove_var("MAX_UPLOAD_SIZE_MB");
    std::env::remove_var("ALLOWED_ATTACHMENT_EXTENSIONS");
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
}
