use log::{info, warn};
use std::io;
use std::path::Path;
use std::time::Duration;

pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating output directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Best-effort recursive delete, retried `attempts` times with `backoff`
/// between tries. Failure is logged, never returned.
pub async fn remove_dir_with_retry(path: &Path, attempts: u32, backoff: Duration) -> bool {
    for attempt in 1..=attempts {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => return true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
            Err(e) => {
                warn!(
                    "Failed to remove {} (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    attempts,
                    e
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
    warn!("Giving up on removing {}", path.display());
    false
}

/// Keeps alphanumerics, space, `_` and `-`.
///
/// A value with nothing left after stripping maps to `filter_` followed by
/// the hex code points of its characters, so distinct symbol-only values
/// still get distinct, stable names. The empty string maps to `unnamed`.
pub fn sanitize_component(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    if !kept.is_empty() {
        return kept;
    }
    if value.is_empty() {
        return "unnamed".to_string();
    }
    let code_points: Vec<String> = value.chars().map(|c| format!("{:x}", c as u32)).collect();
    format!("filter_{}", code_points.join("_"))
}
