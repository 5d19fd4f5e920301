//! Reintento acotado para llamadas al backend.
use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::errors::BackendError;

/// Política: `max_retries` reintentos con espera lineal
/// `base_delay_ms * intento`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3,
               base_delay_ms: 15 }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0,
               base_delay_ms: 0 }
    }
}

/// Repite `f` mientras el error sea transitorio y queden intentos. Sólo repite
/// la llamada; el error final se devuelve tal cual.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, mut f: F) -> Result<T, BackendError>
    where F: FnMut() -> Fut,
          Fut: Future<Output = Result<T, BackendError>>
{
    let mut attempts = 0;
    loop {
        match f().await {
            Err(e) if e.is_retryable() && attempts < policy.max_retries => {
                let delay_ms = policy.base_delay_ms * u64::from(attempts + 1);
                warn!("retryable backend error (attempt {}): {} -> sleeping {}ms", attempts + 1, e, delay_ms);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempts += 1;
            }
            r => return r,
        }
    }
}
