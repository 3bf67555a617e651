use tokio::time::{Duration, Instant};

/// Entrada no store: valor + prazo de validade.
///
/// Snapshot imutável: uma recomputação substitui a entrada inteira.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    value: T,
    /// `None` quando `agora + ttl` não cabe num `Instant`; nunca expira.
    expires_at: Option<Instant>,
}

impl<T> Entry<T> {
    /// Cria uma entrada que expira `ttl` a partir de agora.
    pub fn fresh(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|t| Instant::now() >= t)
            .unwrap_or(false)
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
