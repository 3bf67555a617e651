use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::time::Duration;
use tracing::{debug, trace, warn};

use ttlmemo_common::{CacheError, CacheResult, DEFAULT_TTL};

use crate::entry::Entry;

/// Resultado de uma inspeção com [`TtlCache::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup<T> {
    pub value: T,
    /// O valor está vencido mas ainda é servido.
    pub expired: bool,
}

impl<T> Lookup<T> {
    pub fn into_parts(self) -> (T, bool) {
        (self.value, self.expired)
    }
}

/// Estado compartilhado entre todos os handles.
struct SharedState<T> {
    ttl: Duration,
    data: DashMap<String, Entry<T>>,
}

/// Cache de memoização com TTL fixo.
///
/// `TtlCache` é um handle barato de clonar: clones enxergam o mesmo store,
/// e cada chamada a [`TtlCache::new`] cria um store independente.
///
/// Não há single-flight: chamadas concorrentes sobre a mesma chave vencida
/// podem computar o valor várias vezes, e a última escrita vence. Também não
/// há varredura em background; a validade é checada só na leitura.
pub struct TtlCache<T> {
    shared: Arc<SharedState<T>>,
}

impl<T> Clone for TtlCache<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> TtlCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Cria um cache vazio. Com `ttl` zero toda leitura após a primeira recomputa.
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            shared: Arc::new(SharedState {
                ttl,
                data: DashMap::new(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    /// Número de chaves armazenadas, vencidas inclusive.
    pub fn len(&self) -> usize {
        self.shared.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.data.is_empty()
    }

    /// Retorna o valor em cache se ainda válido; senão chama `compute` na
    /// thread atual, armazena e retorna o novo valor.
    ///
    /// Quem chama sempre recebe o próprio resultado, mesmo que outra chamada
    /// concorrente sobrescreva o store logo em seguida.
    pub fn remember<F>(&self, key: impl Into<String>, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        let key = key.into();
        if let Some(value) = self.fresh_value(&key) {
            return value;
        }

        debug!("recomputando chave: {key}");
        let value = compute();
        self.store(key, value.clone());
        value
    }

    /// Versão assíncrona de [`remember`](Self::remember): aguarda `compute`
    /// na task atual.
    pub async fn remember_async<F, Fut>(&self, key: impl Into<String>, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let key = key.into();
        if let Some(value) = self.fresh_value(&key) {
            return value;
        }

        debug!("recomputando chave: {key}");
        let value = compute().await;
        self.store(key, value.clone());
        value
    }

    /// Stale-while-revalidate.
    ///
    /// Na primeira vez a chave é computada de forma síncrona. Depois disso,
    /// um valor vencido é retornado na hora e `compute` roda em background:
    /// no pool de blocking do tokio se houver runtime, senão numa thread
    /// avulsa. A recomputação não é supervisionada: não há join, nem canal
    /// de erro, nem cancelamento.
    pub fn get_stale_then_recompute<F>(&self, key: impl Into<String>, compute: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let key = key.into();
        let Some(entry) = self.snapshot(&key) else {
            debug!("chave ausente, computando: {key}");
            let value = compute();
            self.store(key, value.clone());
            return value;
        };

        if entry.is_expired() {
            self.spawn_refresh(key, compute);
        } else {
            trace!("hit: {key}");
        }
        entry.into_value()
    }

    /// Versão assíncrona de [`get_stale_then_recompute`](Self::get_stale_then_recompute).
    ///
    /// # Panics
    ///
    /// Se a chave estiver vencida e a chamada acontecer fora de um runtime tokio.
    pub async fn get_stale_then_recompute_async<F, Fut>(
        &self,
        key: impl Into<String>,
        compute: F,
    ) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let key = key.into();
        let Some(entry) = self.snapshot(&key) else {
            debug!("chave ausente, computando: {key}");
            let value = compute().await;
            self.store(key, value.clone());
            return value;
        };

        if entry.is_expired() {
            debug!("valor vencido servido, refresh agendado: {key}");
            let cache = self.clone();
            let fut = compute();
            tokio::spawn(async move {
                let value = fut.await;
                cache.store(key, value);
            });
        } else {
            trace!("hit: {key}");
        }
        entry.into_value()
    }

    /// Inspeção sem computar: retorna o valor armazenado e se está vencido.
    ///
    /// `Err(NotFound)` só quando nada nunca foi armazenado para `key`.
    pub fn get(&self, key: &str) -> CacheResult<Lookup<T>> {
        let entry = self.snapshot(key).ok_or(CacheError::NotFound)?;
        let expired = entry.is_expired();
        Ok(Lookup {
            value: entry.into_value(),
            expired,
        })
    }

    // O guard do shard é liberado antes de retornar, então `compute` pode
    // acessar o próprio cache sem deadlock.
    fn snapshot(&self, key: &str) -> Option<Entry<T>> {
        self.shared.data.get(key).map(|entry| entry.value().clone())
    }

    fn fresh_value(&self, key: &str) -> Option<T> {
        let entry = self.snapshot(key)?;
        if entry.is_expired() {
            return None;
        }
        trace!("hit: {key}");
        Some(entry.into_value())
    }

    fn store(&self, key: String, value: T) {
        let entry = Entry::fresh(value, self.shared.ttl);
        self.shared.data.insert(key, entry);
    }

    fn spawn_refresh<F>(&self, key: String, compute: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        debug!("valor vencido servido, refresh agendado: {key}");
        let cache = self.clone();
        let job = move || {
            let value = compute();
            debug!("refresh concluído: {key}");
            cache.store(key, value);
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("ttlmemo-refresh".into())
                    .spawn(job);
                // A entrada continua vencida; a próxima leitura agenda outro refresh
                if let Err(e) = spawned {
                    warn!("falha ao iniciar thread de refresh: {e}");
                }
            }
        }
    }
}

impl<T> Default for TtlCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
