/// Erros do cache.
///
/// Só a inspeção (`get`) pode falhar: as operações que computam são totais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("valor não encontrado")]
    NotFound,
}

/// Result type alias.
pub type CacheResult<T> = Result<T, CacheError>;
