use async_trait::async_trait;

use super::Repositories;
use crate::error::RepoError;

/// Starts transactions over the same storage as the repositories that carry it.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn RepoTransaction>, RepoError>;
}

/// Writes made through [`RepoTransaction::repositories`] become visible to
/// everyone else on `commit`. Dropping the transaction discards them.
#[async_trait]
pub trait RepoTransaction: Send + Sync {
    /// Repositories bound to this transaction. Drop them before committing.
    fn repositories(&self) -> Repositories;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}
