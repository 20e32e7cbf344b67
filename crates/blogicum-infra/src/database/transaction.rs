//! Repository bundles bound to a connection, and transactions over them.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, TransactionTrait};

use blogicum_core::error::RepoError;
use blogicum_core::ports::{RepoTransaction, Repositories, TransactionManager};

use super::entity::{category, comment, location, post, user};
use super::postgres_base::{Connection, PostgresBaseRepository, map_db_err};

/// Every repository port, issuing its statements on `db`.
pub(crate) fn repositories_on<C: Connection>(db: C) -> Repositories {
    Repositories {
        users: Arc::new(PostgresBaseRepository::<user::Entity, C>::new(db.clone())),
        categories: Arc::new(PostgresBaseRepository::<category::Entity, C>::new(db.clone())),
        locations: Arc::new(PostgresBaseRepository::<location::Entity, C>::new(db.clone())),
        posts: Arc::new(PostgresBaseRepository::<post::Entity, C>::new(db.clone())),
        comments: Arc::new(PostgresBaseRepository::<comment::Entity, C>::new(db.clone())),
        transactions: Arc::new(PostgresTransactions { db }),
    }
}

/// Opens a transaction on the pool, or a savepoint inside an open transaction.
pub(crate) struct PostgresTransactions<C> {
    db: C,
}

#[async_trait]
impl<C: Connection> TransactionManager for PostgresTransactions<C> {
    async fn begin(&self) -> Result<Box<dyn RepoTransaction>, RepoError> {
        let txn = self.db.conn().begin().await.map_err(map_db_err)?;
        Ok(Box::new(PostgresTransaction { txn: Arc::new(txn) }))
    }
}

/// Rolled back by SeaORM when dropped without `commit`.
struct PostgresTransaction {
    txn: Arc<DatabaseTransaction>,
}

#[async_trait]
impl RepoTransaction for PostgresTransaction {
    fn repositories(&self) -> Repositories {
        repositories_on(self.txn.clone())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let txn = Arc::try_unwrap(self.txn).map_err(|_| {
            RepoError::Query("transaction committed while its repositories are alive".to_string())
        })?;
        txn.commit().await.map_err(map_db_err)
    }
}
