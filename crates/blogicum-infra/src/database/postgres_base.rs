use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DatabaseTransaction, DbConn, DbErr,
    EntityTrait, IntoActiveModel, PrimaryKeyTrait, SqlErr, TransactionTrait,
};

use blogicum_core::error::RepoError;
use blogicum_core::ports::BaseRepository;

/// Handle the repositories issue their statements on: the pool, or an open
/// transaction shared by every repository bound to it.
pub trait Connection: Clone + Send + Sync + 'static {
    type Conn: ConnectionTrait + TransactionTrait + Send + Sync;

    fn conn(&self) -> &Self::Conn;
}

impl Connection for DbConn {
    type Conn = DbConn;

    fn conn(&self) -> &DbConn {
        self
    }
}

impl Connection for Arc<DatabaseTransaction> {
    type Conn = DatabaseTransaction;

    fn conn(&self) -> &DatabaseTransaction {
        self
    }
}

/// Generic PostgreSQL repository implementation.
pub struct PostgresBaseRepository<E, C = DbConn>
where
    E: EntityTrait,
{
    pub(crate) db: C,
    _entity: PhantomData<E>,
}

impl<E, C> PostgresBaseRepository<E, C>
where
    E: EntityTrait,
{
    pub fn new(db: C) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Translate a SeaORM error into the repository error vocabulary.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => RepoError::Constraint(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => RepoError::Constraint(msg),
        _ => match err {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
            DbErr::Conn(e) => RepoError::Connection(e.to_string()),
            DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
            other => RepoError::Query(other.to_string()),
        },
    }
}

#[async_trait]
impl<E, C, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E, C>
where
    E: EntityTrait,
    C: Connection,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(self.db.conn()).await.map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, entity: T) -> Result<T, RepoError> {
        let active_model: E::ActiveModel = entity.into();
        let model = active_model.insert(self.db.conn()).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let active_model: E::ActiveModel = entity.into();
        let model = active_model.update(self.db.conn()).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(self.db.conn())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
