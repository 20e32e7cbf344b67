//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blogicum_core::domain::{Category, CommentView, Location, PostView, User};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostFilter, PostRepository,
    PostScope, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{Connection, PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl<C: Connection> UserRepository for PostgresBaseRepository<UserEntity, C> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn delete_non_superusers(&self) -> Result<u64, RepoError> {
        let result = UserEntity::delete_many()
            .filter(user::Column::IsSuperuser.eq(false))
            .exec(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl<C: Connection> CategoryRepository for PostgresBaseRepository<CategoryEntity, C> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::IsPublished.eq(true))
            .order_by_asc(category::Column::Title)
            .all(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let result = CategoryEntity::delete_many()
            .exec(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl<C: Connection> LocationRepository for PostgresBaseRepository<LocationEntity, C> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Location>, RepoError> {
        let result = LocationEntity::find()
            .filter(location::Column::Name.eq(name))
            .one(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let result = LocationEntity::delete_many()
            .exec(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

/// Base post query for a filter. Public scope joins the category so its
/// flag can be checked; uncategorized posts pass that check.
fn filtered_posts(filter: &PostFilter) -> Select<PostEntity> {
    let mut query = PostEntity::find();

    if let PostScope::Public { now } = filter.scope {
        query = query
            .join(JoinType::LeftJoin, post::Relation::Category.def())
            .filter(post::Column::IsPublished.eq(true))
            .filter(post::Column::PubDate.lte(now))
            .filter(
                Condition::any()
                    .add(post::Column::CategoryId.is_null())
                    .add(category::Column::IsPublished.eq(true)),
            );
    }
    if let Some(author_id) = filter.author_id {
        query = query.filter(post::Column::AuthorId.eq(author_id));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(post::Column::CategoryId.eq(category_id));
    }

    query
}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: Uuid,
    comment_count: i64,
}

impl<C: Connection> PostgresBaseRepository<PostEntity, C> {
    /// Number of comments per post, for the given posts only.
    async fn comment_counts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        let rows = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(comment::Column::PostId)
            .into_model::<CommentCount>()
            .all(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.post_id, row.comment_count.max(0) as u64))
            .collect())
    }

    /// Attach authors, categories, locations and comment counts, keeping order.
    async fn hydrate(&self, models: Vec<post::Model>) -> Result<Vec<PostView>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let author_ids: Vec<Uuid> = models.iter().map(|m| m.author_id).collect();
        let category_ids: Vec<Uuid> = models.iter().filter_map(|m| m.category_id).collect();
        let location_ids: Vec<Uuid> = models.iter().filter_map(|m| m.location_id).collect();

        let authors: HashMap<Uuid, User> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(self.db.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|m| (m.id, User::from(m)))
            .collect();

        let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            CategoryEntity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(self.db.conn())
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|m| (m.id, Category::from(m)))
                .collect()
        };

        let locations: HashMap<Uuid, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            LocationEntity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(self.db.conn())
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|m| (m.id, Location::from(m)))
                .collect()
        };

        let counts = self.comment_counts(&post_ids).await?;

        Ok(models
            .into_iter()
            .filter_map(|model| {
                let Some(author) = authors.get(&model.author_id).cloned() else {
                    tracing::warn!(post_id = %model.id, "Post author missing, skipping");
                    return None;
                };
                let category = model.category_id.and_then(|id| categories.get(&id).cloned());
                let location = model.location_id.and_then(|id| locations.get(&id).cloned());
                let comment_count = counts.get(&model.id).copied().unwrap_or(0);

                Some(PostView {
                    post: model.into(),
                    author,
                    category,
                    location,
                    comment_count,
                })
            })
            .collect())
    }
}

#[async_trait]
impl<C: Connection> PostRepository for PostgresBaseRepository<PostEntity, C> {
    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        filtered_posts(filter)
            .count(self.db.conn())
            .await
            .map_err(map_db_err)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostView>, RepoError> {
        let models = filtered_posts(filter)
            .order_by_desc(post::Column::PubDate)
            .order_by_asc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.conn())
            .await
            .map_err(map_db_err)?;

        self.hydrate(models).await
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(self.db.conn())
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let result = PostEntity::delete_many()
            .exec(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl<C: Connection> CommentRepository for PostgresBaseRepository<CommentEntity, C> {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .find_also_related(UserEntity)
            .all(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(comment, author)| {
                Some(CommentView {
                    comment: comment.into(),
                    author: author?.into(),
                })
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let result = CommentEntity::delete_many()
            .exec(self.db.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}
