use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::database::{Owned, Repository};
use crate::services::ServiceError;

/// Validation-then-delegate CRUD over any repository.
///
/// `R` is usually a domain repository trait object such as
/// `dyn CostRepository`, so entity services keep access to their
/// specialised queries through [`CrudService::repository`].
pub struct CrudService<T, R: ?Sized> {
    repo: Arc<R>,
    _entity: PhantomData<fn() -> T>,
}

impl<T, R: ?Sized> Clone for CrudService<T, R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            _entity: PhantomData,
        }
    }
}

impl<T, R> CrudService<T, R>
where
    T: Validate + Send + Sync + 'static,
    R: Repository<T> + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub async fn create(&self, entity: T) -> Result<T, ServiceError> {
        entity.validate()?;
        self.repo.create(&entity).await?;
        Ok(entity)
    }

    pub async fn get(&self, id: Uuid) -> Result<T, ServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, ServiceError> {
        Ok(self.repo.list(limit, offset).await?)
    }

    pub async fn update(&self, entity: T) -> Result<T, ServiceError> {
        entity.validate()?;
        self.repo.update(&entity).await?;
        Ok(entity)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.repo.delete(id).await?)
    }
}

impl<T, R> CrudService<T, R>
where
    T: Owned + Validate + Send + Sync + 'static,
    R: Repository<T> + ?Sized,
{
    /// Fetch a record owned by `owner`; someone else's record reads as missing.
    pub async fn get_owned(&self, id: Uuid, owner: Uuid) -> Result<T, ServiceError> {
        let entity = self.get(id).await?;
        if entity.owner_id() != owner {
            return Err(ServiceError::NotFound);
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Category;
    use crate::testing::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> CrudService<Category, MemoryStore> {
        CrudService::new(Arc::clone(store))
    }

    #[tokio::test]
    async fn create_validates_before_touching_the_store() {
        let store = MemoryStore::new();
        let crud = service(&store);

        let err = crud
            .create(Category::new(Uuid::new_v4(), String::new(), None))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = service(&store).get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = MemoryStore::new();
        let crud = service(&store);
        let owner = Uuid::new_v4();

        let created = crud
            .create(Category::new(owner, "Food".into(), None))
            .await
            .unwrap();

        let mut fetched = crud.get_owned(created.id, owner).await.unwrap();
        assert_eq!(fetched.name, "Food");

        fetched.name = "Groceries".into();
        crud.update(fetched).await.unwrap();
        assert_eq!(crud.get(created.id).await.unwrap().name, "Groceries");
        assert_eq!(crud.list(10, 0).await.unwrap().len(), 1);

        crud.delete(created.id).await.unwrap();
        assert!(matches!(crud.get(created.id).await, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn get_owned_hides_foreign_records() {
        let store = MemoryStore::new();
        let crud = service(&store);
        let created = crud
            .create(Category::new(Uuid::new_v4(), "Rent".into(), None))
            .await
            .unwrap();

        let err = crud.get_owned(created.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }
}
