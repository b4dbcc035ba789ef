use async_trait::async_trait;
use bson::doc;
use futures::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};
use tracing::info;

use super::{newest_first, Store};
use crate::error::StoreError;
use crate::schemas::{Expense, Group, User};

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

fn by_name() -> FindOptions {
    FindOptions::builder().sort(doc! { "name": 1 }).build()
}

pub struct MongoStore {
    users: Collection<User>,
    groups: Collection<Group>,
    expenses: Collection<Expense>,
}

impl MongoStore {
    /// Connects once and prepares the collections. The returned store is
    /// meant to be shared by every request.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);
        info!(database = database.name(), "Connected to MongoDB");

        let store = MongoStore {
            users: database.collection("users"),
            groups: database.collection("groups"),
            expenses: database.collection("expenses"),
        };

        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store.users.create_index(unique_email, None).await?;

        Ok(store)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        match self.users.insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate(user.email.clone())),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let cursor = self.users.find(None, by_name()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError> {
        self.groups.insert_one(group, None).await?;
        Ok(())
    }

    async fn find_group(&self, id: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.find_one(doc! { "id": id }, None).await?)
    }

    async fn groups_for_member(&self, user: &str) -> Result<Vec<Group>, StoreError> {
        let cursor = self
            .groups
            .find(doc! { "members": user }, by_name())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn add_member(&self, group: &str, user: &str) -> Result<Option<Group>, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .groups
            .find_one_and_update(
                doc! { "id": group },
                doc! { "$addToSet": { "members": user } },
                options,
            )
            .await?)
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError> {
        self.expenses.insert_one(expense, None).await?;
        Ok(())
    }

    async fn find_expense(&self, id: &str) -> Result<Option<Expense>, StoreError> {
        Ok(self.expenses.find_one(doc! { "id": id }, None).await?)
    }

    async fn expenses_for_group(&self, group: &str) -> Result<Vec<Expense>, StoreError> {
        let cursor = self.expenses.find(doc! { "group": group }, None).await?;
        let mut expenses: Vec<Expense> = cursor.try_collect().await?;
        // Dates are stored as RFC 3339 strings, which don't sort reliably
        newest_first(&mut expenses);
        Ok(expenses)
    }

    async fn delete_expense(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.expenses.delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}
