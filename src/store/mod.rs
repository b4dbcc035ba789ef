use async_trait::async_trait;

use crate::error::StoreError;
use crate::schemas::{Expense, Group, User};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Persistence for users, groups and their expenses.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// `email` is expected lower-cased.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError>;

    async fn find_group(&self, id: &str) -> Result<Option<Group>, StoreError>;

    async fn groups_for_member(&self, user: &str) -> Result<Vec<Group>, StoreError>;

    /// Adds `user` to the group unless already there. Returns the updated
    /// group, or `None` if the group doesn't exist.
    async fn add_member(&self, group: &str, user: &str) -> Result<Option<Group>, StoreError>;

    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError>;

    async fn find_expense(&self, id: &str) -> Result<Option<Expense>, StoreError>;

    /// Newest first.
    async fn expenses_for_group(&self, group: &str) -> Result<Vec<Expense>, StoreError>;

    async fn delete_expense(&self, id: &str) -> Result<bool, StoreError>;
}

pub(crate) fn newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date));
}
