use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{newest_first, Store};
use crate::error::StoreError;
use crate::schemas::{Expense, ExpenseId, Group, GroupId, User, UserId};

/// Keeps everything in process memory. Used by the tests and for running the
/// server without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    groups: RwLock<HashMap<GroupId, Group>>,
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate(user.email.clone()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError> {
        self.groups
            .write()
            .await
            .insert(group.id.clone(), group.clone());
        Ok(())
    }

    async fn find_group(&self, id: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.read().await.get(id).cloned())
    }

    async fn groups_for_member(&self, user: &str) -> Result<Vec<Group>, StoreError> {
        let mut groups: Vec<Group> = self
            .groups
            .read()
            .await
            .values()
            .filter(|group| group.is_member(user))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn add_member(&self, group: &str, user: &str) -> Result<Option<Group>, StoreError> {
        let mut groups = self.groups.write().await;
        let Some(group) = groups.get_mut(group) else {
            return Ok(None);
        };
        if !group.is_member(user) {
            group.members.push(user.to_string());
        }
        Ok(Some(group.clone()))
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError> {
        self.expenses
            .write()
            .await
            .insert(expense.id.clone(), expense.clone());
        Ok(())
    }

    async fn find_expense(&self, id: &str) -> Result<Option<Expense>, StoreError> {
        Ok(self.expenses.read().await.get(id).cloned())
    }

    async fn expenses_for_group(&self, group: &str) -> Result<Vec<Expense>, StoreError> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .read()
            .await
            .values()
            .filter(|expense| expense.group == group)
            .cloned()
            .collect();
        newest_first(&mut expenses);
        Ok(expenses)
    }

    async fn delete_expense(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.expenses.write().await.remove(id).is_some())
    }
}
