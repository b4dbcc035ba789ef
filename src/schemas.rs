use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type GroupId = String;
pub type ExpenseId = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
}

/// What other users (and the owner) get to see of a [`User`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<UserId>,
    pub created_by: UserId,
}

impl Group {
    pub fn is_member(&self, user: &str) -> bool {
        self.members.iter().any(|member| member == user)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Split {
    pub user: UserId,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub paid_by: UserId,
    pub group: GroupId,
    pub split_among: Vec<Split>,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceType {
    Lent,
    Borrowed,
    /// Not produced by the per-expense calculation, kept for clients that
    /// render a settled state.
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExpenseBalance {
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: BalanceType,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    #[serde(flatten)]
    pub expense: Expense,
    pub balance_for_current_user: ExpenseBalance,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GroupView {
    #[serde(flatten)]
    pub group: Group,
    #[serde(rename = "memberDetails")]
    pub member_details: Vec<PublicUser>,
}

// Request bodies

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterJson {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginJson {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GroupJson {
    pub name: String,
    #[serde(default)]
    pub members: Vec<UserId>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberJson {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseJson {
    pub title: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub paid_by: UserId,
    pub group: GroupId,
    #[serde(default)]
    pub split_among: Vec<Split>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensesQuery {
    pub group_id: GroupId,
}
