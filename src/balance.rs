use std::collections::HashMap;

use crate::schemas::{BalanceType, Expense, ExpenseBalance, Group, UserId};

pub type Balance = HashMap<UserId, f64>;

/// Net position of `user` on a single expense.
///
/// The zero boundary is classified differently depending on who paid: a payer
/// whose own share covers the whole amount gets `borrowed`, a bystander with
/// no share gets `lent`. The `>` vs `>=` inconsistency is kept on purpose
/// until there is a product decision on how a zero balance should read.
pub fn compute_balance(expense: &Expense, user: &str) -> ExpenseBalance {
    let user_share = expense
        .split_among
        .iter()
        .find(|split| split.user == user)
        .map_or(0.0, |split| split.amount);

    let (balance, kind) = if expense.paid_by == user {
        let balance = expense.amount - user_share;
        let kind = if balance > 0.0 {
            BalanceType::Lent
        } else {
            BalanceType::Borrowed
        };
        (balance, kind)
    } else {
        let balance = -user_share;
        let kind = if balance >= 0.0 {
            BalanceType::Lent
        } else {
            BalanceType::Borrowed
        };
        (balance, kind)
    };

    ExpenseBalance {
        amount: balance.abs(),
        kind,
    }
}

/// Net balance of every member of `group` over `expenses`. Positive means the
/// rest of the group owes that member money.
pub fn compute_balance_from_group(group: &Group, expenses: &[Expense]) -> Balance {
    let mut balance: Balance = group
        .members
        .iter()
        .map(|member| (member.clone(), 0.0))
        .collect();
    for expense in expenses {
        *balance.entry(expense.paid_by.clone()).or_insert(0.0) += expense.amount;
        for split in &expense.split_among {
            *balance.entry(split.user.clone()).or_insert(0.0) -= split.amount;
        }
    }
    for value in balance.values_mut() {
        *value = round_to_2_decimals(*value);
    }
    balance
}

pub fn round_to_2_decimals(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}
