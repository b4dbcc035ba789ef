use crate::balance::{compute_balance_from_group, round_to_2_decimals};
use crate::schemas::{Expense, Group, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::mem::swap;

// Anything below a cent is considered settled
const EPSILON: f64 = 0.005;

#[derive(Clone, Debug)]
struct PersonalBalance {
    id: UserId,
    balance: f64,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
struct UserPair {
    user1: UserId,
    user2: UserId,
}

/// A single transfer: `payer` sends `amount` to `receiver`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub payer: UserId,
    pub receiver: UserId,
    pub amount: f64,
}

// The exchanges that will be made if no simplification happens
fn get_naive_exchanges(expenses: &[Expense]) -> Vec<Exchange> {
    let mut balances_between_people: HashMap<UserPair, f64> = HashMap::new();

    for expense in expenses {
        for split in &expense.split_among {
            if split.user == expense.paid_by {
                continue;
            }
            let mut pair = UserPair {
                user1: expense.paid_by.clone(),
                user2: split.user.clone(),
            };
            let mut amount = split.amount;

            // Alphabetical order keeps every debt between the same two users
            // in the same entry
            if pair.user1 > pair.user2 {
                swap(&mut pair.user1, &mut pair.user2);
                amount = -amount;
            }

            *balances_between_people.entry(pair).or_insert(0.0) += amount;
        }
    }

    // user1 is owed the balance by user2 when it is positive
    let mut exchanges: Vec<Exchange> = balances_between_people
        .into_iter()
        .filter(|(_, balance)| balance.abs() >= EPSILON)
        .map(|(pair, balance)| {
            let mut payer = pair.user2;
            let mut receiver = pair.user1;
            if balance < 0.0 {
                swap(&mut payer, &mut receiver);
            }
            Exchange {
                payer,
                receiver,
                amount: round_to_2_decimals(balance.abs()),
            }
        })
        .collect();
    exchanges.sort_by(|a, b| (&a.payer, &a.receiver).cmp(&(&b.payer, &b.receiver)));
    exchanges
}

// Greedily matches the biggest debtor with the biggest creditor
fn get_simplified_exchanges(
    mut payers: Vec<PersonalBalance>,
    mut receivers: Vec<PersonalBalance>,
) -> Vec<Exchange> {
    payers.sort_by(|a, b| a.balance.total_cmp(&b.balance).then(b.id.cmp(&a.id)));
    receivers.sort_by(|a, b| a.balance.total_cmp(&b.balance).then(b.id.cmp(&a.id)));

    let mut exchanges = Vec::new();

    while let (Some(payer), Some(receiver)) = (payers.last_mut(), receivers.last_mut()) {
        let mut exchange = Exchange {
            payer: payer.id.clone(),
            receiver: receiver.id.clone(),
            amount: 0.0,
        };
        let difference = round_to_2_decimals(receiver.balance - payer.balance);
        if difference.abs() < EPSILON {
            exchange.amount = payer.balance;
            payers.pop();
            receivers.pop();
        } else if difference > 0.0 {
            exchange.amount = payer.balance;
            receiver.balance = difference;
            payers.pop();
        } else {
            exchange.amount = receiver.balance;
            payer.balance = -difference;
            receivers.pop();
        }
        exchanges.push(exchange);
    }
    exchanges
}

/// Transfers that settle the debts of `group`, using as few as the greedy
/// simplification manages and never more than the pairwise ones.
pub fn get_exchanges_from_group(group: &Group, expenses: &[Expense]) -> Vec<Exchange> {
    let people_balances = compute_balance_from_group(group, expenses);

    // Divide people into payers and receivers
    let mut payers = Vec::new();
    let mut receivers = Vec::new();

    for (id, balance) in people_balances {
        if balance.abs() < EPSILON {
            continue;
        }
        let person = PersonalBalance {
            id,
            balance: balance.abs(),
        };
        if balance < 0.0 {
            payers.push(person);
        } else {
            receivers.push(person);
        }
    }

    let naive_exchanges = get_naive_exchanges(expenses);
    let simplified_exchanges = get_simplified_exchanges(payers, receivers);

    if simplified_exchanges.len() < naive_exchanges.len() {
        simplified_exchanges
    } else {
        naive_exchanges
    }
}
