use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use futures::future::join_all;
use tracing::{debug, warn};

use super::types::*;
use crate::config::AssistantConfig;
use crate::stores::{date_key, month_key, Expense, Group, SavedItem, Stores, Task, UserIdentity};

/// How many of a group's newest expenses the snapshot keeps.
const RECENT_EXPENSES: usize = 10;

/// Fans out the section reads for one request. Every section degrades to
/// empty on its own failure; none aborts the others.
pub struct SnapshotBuilder {
    stores: Stores,
    timezone: String,
    recent_items_limit: usize,
    default_currency: String,
}

impl SnapshotBuilder {
    pub fn new(stores: Stores, config: &AssistantConfig) -> Self {
        Self {
            stores,
            timezone: config.timezone.clone(),
            recent_items_limit: config.recent_items_limit,
            default_currency: config.default_currency.clone(),
        }
    }

    pub async fn build(&self, user: &UserIdentity, today: NaiveDate) -> Snapshot {
        let tomorrow = today + Duration::days(1);
        let (groups, (budgets, active_budget), today_tasks, tomorrow_tasks, recent_items) = tokio::join!(
            self.load_groups(user),
            self.load_budgets(user, today),
            self.load_tasks(user, today),
            self.load_tasks(user, tomorrow),
            self.load_recent_items(user),
        );

        debug!(
            groups = groups.len(),
            budgets = budgets.len(),
            active_budget = active_budget.is_some(),
            today_tasks = today_tasks.len(),
            tomorrow_tasks = tomorrow_tasks.len(),
            recent_items = recent_items.len(),
            "snapshot built"
        );

        Snapshot {
            user: user.clone(),
            today,
            default_currency: self.default_currency.clone(),
            groups,
            budgets,
            active_budget,
            today_tasks,
            tomorrow_tasks,
            recent_items,
        }
    }

    async fn load_groups(&self, user: &UserIdentity) -> Vec<GroupSnapshot> {
        let groups = match self.stores.expenses.list_groups_for_user(user).await {
            Ok(groups) => groups,
            Err(e) => {
                warn!(error = %e, "snapshot: expense groups unavailable");
                return Vec::new();
            }
        };

        let expenses = join_all(groups.iter().map(|g| self.stores.expenses.list_expenses(&g.id))).await;
        groups
            .into_iter()
            .zip(expenses)
            .map(|(group, expenses)| {
                let expenses = expenses.unwrap_or_else(|e| {
                    warn!(group_id = %group.id, error = %e, "snapshot: expenses unavailable");
                    Vec::new()
                });
                group_snapshot(group, expenses)
            })
            .collect()
    }

    async fn load_budgets(&self, user: &UserIdentity, today: NaiveDate) -> (Vec<BudgetRef>, Option<BudgetSnapshot>) {
        let docs = match self.stores.budgets.list_budgets_for_user(user).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "snapshot: budgets unavailable");
                return (Vec::new(), None);
            }
        };
        let refs: Vec<BudgetRef> = docs.iter().map(BudgetRef::from).collect();

        // flagged active budget, else the only one
        let active = docs.iter().find(|d| d.active).or(if docs.len() == 1 { docs.first() } else { None });
        let Some(active) = active else {
            return (refs, None);
        };

        let key = month_key(today);
        match self.stores.budgets.get_or_create_month(&active.id, &key).await {
            Ok(month) => {
                let snapshot = BudgetSnapshot {
                    id: active.id.clone(),
                    title: active.title.clone(),
                    currency: active.currency.clone(),
                    month_key: month.key,
                    entries: month.entries,
                    income_minor: month.income_minor,
                    fixed_costs_minor: month.fixed_costs_minor,
                };
                (refs, Some(snapshot))
            }
            Err(e) => {
                warn!(budget_id = %active.id, error = %e, "snapshot: month ledger unavailable");
                (refs, None)
            }
        }
    }

    async fn load_tasks(&self, user: &UserIdentity, date: NaiveDate) -> Vec<Task> {
        let key = date_key(date);
        match self.stores.schedule.get_or_create_day_plan(user, &key, &self.timezone).await {
            Ok(plan) => {
                let mut tasks = plan.tasks;
                tasks.sort_by_key(|t| (t.starts_at, t.sequence));
                tasks
            }
            Err(e) => {
                warn!(date = %key, error = %e, "snapshot: day plan unavailable");
                Vec::new()
            }
        }
    }

    async fn load_recent_items(&self, user: &UserIdentity) -> Vec<SavedItem> {
        match self.stores.saved.list_recent(user, self.recent_items_limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "snapshot: saved items unavailable");
                Vec::new()
            }
        }
    }
}

fn group_snapshot(group: Group, mut expenses: Vec<Expense>) -> GroupSnapshot {
    let balances = balances(&group, &expenses);
    expenses.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    expenses.truncate(RECENT_EXPENSES);
    GroupSnapshot {
        id: group.id,
        name: group.name,
        currency: group.currency,
        members: group.members,
        balances,
        recent_expenses: expenses,
    }
}

/// Payer credited with the full amount, each split debited. Members come
/// first in roster order; ids seen only on expenses follow.
pub fn balances(group: &Group, expenses: &[Expense]) -> Vec<MemberBalance> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for expense in expenses {
        *totals.entry(expense.payer_id.as_str()).or_default() += expense.amount_minor;
        for split in &expense.splits {
            *totals.entry(split.member_id.as_str()).or_default() -= split.amount_minor;
        }
    }

    let mut out: Vec<MemberBalance> = group
        .members
        .iter()
        .map(|m| MemberBalance {
            member_id: m.id.clone(),
            name: m.name.clone(),
            balance_minor: totals.remove(m.id.as_str()).unwrap_or(0),
        })
        .collect();

    let mut strays: Vec<(&str, i64)> = totals.into_iter().collect();
    strays.sort();
    out.extend(strays.into_iter().map(|(id, balance)| MemberBalance {
        member_id: id.to_string(),
        name: id.to_string(),
        balance_minor: balance,
    }));
    out
}
