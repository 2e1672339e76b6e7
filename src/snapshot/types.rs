use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::intent::EntryKind;
use crate::stores::{BudgetDoc, Expense, LedgerEntry, Member, SavedItem, Task, UserIdentity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member_id: String,
    pub name: String,
    /// Positive when the group owes this member.
    pub balance_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub members: Vec<Member>,
    pub balances: Vec<MemberBalance>,
    pub recent_expenses: Vec<Expense>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRef {
    pub id: String,
    pub title: String,
    pub currency: String,
}

impl From<&BudgetDoc> for BudgetRef {
    fn from(doc: &BudgetDoc) -> Self {
        Self { id: doc.id.clone(), title: doc.title.clone(), currency: doc.currency.clone() }
    }
}

/// The active budget with the current month's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub id: String,
    pub title: String,
    pub currency: String,
    pub month_key: String,
    pub entries: Vec<LedgerEntry>,
    pub income_minor: i64,
    pub fixed_costs_minor: i64,
}

impl BudgetSnapshot {
    pub fn spent_minor(&self) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Expense)
            .map(|e| e.amount_minor)
            .sum()
    }
}

/// Read-only view of one user's state, rebuilt for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub user: UserIdentity,
    pub today: NaiveDate,
    pub default_currency: String,
    pub groups: Vec<GroupSnapshot>,
    pub budgets: Vec<BudgetRef>,
    pub active_budget: Option<BudgetSnapshot>,
    pub today_tasks: Vec<Task>,
    pub tomorrow_tasks: Vec<Task>,
    pub recent_items: Vec<SavedItem>,
}

impl Snapshot {
    /// A snapshot with no loaded sections.
    pub fn empty(user: UserIdentity, today: NaiveDate, default_currency: impl Into<String>) -> Self {
        Self {
            user,
            today,
            default_currency: default_currency.into(),
            groups: Vec::new(),
            budgets: Vec::new(),
            active_budget: None,
            today_tasks: Vec::new(),
            tomorrow_tasks: Vec::new(),
            recent_items: Vec::new(),
        }
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn budget_titles(&self) -> Vec<&str> {
        self.budgets.iter().map(|b| b.title.as_str()).collect()
    }

    pub fn group(&self, id: &str) -> Option<&GroupSnapshot> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn budget(&self, id: &str) -> Option<&BudgetRef> {
        self.budgets.iter().find(|b| b.id == id)
    }

    /// The active budget as a plain reference, whether or not its month loaded.
    pub fn active_budget_ref(&self) -> Option<BudgetRef> {
        self.active_budget.as_ref().map(|b| BudgetRef {
            id: b.id.clone(),
            title: b.title.clone(),
            currency: b.currency.clone(),
        })
    }
}
