use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::{ClockTime, EntryKind};

/// Who is asking. At least one of `id` or `email` must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), email: None }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_present(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.id) || filled(&self.email)
    }

    /// Stable key for stores that index by user: the id, else the email.
    pub fn key(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.email.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub member_id: String,
    pub amount_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub payer_id: String,
    pub splits: Vec<Split>,
    pub occurred_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPercentage {
    pub member_id: String,
    pub percent: f64,
}

/// Everything the expense store needs to append one expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub amount_major: f64,
    pub currency: String,
    pub payer_id: String,
    pub split_percentages: Vec<SplitPercentage>,
    pub occurred_at: NaiveDate,
    pub amount_minor: i64,
    pub splits_minor: Vec<Split>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDoc {
    pub id: String,
    pub title: String,
    pub currency: String,
    /// The budget new entries go to when none is named.
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub amount_minor: i64,
    pub description: String,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub kind: EntryKind,
    pub occurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// One month of a budget ledger, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Month {
    /// `YYYY-MM`.
    pub key: String,
    pub entries: Vec<LedgerEntry>,
    pub income_minor: i64,
    pub fixed_costs_minor: i64,
}

impl Month {
    pub fn empty(key: impl Into<String>) -> Self {
        Self { key: key.into(), entries: Vec::new(), income_minor: 0, fixed_costs_minor: 0 }
    }

    pub fn spent_minor(&self) -> i64 {
        self.entries.iter().filter(|e| e.kind == EntryKind::Expense).map(|e| e.amount_minor).sum()
    }
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub sequence: u32,
    pub title: String,
    pub starts_at: ClockTime,
    pub ends_at: ClockTime,
    pub duration_minutes: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    /// `YYYY-MM-DD`.
    pub date_key: String,
    pub timezone: String,
    pub tasks: Vec<Task>,
}

impl DayPlan {
    pub fn next_sequence(&self) -> u32 {
        self.tasks.iter().map(|t| t.sequence).max().map_or(1, |s| s + 1)
    }

    /// End of the latest task on the day, if any.
    pub fn last_end(&self) -> Option<ClockTime> {
        self.tasks.iter().map(|t| t.ends_at).max()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub saved_at: DateTime<Utc>,
}
