pub mod types;
pub mod memory;
pub mod http;

pub use types::*;
pub use memory::*;
pub use http::*;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

/// Shared expense groups and their expenses.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn list_groups_for_user(&self, identity: &UserIdentity) -> Result<Vec<Group>, StoreError>;
    async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, StoreError>;
    /// Returns the new expense id.
    async fn append_expense(&self, group_id: &str, expense: NewExpense) -> Result<String, StoreError>;
}

/// Budgets and their monthly ledgers.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    async fn list_budgets_for_user(&self, identity: &UserIdentity) -> Result<Vec<BudgetDoc>, StoreError>;
    async fn get_or_create_month(&self, budget_id: &str, month_key: &str) -> Result<Month, StoreError>;
    async fn save_month(&self, budget_id: &str, month: Month) -> Result<(), StoreError>;
}

/// Per-day task plans.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_or_create_day_plan(
        &self,
        identity: &UserIdentity,
        date_key: &str,
        timezone: &str,
    ) -> Result<DayPlan, StoreError>;
    async fn save_plan(&self, identity: &UserIdentity, plan: DayPlan) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SavedItemStore: Send + Sync {
    async fn list_recent(&self, identity: &UserIdentity, limit: usize) -> Result<Vec<SavedItem>, StoreError>;
}

/// The four collaborators the pipeline reads from and writes to.
#[derive(Clone)]
pub struct Stores {
    pub expenses: Arc<dyn ExpenseStore>,
    pub budgets: Arc<dyn BudgetStore>,
    pub schedule: Arc<dyn ScheduleStore>,
    pub saved: Arc<dyn SavedItemStore>,
}

impl Stores {
    pub fn new(
        expenses: Arc<dyn ExpenseStore>,
        budgets: Arc<dyn BudgetStore>,
        schedule: Arc<dyn ScheduleStore>,
        saved: Arc<dyn SavedItemStore>,
    ) -> Self {
        Self { expenses, budgets, schedule, saved }
    }

    /// All four contracts served by one in-memory backend.
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    /// All four contracts served by one HTTP backend.
    pub fn http(store: Arc<HttpStores>) -> Self {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }
}
