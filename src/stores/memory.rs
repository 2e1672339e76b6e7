use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::types::*;
use super::{BudgetStore, ExpenseStore, SavedItemStore, ScheduleStore};
use crate::error::StoreError;

/// Seed data for [`MemoryStore`], usually read from a JSON fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub groups: Vec<Group>,
    /// Keyed by group id.
    pub expenses: HashMap<String, Vec<Expense>>,
    pub budgets: Vec<BudgetDoc>,
    /// Keyed by budget id.
    pub months: HashMap<String, Vec<Month>>,
    pub plans: Vec<DayPlan>,
    pub saved_items: Vec<SavedItem>,
}

impl Fixture {
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreArea {
    Expenses,
    Budgets,
    Schedule,
    Saved,
}

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    expenses: HashMap<String, Vec<Expense>>,
    budgets: Vec<BudgetDoc>,
    months: HashMap<(String, String), Month>,
    plans: HashMap<String, DayPlan>,
    saved_items: Vec<SavedItem>,
    down: Vec<StoreArea>,
}

/// One user's documents held in process. Backs the CLI's fixture mode and
/// doubles as the test fake: every call is counted and any area can be
/// switched to "unavailable".
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let months = fixture
            .months
            .into_iter()
            .flat_map(|(budget_id, months)| {
                months.into_iter().map(move |m| ((budget_id.clone(), m.key.clone()), m))
            })
            .collect();
        let plans = fixture.plans.into_iter().map(|p| (p.date_key.clone(), p)).collect();
        let state = State {
            groups: fixture.groups,
            expenses: fixture.expenses,
            budgets: fixture.budgets,
            months,
            plans,
            saved_items: fixture.saved_items,
            down: Vec::new(),
        };
        Self { state: Mutex::new(state), ..Self::default() }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.read_count() + self.write_count()
    }

    /// Make every call touching `area` fail with `StoreError::Unavailable`.
    pub async fn set_unavailable(&self, area: StoreArea, down: bool) {
        let mut state = self.state.lock().await;
        state.down.retain(|a| *a != area);
        if down {
            state.down.push(area);
        }
    }

    pub async fn month(&self, budget_id: &str, month_key: &str) -> Option<Month> {
        let state = self.state.lock().await;
        state.months.get(&(budget_id.to_string(), month_key.to_string())).cloned()
    }

    pub async fn day_plan(&self, date_key: &str) -> Option<DayPlan> {
        self.state.lock().await.plans.get(date_key).cloned()
    }

    pub async fn expenses(&self, group_id: &str) -> Vec<Expense> {
        self.state.lock().await.expenses.get(group_id).cloned().unwrap_or_default()
    }

    fn check(state: &State, area: StoreArea) -> Result<(), StoreError> {
        if state.down.contains(&area) {
            return Err(StoreError::Unavailable(format!("{area:?} store is down")));
        }
        Ok(())
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn list_groups_for_user(&self, _identity: &UserIdentity) -> Result<Vec<Group>, StoreError> {
        self.read();
        let state = self.state.lock().await;
        Self::check(&state, StoreArea::Expenses)?;
        Ok(state.groups.clone())
    }

    async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, StoreError> {
        self.read();
        let state = self.state.lock().await;
        Self::check(&state, StoreArea::Expenses)?;
        Ok(state.expenses.get(group_id).cloned().unwrap_or_default())
    }

    async fn append_expense(&self, group_id: &str, expense: NewExpense) -> Result<String, StoreError> {
        self.write();
        let mut state = self.state.lock().await;
        Self::check(&state, StoreArea::Expenses)?;
        if !state.groups.iter().any(|g| g.id == group_id) {
            return Err(StoreError::NotFound(format!("group {group_id}")));
        }
        let id = Uuid::new_v4().to_string();
        let record = Expense {
            id: id.clone(),
            description: expense.description,
            amount_minor: expense.amount_minor,
            currency: expense.currency,
            payer_id: expense.payer_id,
            splits: expense.splits_minor,
            occurred_at: expense.occurred_at,
        };
        state.expenses.entry(group_id.to_string()).or_default().push(record);
        Ok(id)
    }
}

#[async_trait]
impl BudgetStore for MemoryStore {
    async fn list_budgets_for_user(&self, _identity: &UserIdentity) -> Result<Vec<BudgetDoc>, StoreError> {
        self.read();
        let state = self.state.lock().await;
        Self::check(&state, StoreArea::Budgets)?;
        Ok(state.budgets.clone())
    }

    async fn get_or_create_month(&self, budget_id: &str, month_key: &str) -> Result<Month, StoreError> {
        self.read();
        let mut state = self.state.lock().await;
        Self::check(&state, StoreArea::Budgets)?;
        if !state.budgets.iter().any(|b| b.id == budget_id) {
            return Err(StoreError::NotFound(format!("budget {budget_id}")));
        }
        let month = state
            .months
            .entry((budget_id.to_string(), month_key.to_string()))
            .or_insert_with(|| Month::empty(month_key));
        Ok(month.clone())
    }

    async fn save_month(&self, budget_id: &str, month: Month) -> Result<(), StoreError> {
        self.write();
        let mut state = self.state.lock().await;
        Self::check(&state, StoreArea::Budgets)?;
        state.months.insert((budget_id.to_string(), month.key.clone()), month);
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get_or_create_day_plan(
        &self,
        _identity: &UserIdentity,
        date_key: &str,
        timezone: &str,
    ) -> Result<DayPlan, StoreError> {
        self.read();
        let mut state = self.state.lock().await;
        Self::check(&state, StoreArea::Schedule)?;
        let plan = state.plans.entry(date_key.to_string()).or_insert_with(|| DayPlan {
            date_key: date_key.to_string(),
            timezone: timezone.to_string(),
            tasks: Vec::new(),
        });
        Ok(plan.clone())
    }

    async fn save_plan(&self, _identity: &UserIdentity, plan: DayPlan) -> Result<(), StoreError> {
        self.write();
        let mut state = self.state.lock().await;
        Self::check(&state, StoreArea::Schedule)?;
        state.plans.insert(plan.date_key.clone(), plan);
        Ok(())
    }
}

#[async_trait]
impl SavedItemStore for MemoryStore {
    async fn list_recent(&self, _identity: &UserIdentity, limit: usize) -> Result<Vec<SavedItem>, StoreError> {
        self.read();
        let state = self.state.lock().await;
        Self::check(&state, StoreArea::Saved)?;
        let mut items = state.saved_items.clone();
        items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        items.truncate(limit);
        Ok(items)
    }
}
