use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::Failure;
use crate::extract::amount::format_money;
use crate::extract::fuzzy::{match_entity, EntityMatch};
use crate::intent::{BudgetEntryInput, EntryKind};
use crate::snapshot::{BudgetRef, Snapshot};
use crate::stores::{month_key, LedgerEntry, Stores};

pub async fn add_budget_entry(
    stores: &Stores,
    input: &BudgetEntryInput,
    snapshot: &Snapshot,
) -> Result<String, Failure> {
    let budget = target_budget(input, snapshot)?;
    let amount_minor = input
        .amount_minor
        .filter(|a| *a > 0)
        .ok_or_else(|| Failure::new("invalid_amount", "I need a positive amount for the budget entry."))?;
    let currency = input.currency.clone().unwrap_or_else(|| budget.currency.clone());
    // ledger entries carry no currency of their own
    if !currency.eq_ignore_ascii_case(&budget.currency) {
        return Err(Failure::new(
            "currency_mismatch",
            format!("{} is kept in {}, so I can't add a {currency} amount to it.", budget.title, budget.currency),
        ));
    }

    let occurred_on = input.occurred_on.map_or(snapshot.today, |d| d.resolve(snapshot.today));
    let key = month_key(occurred_on);
    let mut month = stores.budgets.get_or_create_month(&budget.id, &key).await.map_err(|e| {
        warn!(budget_id = %budget.id, month = %key, error = %e, "get_or_create_month failed");
        Failure::new("store_error", "I couldn't open that budget month. Please try again.")
    })?;

    let description = input
        .description
        .clone()
        .or_else(|| input.category.clone())
        .unwrap_or_else(|| match input.kind {
            EntryKind::Income => "income".to_string(),
            EntryKind::Expense => "entry".to_string(),
        });
    let entry = LedgerEntry {
        id: Uuid::new_v4().to_string(),
        amount_minor,
        description: description.clone(),
        category: input.category.clone(),
        merchant: input.merchant.clone(),
        kind: input.kind,
        occurred_on,
        created_at: Utc::now(),
    };
    month.entries.insert(0, entry);
    if input.kind == EntryKind::Income {
        month.income_minor += amount_minor;
    }

    stores.budgets.save_month(&budget.id, month).await.map_err(|e| {
        warn!(budget_id = %budget.id, month = %key, error = %e, "save_month failed");
        Failure::new("store_error", "I couldn't save the budget entry. Please try again.")
    })?;
    info!(budget_id = %budget.id, month = %key, amount_minor, "budget entry written");

    let money = format_money(amount_minor, &currency);
    Ok(match input.kind {
        EntryKind::Income => format!("Recorded {money} income in {}.", budget.title),
        EntryKind::Expense => format!("Added {money} to {} for {description}.", budget.title),
    })
}

/// Explicit id, then the hint, then the active budget.
fn target_budget(input: &BudgetEntryInput, snapshot: &Snapshot) -> Result<BudgetRef, Failure> {
    if let Some(id) = &input.budget_id {
        return Ok(snapshot.budget(id).cloned().unwrap_or_else(|| BudgetRef {
            id: id.clone(),
            title: "your budget".to_string(),
            currency: snapshot.default_currency.clone(),
        }));
    }
    if let Some(hint) = &input.budget_hint {
        if let EntityMatch::Matched { index, .. } = match_entity(hint, &snapshot.budget_titles()) {
            if let Some(budget) = snapshot.budgets.get(index) {
                return Ok(budget.clone());
            }
        }
    }
    snapshot
        .active_budget_ref()
        .or_else(|| match snapshot.budgets.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        })
        .ok_or_else(|| Failure::new("no_budget", "I couldn't tell which budget to use."))
}
