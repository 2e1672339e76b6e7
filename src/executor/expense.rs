use chrono::NaiveDate;
use tracing::{info, warn};

use super::Failure;
use crate::extract::amount::{format_money, to_major};
use crate::extract::fuzzy::{match_entity, EntityMatch};
use crate::extract::list_names;
use crate::intent::ExpenseInput;
use crate::snapshot::{GroupSnapshot, Snapshot};
use crate::stores::{Member, NewExpense, Split, SplitPercentage, Stores, UserIdentity};

pub async fn add_expense(stores: &Stores, input: &ExpenseInput, snapshot: &Snapshot) -> Result<String, Failure> {
    let amount_minor = input
        .amount_minor
        .filter(|a| *a > 0)
        .ok_or_else(|| Failure::new("invalid_amount", "I need a positive amount to add an expense."))?;
    let group = target_group(input, snapshot)?;
    let currency = input.currency.clone().unwrap_or_else(|| group.currency.clone());

    let participants = participants(input, group, &snapshot.user)?;
    let splits = even_splits(amount_minor, &participants);
    let payer = payer(input.payer_hint.as_deref(), group, &participants, &snapshot.user)
        .ok_or_else(|| Failure::new("no_participants", format!("Nobody in {} can pay for this.", group.name)))?;
    let occurred_at: NaiveDate = input.occurred_on.map_or(snapshot.today, |d| d.resolve(snapshot.today));
    let description = input.description.clone().unwrap_or_else(|| "Expense".to_string());

    let share = 100.0 / participants.len() as f64;
    let expense = NewExpense {
        description: description.clone(),
        amount_major: to_major(amount_minor, &currency),
        currency: currency.clone(),
        payer_id: payer.id.clone(),
        split_percentages: participants
            .iter()
            .map(|m| SplitPercentage { member_id: m.id.clone(), percent: share })
            .collect(),
        occurred_at,
        amount_minor,
        splits_minor: splits,
    };

    let id = stores.expenses.append_expense(&group.id, expense).await.map_err(|e| {
        warn!(group_id = %group.id, error = %e, "append_expense failed");
        Failure::new("store_error", "I couldn't save the expense. Please try again.")
    })?;
    info!(group_id = %group.id, expense_id = %id, amount_minor, "expense written");

    Ok(format!(
        "Added {} to {} for {}, paid by {} and split {} ways.",
        format_money(amount_minor, &currency),
        group.name,
        description,
        payer.name,
        participants.len()
    ))
}

fn target_group<'a>(input: &ExpenseInput, snapshot: &'a Snapshot) -> Result<&'a GroupSnapshot, Failure> {
    if snapshot.groups.is_empty() {
        return Err(Failure::new("no_group", "You don't have any expense groups yet."));
    }
    if let Some(id) = &input.group_id {
        return snapshot
            .group(id)
            .ok_or_else(|| Failure::new("no_group", "That group is no longer available."));
    }
    if let Some(hint) = &input.group_hint {
        let names = snapshot.group_names();
        if let EntityMatch::Matched { index, .. } = match_entity(hint, &names) {
            if let Some(group) = snapshot.groups.get(index) {
                return Ok(group);
            }
        }
        return Err(Failure::new(
            "no_group",
            format!("I couldn't match \"{hint}\" to a group. You have groups: {}.", list_names(&names)),
        ));
    }
    match snapshot.groups.as_slice() {
        [only] => Ok(only),
        _ => Err(Failure::new(
            "no_group",
            format!("Which group is this for? You have groups: {}.", list_names(&snapshot.group_names())),
        )),
    }
}

fn is_requester(member: &Member, user: &UserIdentity) -> bool {
    let same_id = user.id.as_deref().is_some_and(|id| id == member.id);
    let same_email = match (&user.email, &member.email) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    };
    same_id || same_email
}

/// Display name, first name, or email local part, case-insensitive.
fn find_member<'a>(hint: &str, members: &'a [Member], user: &UserIdentity) -> Option<&'a Member> {
    if matches!(hint.to_lowercase().as_str(), "me" | "i" | "myself") {
        return members.iter().find(|m| is_requester(m, user));
    }
    let hint = hint.to_lowercase();
    members
        .iter()
        .find(|m| m.name.to_lowercase() == hint)
        .or_else(|| {
            members
                .iter()
                .find(|m| m.name.split_whitespace().next().is_some_and(|first| first.to_lowercase() == hint))
        })
        .or_else(|| {
            members.iter().find(|m| {
                m.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .is_some_and(|local| local.eq_ignore_ascii_case(&hint))
            })
        })
}

/// Named people plus the requester, or the whole group when nobody is named.
fn participants<'a>(input: &ExpenseInput, group: &'a GroupSnapshot, user: &UserIdentity) -> Result<Vec<&'a Member>, Failure> {
    if group.members.is_empty() {
        return Err(Failure::new(
            "no_participants",
            format!("{} has no members to split this with.", group.name),
        ));
    }
    if input.participant_hints.is_empty() {
        return Ok(group.members.iter().collect());
    }

    let mut chosen: Vec<&Member> = Vec::new();
    let mut unknown: Vec<&str> = Vec::new();
    for hint in &input.participant_hints {
        match find_member(hint, &group.members, user) {
            Some(member) if !chosen.iter().any(|c| c.id == member.id) => chosen.push(member),
            Some(_) => {}
            None => unknown.push(hint),
        }
    }
    if !unknown.is_empty() {
        return Err(Failure::new(
            "unknown_participant",
            format!("I couldn't find {} in {}.", list_names(&unknown), group.name),
        ));
    }
    if let Some(me) = group.members.iter().find(|m| is_requester(m, user)) {
        if !chosen.iter().any(|c| c.id == me.id) {
            chosen.insert(0, me);
        }
    }
    Ok(chosen)
}

/// Equal shares in minor units; leftover units go one each to the first
/// participants so the splits always sum to the amount.
pub fn even_splits(amount_minor: i64, participants: &[&Member]) -> Vec<Split> {
    let n = participants.len() as i64;
    if n == 0 {
        return Vec::new();
    }
    let (base, remainder) = (amount_minor / n, amount_minor % n);
    participants
        .iter()
        .enumerate()
        .map(|(i, m)| Split {
            member_id: m.id.clone(),
            amount_minor: base + i64::from((i as i64) < remainder),
        })
        .collect()
}

fn payer<'a>(
    hint: Option<&str>,
    group: &'a GroupSnapshot,
    participants: &[&'a Member],
    user: &UserIdentity,
) -> Option<&'a Member> {
    if let Some(member) = hint.and_then(|h| find_member(h, &group.members, user)) {
        return Some(member);
    }
    if hint.is_some() {
        warn!(group_id = %group.id, "payer hint did not match a member");
    }
    group
        .members
        .iter()
        .find(|m| is_requester(m, user))
        .or_else(|| participants.first().copied())
}
