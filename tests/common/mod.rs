#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use pocketplan::snapshot::{BudgetRef, GroupSnapshot, Snapshot};
use pocketplan::stores::{BudgetDoc, Fixture, Group, Member, MemoryStore, SavedItem, Stores, UserIdentity};
use pocketplan::AssistantConfig;

/// A Wednesday.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
}

pub fn me() -> UserIdentity {
    UserIdentity::new("u-me").with_email("jordan@example.com")
}

pub fn member(id: &str, name: &str) -> Member {
    Member { id: id.to_string(), name: name.to_string(), email: Some(format!("{}@example.com", name.to_lowercase())) }
}

pub fn roommates() -> Group {
    Group {
        id: "g-room".to_string(),
        name: "Roommates".to_string(),
        currency: "USD".to_string(),
        members: vec![member("u-me", "Jordan"), member("u-alice", "Alice"), member("u-bob", "Bob")],
    }
}

pub fn ski_trip() -> Group {
    Group {
        id: "g-ski".to_string(),
        name: "Ski Trip".to_string(),
        currency: "USD".to_string(),
        members: vec![member("u-me", "Jordan"), member("u-sam", "Sam"), member("u-alice", "Alice")],
    }
}

pub fn travel_fund() -> BudgetDoc {
    BudgetDoc { id: "b-travel".to_string(), title: "Travel Fund".to_string(), currency: "USD".to_string(), active: true }
}

pub fn household() -> BudgetDoc {
    BudgetDoc { id: "b-home".to_string(), title: "Household".to_string(), currency: "USD".to_string(), active: false }
}

pub fn saved_item(id: &str, day: u32) -> SavedItem {
    SavedItem {
        id: id.to_string(),
        title: format!("Article {id}"),
        url: format!("https://example.com/{id}"),
        saved_at: Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap(),
    }
}

pub fn fixture() -> Fixture {
    Fixture {
        groups: vec![roommates(), ski_trip()],
        expenses: HashMap::new(),
        budgets: vec![travel_fund(), household()],
        months: HashMap::new(),
        plans: Vec::new(),
        saved_items: vec![saved_item("s1", 19), saved_item("s2", 20)],
    }
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_fixture(fixture()))
}

pub fn stores(store: &Arc<MemoryStore>) -> Stores {
    Stores::in_memory(store.clone())
}

pub fn config() -> AssistantConfig {
    AssistantConfig::default()
}

pub fn group_snapshot(group: Group) -> GroupSnapshot {
    GroupSnapshot {
        id: group.id,
        name: group.name,
        currency: group.currency,
        members: group.members,
        balances: Vec::new(),
        recent_expenses: Vec::new(),
    }
}

/// Hand-built snapshot for the pure planner and extractor tests.
pub fn snapshot_with(groups: Vec<Group>, budgets: Vec<BudgetDoc>) -> Snapshot {
    let mut snapshot = Snapshot::empty(me(), today(), "USD");
    snapshot.groups = groups.into_iter().map(group_snapshot).collect();
    snapshot.budgets = budgets.iter().map(BudgetRef::from).collect();
    snapshot
}

pub fn snapshot() -> Snapshot {
    snapshot_with(vec![roommates(), ski_trip()], vec![travel_fund(), household()])
}
