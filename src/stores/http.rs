use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::*;
use super::{BudgetStore, ExpenseStore, SavedItemStore, ScheduleStore};
use crate::error::StoreError;

/// Store contracts over a hosted JSON document API.
///
/// Layout, relative to the base URL:
/// `users/{user}/groups`, `groups/{id}/expenses`, `users/{user}/budgets`,
/// `budgets/{id}/months/{YYYY-MM}`, `users/{user}/plans/{YYYY-MM-DD}`,
/// `users/{user}/saved?limit=N`. Missing month and plan documents read as
/// empty and are created on first save.
#[derive(Clone)]
pub struct HttpStores {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

impl HttpStores {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid store url {base_url:?}: {e}")))?;
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("store url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn user_key(identity: &UserIdentity) -> Result<&str, StoreError> {
        identity.key().ok_or_else(|| StoreError::Rejected("no user identity".to_string()))
    }

    /// `None` on 404.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, StoreError> {
        debug!(%url, "store GET");
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.error_for_status()?.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn put_json<T: Serialize>(&self, url: Url, body: &T) -> Result<(), StoreError> {
        debug!(%url, "store PUT");
        self.client.put(url).json(body).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ExpenseStore for HttpStores {
    async fn list_groups_for_user(&self, identity: &UserIdentity) -> Result<Vec<Group>, StoreError> {
        let url = self.url(&["users", Self::user_key(identity)?, "groups"])?;
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, StoreError> {
        let url = self.url(&["groups", group_id, "expenses"])?;
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    async fn append_expense(&self, group_id: &str, expense: NewExpense) -> Result<String, StoreError> {
        let url = self.url(&["groups", group_id, "expenses"])?;
        debug!(%url, "store POST");
        let response = self.client.post(url).json(&expense).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("group {group_id}")));
        }
        let body = response.error_for_status()?.text().await?;
        let created: CreatedResponse = serde_json::from_str(&body)?;
        Ok(created.id)
    }
}

#[async_trait]
impl BudgetStore for HttpStores {
    async fn list_budgets_for_user(&self, identity: &UserIdentity) -> Result<Vec<BudgetDoc>, StoreError> {
        let url = self.url(&["users", Self::user_key(identity)?, "budgets"])?;
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    async fn get_or_create_month(&self, budget_id: &str, month_key: &str) -> Result<Month, StoreError> {
        let url = self.url(&["budgets", budget_id, "months", month_key])?;
        Ok(self.get_json(url).await?.unwrap_or_else(|| Month::empty(month_key)))
    }

    async fn save_month(&self, budget_id: &str, month: Month) -> Result<(), StoreError> {
        let url = self.url(&["budgets", budget_id, "months", &month.key])?;
        self.put_json(url, &month).await
    }
}

#[async_trait]
impl ScheduleStore for HttpStores {
    async fn get_or_create_day_plan(
        &self,
        identity: &UserIdentity,
        date_key: &str,
        timezone: &str,
    ) -> Result<DayPlan, StoreError> {
        let mut url = self.url(&["users", Self::user_key(identity)?, "plans", date_key])?;
        url.query_pairs_mut().append_pair("timezone", timezone);
        let plan = self.get_json(url).await?.unwrap_or_else(|| DayPlan {
            date_key: date_key.to_string(),
            timezone: timezone.to_string(),
            tasks: Vec::new(),
        });
        Ok(plan)
    }

    async fn save_plan(&self, identity: &UserIdentity, plan: DayPlan) -> Result<(), StoreError> {
        let url = self.url(&["users", Self::user_key(identity)?, "plans", &plan.date_key])?;
        self.put_json(url, &plan).await
    }
}

#[async_trait]
impl SavedItemStore for HttpStores {
    async fn list_recent(&self, identity: &UserIdentity, limit: usize) -> Result<Vec<SavedItem>, StoreError> {
        let mut url = self.url(&["users", Self::user_key(identity)?, "saved"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        Ok(self.get_json(url).await?.unwrap_or_default())
    }
}
