use chrono::{Duration, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use super::Failure;
use crate::intent::{ClockTime, FlowTaskInput};
use crate::snapshot::Snapshot;
use crate::stores::{date_key, Stores, Task};

const MINUTES_PER_DAY: u32 = 24 * 60;

pub fn default_start() -> ClockTime {
    ClockTime::new(9, 0).unwrap_or_else(|| ClockTime::from_naive(chrono::NaiveTime::MIN))
}

pub async fn add_flow_task(
    stores: &Stores,
    input: &FlowTaskInput,
    snapshot: &Snapshot,
    timezone: &str,
    default_minutes: u32,
) -> Result<String, Failure> {
    if snapshot.user.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        return Err(Failure::new("no_user_id", "I need a signed-in user id to add tasks."));
    }

    let date = input.scheduled_for.map_or(snapshot.today, |d| d.resolve(snapshot.today));
    let key = date_key(date);
    let mut plan = stores
        .schedule
        .get_or_create_day_plan(&snapshot.user, &key, timezone)
        .await
        .map_err(|e| {
            warn!(date = %key, error = %e, "get_or_create_day_plan failed");
            Failure::new("store_error", "I couldn't open that day's plan. Please try again.")
        })?;

    let duration = input.duration_minutes.filter(|m| *m > 0).unwrap_or(default_minutes);
    let starts_at = input.starts_at.or_else(|| plan.last_end()).unwrap_or_else(default_start);
    let end = starts_at.minutes_since_midnight().checked_add(duration);
    if end.map_or(true, |end| end > MINUTES_PER_DAY) {
        return Err(Failure::new(
            "past_midnight",
            "That task would run past midnight. Try an earlier start or a shorter duration.",
        ));
    }
    let ends_at = starts_at.plus_minutes(duration);

    let title = input
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "Task".to_string());
    let task = Task {
        id: Uuid::new_v4().to_string(),
        sequence: plan.next_sequence(),
        title: title.clone(),
        starts_at,
        ends_at,
        duration_minutes: duration,
        category: input.category.clone(),
        done: false,
    };
    let sequence = task.sequence;
    plan.tasks.push(task);

    stores.schedule.save_plan(&snapshot.user, plan).await.map_err(|e| {
        warn!(date = %key, error = %e, "save_plan failed");
        Failure::new("store_error", "I couldn't save the task. Please try again.")
    })?;
    info!(date = %key, sequence, duration, "task written");

    Ok(format!(
        "Scheduled \"{title}\" {} from {starts_at} to {ends_at}.",
        relative_day(date, snapshot.today)
    ))
}

fn relative_day(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "today".to_string()
    } else if date == today + Duration::days(1) {
        "tomorrow".to_string()
    } else {
        format!("on {}", date.format("%a, %b %-d"))
    }
}
