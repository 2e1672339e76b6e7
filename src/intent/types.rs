use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    AddExpense,
    AddBudgetEntry,
    AddFlowTask,
    SummarizeState,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::AddExpense => "add_expense",
            ToolName::AddBudgetEntry => "add_budget_entry",
            ToolName::AddFlowTask => "add_flow_task",
            ToolName::SummarizeState => "summarize_state",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_expense" => Ok(ToolName::AddExpense),
            "add_budget_entry" => Ok(ToolName::AddBudgetEntry),
            "add_flow_task" => Ok(ToolName::AddFlowTask),
            "summarize_state" => Ok(ToolName::SummarizeState),
            other => Err(format!("unknown tool {other:?}")),
        }
    }
}

/// A day reference as the user phrased it, resolved against "today" only
/// when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DateHint {
    Today,
    Tomorrow,
    Yesterday,
    On(NaiveDate),
}

impl DateHint {
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            DateHint::Today => today,
            DateHint::Tomorrow => today + Duration::days(1),
            DateHint::Yesterday => today - Duration::days(1),
            DateHint::On(date) => *date,
        }
    }
}

impl fmt::Display for DateHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateHint::Today => f.write_str("today"),
            DateHint::Tomorrow => f.write_str("tomorrow"),
            DateHint::Yesterday => f.write_str("yesterday"),
            DateHint::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for DateHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "tonight" => Ok(DateHint::Today),
            "tomorrow" => Ok(DateHint::Tomorrow),
            "yesterday" => Ok(DateHint::Yesterday),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(DateHint::On)
                .map_err(|_| format!("unrecognized date {s:?}")),
        }
    }
}

impl From<DateHint> for String {
    fn from(hint: DateHint) -> Self {
        hint.to_string()
    }
}

impl TryFrom<String> for DateHint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Wall-clock time of day, rendered as `3:00pm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// Wraps past midnight.
    pub fn plus_minutes(&self, minutes: u32) -> Self {
        let total = (self.minutes_since_midnight() + minutes % (24 * 60)) % (24 * 60);
        Self { hour: total / 60, minute: total % 60 }
    }

    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        Self { hour: time.hour(), minute: time.minute() }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meridiem = if self.hour < 12 { "am" } else { "pm" };
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{}:{:02}{}", hour, self.minute, meridiem)
    }
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase().replace(' ', "");
        let (body, meridiem) = if let Some(b) = raw.strip_suffix("am") {
            (b, Some(false))
        } else if let Some(b) = raw.strip_suffix("pm") {
            (b, Some(true))
        } else {
            (raw.as_str(), None)
        };
        let (h, m) = match body.split_once(':') {
            Some((h, m)) => (h, m),
            None => (body, "0"),
        };
        let bad = || format!("unrecognized time {s:?}");
        let mut hour: u32 = h.parse().map_err(|_| bad())?;
        let minute: u32 = m.parse().map_err(|_| bad())?;
        match meridiem {
            Some(pm) => {
                if hour == 0 || hour > 12 {
                    return Err(bad());
                }
                hour = match (hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                };
            }
            None if hour > 23 => return Err(bad()),
            None => {}
        }
        ClockTime::new(hour, minute).ok_or_else(bad)
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Expense,
    Income,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    /// Group name as the user phrased it.
    pub group_hint: Option<String>,
    /// Set once the hint resolved against a known group.
    pub group_id: Option<String>,
    #[serde(default)]
    pub participant_hints: Vec<String>,
    pub payer_hint: Option<String>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub occurred_on: Option<DateHint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetEntryInput {
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub budget_hint: Option<String>,
    pub budget_id: Option<String>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub occurred_on: Option<DateHint>,
    #[serde(default)]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowTaskInput {
    pub title: Option<String>,
    pub scheduled_for: Option<DateHint>,
    pub starts_at: Option<ClockTime>,
    pub duration_minutes: Option<u32>,
    /// meeting, call, focus, ... when the utterance names one.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarizeInput {
    pub reason: Option<String>,
}

/// What the user asked for, tagged by the tool that will carry it out.
///
/// Every input field is optional: extraction is partial, and executors
/// check for what they need before touching a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "input", rename_all = "snake_case")]
pub enum Intent {
    AddExpense(ExpenseInput),
    AddBudgetEntry(BudgetEntryInput),
    AddFlowTask(FlowTaskInput),
    SummarizeState(SummarizeInput),
}

impl Intent {
    pub fn tool(&self) -> ToolName {
        match self {
            Intent::AddExpense(_) => ToolName::AddExpense,
            Intent::AddBudgetEntry(_) => ToolName::AddBudgetEntry,
            Intent::AddFlowTask(_) => ToolName::AddFlowTask,
            Intent::SummarizeState(_) => ToolName::SummarizeState,
        }
    }

    pub fn unrecognized(reason: impl Into<String>) -> Self {
        Intent::SummarizeState(SummarizeInput { reason: Some(reason.into()) })
    }
}
