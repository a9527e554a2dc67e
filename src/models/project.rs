// Domain models - Project
use serde::{Deserialize, Serialize};

use super::{Expense, Report};

/// A construction project together with everything recorded for it
///
/// Every write replaces the whole document; there are no field-level updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Opaque id, assigned at creation and never reused
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl Project {
    /// Create an empty project with a fresh id.
    pub fn new(name: impl Into<String>, client: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, client)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            client: client.into(),
            reports: Vec::new(),
            expenses: Vec::new(),
        }
    }

    /// Sum of all expense amounts
    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Replace the report with the same id, or append it.
    pub fn upsert_report(&mut self, report: Report) {
        match self.reports.iter_mut().find(|r| r.id == report.id) {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
    }

    /// Replace the expense with the same id, or append it.
    pub fn upsert_expense(&mut self, expense: Expense) {
        match self.expenses.iter_mut().find(|e| e.id == expense.id) {
            Some(existing) => *existing = expense,
            None => self.expenses.push(expense),
        }
    }

    pub fn remove_report(&mut self, id: &str) -> bool {
        let before = self.reports.len();
        self.reports.retain(|r| r.id != id);
        self.reports.len() != before
    }

    /// Reject documents that must not be written, such as negative expenses.
    pub fn validate(&self) -> Result<(), String> {
        self.expenses.iter().try_for_each(Expense::validate)
    }
}
