// Domain models - Re-exports all project document types
//
// A Project is the unit of storage and synchronization. Reports and expenses
// are embedded in it and never stored or synced on their own:
// - project.rs: Project (the stored document)
// - report.rs: Daily activity reports, crew and photos
// - expense.rs: Expenses and their fixed category set

mod expense;
mod project;
mod report;

pub use expense::{Expense, ExpenseCategory};
pub use project::Project;
pub use report::{Photo, Report, TeamMember};
