//! Terminal rendering of run results.

mod dashboard;

pub use dashboard::{render_dashboard, render_empty};
