//! Aggregation, correlation, forecasting and question answering over the
//! merged dataset.

pub mod aggregate;
pub mod correlation;
pub mod forecast;
pub mod query;

pub use aggregate::Scope;
pub use correlation::{CompletionPolicy, Correlation};
pub use forecast::ModelKind;
