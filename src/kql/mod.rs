//! KQL text generation
//!
//! Turns a visual expression plus the resolved column schema into the
//! pipe-stage query text the engine executes:
//!
//! ```text
//! Covid19
//! | where State == 'Texas'
//! | summarize sum_Deaths = sum(Deaths) by bin(Timestamp, $__interval)
//! ```
//!
//! Also builds the small helper queries the editor issues on its own,
//! like distinct-value suggestions for a filter control.

mod compile;
mod suggest;

pub use compile::{compile, INTERVAL_MACRO};
pub use suggest::suggestion_query;
