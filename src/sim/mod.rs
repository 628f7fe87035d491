/// Decision providers: local heuristic and remote policy.
pub mod decision;
pub mod engine;
pub mod error;
/// Per-step history series.
pub mod history;
pub mod kpi;
/// Fixed-format settlement log blocks.
pub mod log;
/// Storage movement and token settlement for a single step.
pub mod settlement;
pub mod types;
