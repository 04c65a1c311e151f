pub mod action_items;
pub mod strategy; // Rules vs model selection for callers and the CLI
