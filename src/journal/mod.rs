pub mod calendar;
pub mod chat;
pub mod debounce;
pub mod editor;
pub mod reconcile;
pub mod stats;
pub mod store;
pub mod types;
