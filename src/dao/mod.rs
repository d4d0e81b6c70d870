/// Match store abstraction and its backends.
pub mod match_store;
/// Database model definitions.
pub mod models;
