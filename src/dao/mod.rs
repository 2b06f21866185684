/// Arena document storage and retrieval operations.
pub mod state_store;
/// Storage errors and low level file helpers.
pub mod storage;
