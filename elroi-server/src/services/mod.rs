pub mod auth_service;
pub mod conversation_store;
pub mod like_ledger;
pub mod match_detector;
pub mod token_service;
pub mod user_directory;
