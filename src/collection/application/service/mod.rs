pub mod coordinator_service;
pub mod fetch_service;
