pub mod activation_service;
pub mod paginator;
pub mod payment_service;
pub mod posting_service;
pub mod query_builder;
pub mod storage_service;
