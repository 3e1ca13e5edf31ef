pub mod auth;
pub mod study;
pub mod vocabulary;
