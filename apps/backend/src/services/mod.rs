pub mod auth;
pub mod study;
