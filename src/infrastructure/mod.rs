pub mod cache;
pub mod connectivity;
pub mod database;
pub mod http;
pub mod notification;
pub mod offline;
