pub mod dao;
pub mod error;
pub mod http;
pub mod logger;
pub mod mail;
pub mod setting;
pub mod sqlite;
