pub mod channels;
pub mod chat;
pub mod config;
pub mod error;
pub mod i18n;
pub mod providers;
