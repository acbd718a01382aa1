pub mod app;
pub mod archive;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod layout;
pub mod output;
pub mod restore;
