pub mod app;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod installer;
pub mod ui;
