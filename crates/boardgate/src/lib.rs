//! Authentication gateway in front of the board adapter service.

pub mod adapter;
pub mod api;
pub mod audit;
pub mod auth;
pub mod settings;
