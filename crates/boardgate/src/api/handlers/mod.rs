//! HTTP request handlers.

pub mod auth;
pub mod boards;
pub mod misc;
pub mod projects;
pub mod workspaces;
