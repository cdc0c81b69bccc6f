//! HTTP handlers

pub mod auth;
pub mod gifify;
pub mod health;
pub mod tinify;
pub mod upload;
