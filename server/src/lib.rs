// src/lib.rs

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod metadata;
pub mod naming;
pub mod service;
pub mod storage;
