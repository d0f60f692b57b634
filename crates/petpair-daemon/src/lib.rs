pub mod api;
pub mod config;
pub mod pet;
pub mod service;
pub mod storage;
