pub mod handler;
pub mod models;
mod repository;
pub mod service;
mod summary_repository;
