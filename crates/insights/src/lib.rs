pub mod calculator;
pub mod handler;
pub mod service;
