pub mod account;
pub mod delegation;
pub mod employee;
pub mod profile;
pub mod request;
pub mod service;
pub mod status;
pub mod workflow;
