//! Backend REST API access.
//!
//! - [`ApiClient`]: authenticated HTTP client with the global 401 policy
//! - [`ApiError`]: failure taxonomy surfaced to views
//! - [`types`]: wire DTOs

mod client;
mod error;
pub mod types;

pub use client::{
    ApiClient, CustomersApi, LOG_PAGE_SIZE, LogsApi, OrdersApi, ProductsApi, StaffApi, StatsApi,
};
pub use error::{ApiError, UNREACHABLE};
