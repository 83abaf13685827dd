//! Server-rendered HTML.
//!
//! # Structure
//!
//! - [`layout`]: document shell, dashboard chrome, escaping
//! - [`pages`]: login, loading and unauthorized pages
//! - [`views`]: main-column content per dashboard view

pub mod layout;
pub mod pages;
pub mod views;
