//! Wire types exchanged with the shop backend.
//!
//! The backend is MongoDB-backed, so most documents carry `_id`; some newer
//! endpoints answer with `id`. Both are accepted everywhere.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::session::Role;

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_category() -> String {
    "General".to_string()
}

/// Body of product create/update requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_category")]
    pub category: String,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    #[serde(default)]
    pub qty: u32,
}

/// An order as listed by `GET /orders`.
///
/// `status` stays a string so an unexpected value from the backend does not
/// break the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total: f64,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Order {
    /// Short human reference: last six characters of the id, upper-cased.
    #[must_use]
    pub fn reference(&self) -> String {
        let chars: Vec<char> = self.id.chars().collect();
        let start = chars.len().saturating_sub(6);
        chars[start..].iter().collect::<String>().to_uppercase()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

// =============================================================================
// Users
// =============================================================================

/// A staff account from `GET /admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl AdminUser {
    #[must_use]
    pub fn is_superadmin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case(Role::Superadmin.as_str()))
    }
}

/// A shopper account from `GET /auth/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Customer {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("(unnamed)")
    }
}

/// Body of `POST /admin/register`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAdmin {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// `POST /admin/register` answers either `{admin: {...}}` or the admin itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    Wrapped { admin: AdminUser },
    Bare(AdminUser),
}

impl RegisterResponse {
    #[must_use]
    pub fn into_admin(self) -> AdminUser {
        match self {
            Self::Wrapped { admin } | Self::Bare(admin) => admin,
        }
    }
}

// =============================================================================
// Activity logs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub action_type: String,
    #[serde(default)]
    pub target_id: Option<String>,
    /// Either a populated `{username}` document or a bare id.
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub is_archived: bool,
}

impl ActivityLog {
    /// Username of whoever performed the action, if the backend populated it.
    #[must_use]
    pub fn actor(&self) -> &str {
        self.user_id
            .as_ref()
            .and_then(|u| u.get("username"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
    }
}

/// One page of `GET /admin/system-logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
    #[serde(default)]
    pub logs: Vec<ActivityLog>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
}

fn first_page() -> u32 {
    1
}

impl Default for LogPage {
    fn default() -> Self {
        Self {
            logs: Vec::new(),
            page: 1,
            pages: 1,
        }
    }
}

/// Action types the audit log can be filtered by.
pub const LOG_ACTION_TYPES: [&str; 8] = [
    "LOGIN",
    "CREATE_PRODUCT",
    "UPDATE_PRODUCT",
    "DELETE_PRODUCT",
    "UPDATE_ORDER",
    "CREATE_ADMIN",
    "DELETE_ADMIN",
    "ROLE_CHANGE",
];

// =============================================================================
// Analytics and monitoring
// =============================================================================

/// `GET /analytics/stats`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    #[serde(default)]
    pub overview: AnalyticsOverview,
    #[serde(default)]
    pub top_purchased: Vec<TopPurchased>,
    #[serde(default)]
    pub top_browsed: Vec<TopBrowsed>,
    #[serde(default)]
    pub low_stock: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub total_orders: u64,
    /// Sent as `"3.4%"` by some backend versions and as a number by others.
    #[serde(default, deserialize_with = "string_or_number")]
    pub conversion_rate: String,
    #[serde(default)]
    pub views_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPurchased {
    /// Product name; the aggregation groups by name into `_id`.
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(default)]
    pub total_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopBrowsed {
    pub name: String,
    #[serde(default)]
    pub views: u64,
}

/// `GET /admin/stats` body. Only `summary` feeds the health overview; the
/// chart series alongside it are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminStatsResponse {
    pub summary: DashboardStats,
}

/// Headline numbers for the health overview.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub low_stock_count: u64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
