//! Main-column content for each dashboard view.
//!
//! Renderers only read controller snapshots. Role-gated controls are left out
//! entirely when the operator's role may not use them.

use super::layout::{error_banner, escape};
use crate::access::{Action, View};
use crate::api::types::{
    ActivityLog, AdminUser, AnalyticsStats, Customer, DashboardStats, LOG_ACTION_TYPES, LogPage,
    Order, OrderStatus, Product,
};
use crate::session::{Role, SessionStore};
use crate::views::{LogQuery, Snapshot, Tab};

fn can(session: &SessionStore, action: Action) -> bool {
    session.has_role(action.allowed_roles())
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn stat_card(title: &str, value: &str) -> String {
    format!(
        r#"<div class="stat-card p-5 rounded-2xl bg-surface shadow"><p class="text-sm text-textMuted">{title}</p><p class="text-2xl font-bold">{}</p></div>"#,
        escape(value)
    )
}

fn loading_or<T>(snap: &Snapshot<T>, body: impl FnOnce(&T) -> String) -> String {
    let error = error_banner(snap.error.as_deref());
    if snap.loading {
        return format!(r#"{error}<p class="loading">Loading...</p>"#);
    }
    format!("{error}{}", body(&snap.data))
}

// ─────────────────────────────────────────────────────────────────────────────
// Analytics and health
// ─────────────────────────────────────────────────────────────────────────────

#[must_use]
pub fn analytics(snap: &Snapshot<Option<AnalyticsStats>>) -> String {
    loading_or(snap, |stats| {
        let Some(stats) = stats else {
            return String::new();
        };
        let o = &stats.overview;
        let cards = [
            stat_card("Total Revenue", &money(o.total_revenue)),
            stat_card("Total Orders", &o.total_orders.to_string()),
            stat_card("Conversion Rate", &o.conversion_rate),
            stat_card("Product Views", &o.views_count.to_string()),
        ]
        .concat();

        let purchased: String = stats
            .top_purchased
            .iter()
            .map(|p| {
                format!(
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape(&p.name),
                    p.total_sold
                )
            })
            .collect();
        let browsed: String = stats
            .top_browsed
            .iter()
            .map(|p| format!("<tr><td>{}</td><td>{}</td></tr>", escape(&p.name), p.views))
            .collect();
        let low_stock: String = stats
            .low_stock
            .iter()
            .map(|p| format!("<li>{} ({} left)</li>", escape(&p.name), p.stock))
            .collect();

        format!(
            r#"<section class="grid gap-4 md:grid-cols-4">{cards}</section>
<section class="grid gap-6 md:grid-cols-2 mt-6">
    <div><h2 class="font-semibold mb-2">Top Purchased</h2><table class="table"><thead><tr><th>Product</th><th>Sold</th></tr></thead><tbody>{purchased}</tbody></table></div>
    <div><h2 class="font-semibold mb-2">Most Viewed</h2><table class="table"><thead><tr><th>Product</th><th>Views</th></tr></thead><tbody>{browsed}</tbody></table></div>
</section>
<section class="mt-6"><h2 class="font-semibold mb-2">Low Stock</h2><ul>{low_stock}</ul></section>"#
        )
    })
}

#[must_use]
pub fn monitoring(snap: &Snapshot<Option<DashboardStats>>) -> String {
    loading_or(snap, |stats| {
        let Some(stats) = stats else {
            return String::new();
        };
        let cards = [
            stat_card("Total Revenue", &money(stats.total_revenue)),
            stat_card("Total Orders", &stats.total_orders.to_string()),
            stat_card("Products", &stats.total_products.to_string()),
            stat_card("Low Stock Items", &stats.low_stock_count.to_string()),
        ]
        .concat();
        format!(
            r#"<section class="grid gap-4 md:grid-cols-4">{cards}</section>
<form method="get" action="{path}" class="mt-6"><button type="submit" class="btn">Refresh</button></form>"#,
            path = View::Monitoring.path()
        )
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────────────────────────────────────

fn product_form(action: &str, product: Option<&Product>, submit: &str) -> String {
    let (name, price, stock, category, description) = match product {
        Some(p) => (
            escape(&p.name),
            p.price.to_string(),
            p.stock.to_string(),
            escape(&p.category),
            escape(p.description.as_deref().unwrap_or_default()),
        ),
        None => (
            String::new(),
            String::new(),
            "0".to_string(),
            "General".to_string(),
            String::new(),
        ),
    };
    format!(
        r#"<form method="post" action="{action}" class="product-form flex flex-wrap gap-2">
    <input name="name" value="{name}" placeholder="Name" required class="input">
    <input name="price" type="number" step="0.01" min="0" value="{price}" placeholder="Price" required class="input">
    <input name="stock" type="number" min="0" value="{stock}" placeholder="Stock" class="input">
    <input name="category" value="{category}" placeholder="Category" class="input">
    <input name="description" value="{description}" placeholder="Description" class="input">
    <button type="submit" class="btn btn-primary">{submit}</button>
</form>"#
    )
}

#[must_use]
pub fn products(snap: &Snapshot<Vec<Product>>, session: &SessionStore) -> String {
    let may_edit = can(session, Action::EditProduct);
    let may_delete = can(session, Action::DeleteProduct);
    let base = View::Products.path();

    let create = if may_edit {
        format!(
            r#"<details class="mb-4"><summary class="btn">Add Product</summary>{}</details>"#,
            product_form(&base, None, "Create")
        )
    } else {
        String::new()
    };

    let body = loading_or(snap, |products| {
        if products.is_empty() {
            return r#"<p class="empty">No products yet.</p>"#.to_string();
        }
        let rows: String = products
            .iter()
            .map(|p| {
                let id = escape(&p.id);
                let edit = if may_edit {
                    format!(
                        "<details><summary>Edit</summary>{}</details>",
                        product_form(&format!("{base}/{id}"), Some(p), "Save")
                    )
                } else {
                    String::new()
                };
                let delete = if may_delete {
                    format!(
                        r#"<form method="post" action="{base}/{id}/delete"><button type="submit" class="btn btn-danger">Delete</button></form>"#
                    )
                } else {
                    String::new()
                };
                format!(
                    r#"<tr><td>{name}</td><td>{category}</td><td>{price}</td><td>{stock}</td><td class="actions">{edit}{delete}</td></tr>"#,
                    name = escape(&p.name),
                    category = escape(&p.category),
                    price = money(p.price),
                    stock = p.stock,
                )
            })
            .collect();
        format!(
            r#"<table class="table w-full"><thead><tr><th>Name</th><th>Category</th><th>Price</th><th>Stock</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
        )
    });

    format!("{create}{body}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

fn status_form(order: &Order) -> String {
    let options: String = OrderStatus::ALL
        .into_iter()
        .map(|s| {
            let selected = if s.as_str().eq_ignore_ascii_case(&order.status) {
                " selected"
            } else {
                ""
            };
            format!(r#"<option value="{s}"{selected}>{s}</option>"#)
        })
        .collect();
    format!(
        r#"<form method="post" action="{base}/{id}/status" class="flex gap-2"><select name="status" class="input">{options}</select><button type="submit" class="btn">Update</button></form>"#,
        base = View::Orders.path(),
        id = escape(&order.id),
    )
}

#[must_use]
pub fn orders(snap: &Snapshot<Vec<Order>>, session: &SessionStore) -> String {
    let may_update = can(session, Action::UpdateOrderStatus);
    loading_or(snap, |orders| {
        if orders.is_empty() {
            return r#"<p class="empty">No orders yet.</p>"#.to_string();
        }
        let rows: String = orders
            .iter()
            .map(|o| {
                let items = o
                    .items
                    .iter()
                    .map(|i| format!("{} x{}", escape(&i.name), i.qty))
                    .collect::<Vec<_>>()
                    .join(", ");
                let control = if may_update {
                    status_form(o)
                } else {
                    String::new()
                };
                format!(
                    r#"<tr><td>#{reference}</td><td>{items}</td><td>{total}</td><td><span class="badge">{status}</span></td><td>{control}</td></tr>"#,
                    reference = escape(&o.reference()),
                    total = money(o.total),
                    status = escape(&o.status),
                )
            })
            .collect();
        format!(
            r#"<table class="table w-full"><thead><tr><th>Order</th><th>Items</th><th>Total</th><th>Status</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
        )
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

fn delete_button(tab: Tab, id: &str) -> String {
    format!(
        r#"<form method="post" action="{base}/{id}/delete"><input type="hidden" name="tab" value="{tab}"><button type="submit" class="btn btn-danger">Delete</button></form>"#,
        base = View::Users.path(),
        id = escape(id),
    )
}

fn team_table(team: &[AdminUser], may_manage: bool) -> String {
    let rows: String = team
        .iter()
        .map(|u| {
            let control = if may_manage && !u.is_superadmin() {
                delete_button(Tab::Team, &u.id)
            } else {
                String::new()
            };
            format!(
                r#"<tr><td>{name}</td><td><span class="badge">{role}</span></td><td>{control}</td></tr>"#,
                name = escape(&u.username),
                role = escape(u.role.as_deref().unwrap_or("Unassigned")),
            )
        })
        .collect();
    format!(
        r#"<table class="table w-full"><thead><tr><th>Username</th><th>Role</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

fn customer_table(customers: &[Customer], may_manage: bool) -> String {
    let rows: String = customers
        .iter()
        .map(|c| {
            let control = if may_manage {
                delete_button(Tab::Customers, &c.id)
            } else {
                String::new()
            };
            format!(
                r#"<tr><td>{name}</td><td>{email}</td><td>{control}</td></tr>"#,
                name = escape(c.display_name()),
                email = escape(c.email.as_deref().unwrap_or_default()),
            )
        })
        .collect();
    format!(
        r#"<table class="table w-full"><thead><tr><th>Name</th><th>Email</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

fn new_admin_form() -> String {
    let roles: String = Role::ALL
        .into_iter()
        .rev()
        .map(|r| format!(r#"<option value="{r}">{r}</option>"#))
        .collect();
    format!(
        r#"<details class="mb-4"><summary class="btn">Add Team Member</summary>
<form method="post" action="{path}" class="flex flex-wrap gap-2">
    <input name="username" placeholder="Username" required class="input">
    <input name="password" type="password" placeholder="Password" required class="input">
    <select name="role" class="input">{roles}</select>
    <button type="submit" class="btn btn-primary">Create</button>
</form></details>"#,
        path = View::Users.path()
    )
}

#[must_use]
pub fn users(
    tab: Tab,
    team: &Snapshot<Vec<AdminUser>>,
    customers: &Snapshot<Vec<Customer>>,
    session: &SessionStore,
) -> String {
    let may_manage = can(session, Action::ManageStaff);
    let base = View::Users.path();
    let tab_link = |t: Tab, label: &str| {
        let class = if t == tab { "tab active" } else { "tab" };
        format!(r#"<a href="{base}?tab={t}" class="{class}">{label}</a>"#)
    };
    let tabs = format!(
        r#"<nav class="tabs flex gap-2 mb-4">{}{}</nav>"#,
        tab_link(Tab::Team, "Team"),
        tab_link(Tab::Customers, "Customers")
    );

    let body = match tab {
        Tab::Team => {
            let form = if may_manage {
                new_admin_form()
            } else {
                String::new()
            };
            format!(
                "{form}{}",
                loading_or(team, |team| team_table(team, may_manage))
            )
        }
        Tab::Customers => loading_or(customers, |customers| {
            customer_table(customers, may_manage)
        }),
    };
    format!("{tabs}{body}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Security logs
// ─────────────────────────────────────────────────────────────────────────────

fn log_row(log: &ActivityLog, may_archive: bool) -> String {
    let control = if may_archive && !log.is_archived {
        format!(
            r#"<form method="post" action="{base}/{id}/archive"><button type="submit" class="btn">Archive</button></form>"#,
            base = View::Logs.path(),
            id = escape(&log.id),
        )
    } else {
        String::new()
    };
    let details = log
        .metadata
        .as_ref()
        .map(|m| escape(&m.to_string()))
        .unwrap_or_default();
    format!(
        r#"<tr><td>{time}</td><td>{actor}</td><td><span class="badge">{action}</span></td><td>{target}</td><td><code>{details}</code></td><td>{control}</td></tr>"#,
        time = escape(log.timestamp.as_deref().unwrap_or_default()),
        actor = escape(log.actor()),
        action = escape(&log.action_type),
        target = escape(log.target_id.as_deref().unwrap_or_default()),
    )
}

#[must_use]
pub fn logs(snap: &Snapshot<LogPage>, query: &LogQuery, session: &SessionStore) -> String {
    let may_archive = can(session, Action::ArchiveLog);
    let base = View::Logs.path();
    let current = query.action.as_deref().unwrap_or_default();

    let options: String = std::iter::once(("", "All actions"))
        .chain(LOG_ACTION_TYPES.iter().map(|a| (*a, *a)))
        .map(|(value, label)| {
            let selected = if value == current { " selected" } else { "" };
            format!(r#"<option value="{value}"{selected}>{label}</option>"#)
        })
        .collect();
    let filter = format!(
        r#"<form method="get" action="{base}" class="flex gap-2 mb-4"><select name="action" class="input">{options}</select><button type="submit" class="btn">Filter</button></form>"#
    );

    let action_param = if current.is_empty() {
        String::new()
    } else {
        format!("&action={}", escape(current))
    };
    let body = loading_or(snap, |page| {
        let rows: String = page.logs.iter().map(|l| log_row(l, may_archive)).collect();
        let prev = if page.page > 1 {
            format!(
                r#"<a href="{base}?page={}{action_param}" class="btn">Previous</a>"#,
                page.page - 1
            )
        } else {
            String::new()
        };
        let next = if page.page < page.pages {
            format!(
                r#"<a href="{base}?page={}{action_param}" class="btn">Next</a>"#,
                page.page + 1
            )
        } else {
            String::new()
        };
        format!(
            r#"<table class="table w-full"><thead><tr><th>Time</th><th>User</th><th>Action</th><th>Target</th><th>Details</th><th></th></tr></thead><tbody>{rows}</tbody></table>
<div class="pagination flex items-center gap-3 mt-4">{prev}<span>Page {} of {}</span>{next}</div>"#,
            page.page,
            page.pages.max(1)
        )
    });

    format!("{filter}{body}")
}
