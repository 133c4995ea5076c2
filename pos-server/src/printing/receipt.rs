//! Customer receipt renderer
//!
//! Plain UTF-8 text, one line per entry, ending with blank feed lines so the
//! printer advances past the tear bar.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::models::Order;

const SEPARATOR: &str = "-----------------------------";
const CURRENCY: &str = "₹";

/// Receipt renderer
#[derive(Debug, Clone)]
pub struct ReceiptFormatter {
    store_name: String,
    timezone: Tz,
}

impl ReceiptFormatter {
    pub fn new(store_name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            store_name: store_name.into(),
            timezone,
        }
    }

    /// Render an order to receipt text
    pub fn format(&self, order: &Order) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(order.items.len() * 2 + 12);

        lines.push(self.store_name.clone());
        lines.push(format!("Order: {}", order.order_id));
        lines.push(format!("Branch: {}", order.branch_code));
        lines.push(format!("Biller ID: {}", order.created_by));
        lines.push(format!(
            "Date: {}",
            format_timestamp(order.created_at, self.timezone)
        ));
        lines.push(SEPARATOR.to_string());

        for item in &order.items {
            lines.push(format!(
                "{} x{}  {}",
                item.item_name,
                item.quantity,
                money(item.price)
            ));
            if !item.addons.is_empty() {
                let addons: Vec<String> = item
                    .addons
                    .iter()
                    .map(|a| {
                        if a.price > 0.0 {
                            format!("{} {}", a.name, money(a.price))
                        } else {
                            a.name.clone()
                        }
                    })
                    .collect();
                lines.push(format!("  + {}", addons.join(", ")));
            }
        }

        lines.push(SEPARATOR.to_string());
        lines.push(format!("Total: {}", money(order.total_amount)));
        lines.push(format!("Payment: {}", order.payment_mode.label()));
        lines.push(String::new());
        lines.push("Thank you!".to_string());
        // paper feed before tearing
        lines.push("\n\n\n".to_string());

        lines.join("\n")
    }
}

fn money(amount: f64) -> String {
    format!("{}{:.2}", CURRENCY, amount)
}

/// Unix millis → `DD-MM-YYYY HH:MM` in the business timezone
fn format_timestamp(millis: i64, tz: Tz) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&tz)
        .format("%d-%m-%Y %H:%M")
        .to_string()
}
