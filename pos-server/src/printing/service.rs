//! Receipt print service
//!
//! Printing is best effort: once the order and printer address check out, any
//! delivery failure is reported as a degraded outcome and the order itself is
//! never touched.

use chai_printer::{NetworkPrinter, PrintError, Printer};
use serde::{Deserialize, Serialize};
use shared::models::Order;
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use super::receipt::ReceiptFormatter;
use crate::auth::CurrentUser;
use crate::db::repository::branch;
use crate::orders::{OrderStore, Scope};
use crate::security_log;

/// `POST /api/printer/print` and `/reprint` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub order_id: Option<String>,
    #[serde(rename = "printerIP")]
    pub printer_ip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintKind {
    Print,
    Reprint,
}

impl PrintKind {
    fn success_message(self) -> &'static str {
        match self {
            Self::Print => "Printed successfully",
            Self::Reprint => "Reprinted successfully",
        }
    }

    fn degraded_message(self) -> &'static str {
        match self {
            Self::Print => "Order created but printer unavailable",
            Self::Reprint => "Reprint request accepted but printer unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    Printed,
    /// Printer unreachable or misbehaving; carries the reason
    Degraded(String),
}

/// Result of a print call, ready to be rendered as a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub order_id: String,
}

impl PrintReport {
    fn new(kind: PrintKind, order_id: String, outcome: PrintOutcome) -> Self {
        match outcome {
            PrintOutcome::Printed => Self {
                message: kind.success_message().to_string(),
                warning: None,
                order_id,
            },
            PrintOutcome::Degraded(warning) => Self {
                message: kind.degraded_message().to_string(),
                warning: Some(warning),
                order_id,
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

pub struct PrintService {
    orders: Arc<dyn OrderStore>,
    pool: SqlitePool,
    formatter: ReceiptFormatter,
    port: u16,
    timeout: Duration,
}

impl PrintService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        pool: SqlitePool,
        formatter: ReceiptFormatter,
        port: u16,
        timeout: Duration,
    ) -> Self {
        Self {
            orders,
            pool,
            formatter,
            port,
            timeout,
        }
    }

    pub async fn print(
        &self,
        actor: &CurrentUser,
        kind: PrintKind,
        req: PrintRequest,
    ) -> AppResult<PrintReport> {
        let scope = Scope::of(actor)?;

        let order_id = req
            .order_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::required("orderId"))?;

        let order = self.orders.find(order_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id)
        })?;

        if !scope.allows(&order.branch_code) {
            security_log!(
                "WARN",
                "branch_access_denied",
                user_id = actor.id,
                branch_code = order.branch_code.as_str(),
                action = "print_order"
            );
            return Err(AppError::branch_access_denied());
        }

        let ip = self.resolve_printer_ip(&order, req.printer_ip.as_deref()).await?;
        let printer = NetworkPrinter::new(&ip, self.port)
            .map_err(|e| {
                AppError::with_message(ErrorCode::InvalidFormat, e.to_string())
                    .with_detail("field", "printerIP")
            })?
            .with_timeout(self.timeout);

        let addr = printer.addr();
        let receipt = self.formatter.format(&order);
        let outcome = self.deliver(printer, receipt).await;

        match &outcome {
            PrintOutcome::Printed => tracing::info!(
                order_id = %order.order_id,
                printer = %addr,
                kind = ?kind,
                "Receipt printed"
            ),
            PrintOutcome::Degraded(reason) => tracing::warn!(
                order_id = %order.order_id,
                printer = %addr,
                kind = ?kind,
                reason = %reason,
                "Printer unavailable"
            ),
        }

        Ok(PrintReport::new(kind, order.order_id, outcome))
    }

    /// Explicit address first, then the branch's configured printer
    async fn resolve_printer_ip(&self, order: &Order, explicit: Option<&str>) -> AppResult<String> {
        if let Some(ip) = explicit.map(str::trim).filter(|ip| !ip.is_empty()) {
            return Ok(ip.to_string());
        }

        branch::find_by_code(&self.pool, &order.branch_code)
            .await?
            .and_then(|b| b.printer_ip)
            .filter(|ip| !ip.trim().is_empty())
            .ok_or_else(|| {
                AppError::new(ErrorCode::PrinterNotConfigured)
                    .with_detail("branchCode", order.branch_code.as_str())
            })
    }

    /// Run the job on its own task so a stuck printer cannot hold the request
    /// past the overall deadline
    async fn deliver(&self, printer: NetworkPrinter, receipt: String) -> PrintOutcome {
        // connect + write + shutdown + idle, each bounded by the printer timeout
        let deadline = self.timeout * 4 + Duration::from_secs(1);

        let job = tokio::spawn(async move { printer.print(receipt.as_bytes()).await });

        match tokio::time::timeout(deadline, job).await {
            Ok(Ok(Ok(()))) => PrintOutcome::Printed,
            Ok(Ok(Err(e))) => PrintOutcome::Degraded(describe(&e)),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Print task failed");
                PrintOutcome::Degraded("Print task failed".to_string())
            }
            Err(_) => PrintOutcome::Degraded("Printer connection timeout".to_string()),
        }
    }
}

fn describe(err: &PrintError) -> String {
    match err {
        PrintError::Timeout(_) => "Printer connection timeout".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;
    use crate::orders::{NewOrder, OrderSequence, SqliteOrderStore};
    use crate::utils::time::{DEFAULT_TIMEZONE, FixedClock};
    use shared::models::{BranchCreate, OrderItem, PaymentMode, Role};
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    struct Harness {
        service: PrintService,
        orders: Arc<SqliteOrderStore>,
        pool: SqlitePool,
        _dir: TempDir,
    }

    async fn harness(timeout: Duration) -> Harness {
        let (pool, dir) = test_pool().await;
        let clock = Arc::new(FixedClock::at("2025-06-14T10:00:00Z"));
        let sequence = OrderSequence::new(clock.clone(), DEFAULT_TIMEZONE);
        let orders = Arc::new(SqliteOrderStore::new(pool.clone(), sequence, clock));
        let service = PrintService::new(
            orders.clone(),
            pool.clone(),
            ReceiptFormatter::new("THE CUTTING CHAI", DEFAULT_TIMEZONE),
            chai_printer::DEFAULT_PORT,
            timeout,
        );
        Harness {
            service,
            orders,
            pool,
            _dir: dir,
        }
    }

    impl Harness {
        /// Point the service at a loopback port instead of 9100
        fn with_port(mut self, port: u16) -> Self {
            self.service.port = port;
            self
        }

        async fn order(&self, branch: &str) -> Order {
            self.orders
                .create(NewOrder {
                    branch_code: branch.into(),
                    items: vec![OrderItem {
                        menu_item_id: None,
                        item_name: "Chai".into(),
                        quantity: 2,
                        price: 20.0,
                        addons: vec![],
                    }],
                    total_amount: 40.0,
                    payment_mode: PaymentMode::Cash,
                    created_by: 2,
                })
                .await
                .unwrap()
        }

        async fn branch(&self, code: &str, printer_ip: Option<&str>) {
            branch::create(
                &self.pool,
                BranchCreate {
                    name: format!("Branch {code}"),
                    branch_code: code.into(),
                    address: String::new(),
                    printer_ip: printer_ip.map(String::from),
                },
                0,
            )
            .await
            .unwrap();
        }
    }

    fn biller(branch: &str) -> CurrentUser {
        CurrentUser {
            id: 2,
            name: "Biller".into(),
            role: Role::Biller,
            branch_code: Some(branch.into()),
        }
    }

    fn request(order_id: &str, ip: Option<&str>) -> PrintRequest {
        PrintRequest {
            order_id: Some(order_id.into()),
            printer_ip: ip.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_print_to_branch_printer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let printer = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            socket.read_to_string(&mut received).await.unwrap();
            received
        });

        let h = harness(Duration::from_secs(2)).await.with_port(port);
        h.branch("BR01", Some("127.0.0.1")).await;
        let order = h.order("BR01").await;

        let report = h
            .service
            .print(&biller("BR01"), PrintKind::Print, request(&order.order_id, None))
            .await
            .unwrap();
        assert_eq!(report.message, "Printed successfully");
        assert!(!report.is_degraded());
        assert_eq!(report.order_id, order.order_id);

        let received = printer.await.unwrap();
        assert!(received.starts_with("THE CUTTING CHAI\n"));
        assert!(received.contains(&format!("Order: {}", order.order_id)));
    }

    #[tokio::test]
    async fn test_unreachable_printer_is_degraded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let h = harness(Duration::from_millis(500)).await.with_port(port);
        let order = h.order("BR01").await;

        let report = h
            .service
            .print(
                &biller("BR01"),
                PrintKind::Reprint,
                request(&order.order_id, Some("127.0.0.1")),
            )
            .await
            .unwrap();
        assert!(report.is_degraded());
        assert_eq!(
            report.message,
            "Reprint request accepted but printer unavailable"
        );

        let stored = h.orders.find(&order.order_id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn test_print_validation() {
        let h = harness(Duration::from_millis(500)).await;
        h.branch("BR01", None).await;
        let order = h.order("BR01").await;

        let err = h
            .service
            .print(&biller("BR01"), PrintKind::Print, PrintRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let err = h
            .service
            .print(
                &biller("BR01"),
                PrintKind::Print,
                request("BR01-20250614-0999", None),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);

        let err = h
            .service
            .print(&biller("BR01"), PrintKind::Print, request(&order.order_id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PrinterNotConfigured);

        let err = h
            .service
            .print(
                &biller("BR01"),
                PrintKind::Print,
                request(&order.order_id, Some("printer.local")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);

        let err = h
            .service
            .print(
                &biller("BR02"),
                PrintKind::Print,
                request(&order.order_id, Some("127.0.0.1")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchAccessDenied);
    }
}
