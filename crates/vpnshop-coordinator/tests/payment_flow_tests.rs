// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft to order to confirmation for each payment backend.

use rust_decimal_macros::dec;
use vpnshop_coordinator::PaidOutcome;
use vpnshop_core::types::{Notice, OrderStatus};
use vpnshop_payments::{PaymentToggles, StarsRejection, StubResult, stars_payload};
use vpnshop_test_utils::TestHarness;

const USER: i64 = 2002;
const OTHER: i64 = 3003;

async fn event_types(h: &TestHarness, order_id: i64) -> Vec<String> {
    h.repo
        .list_payment_events(order_id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect()
}

#[tokio::test]
async fn missing_draft_creates_nothing() {
    let h = TestHarness::new().await.unwrap();
    h.repo.ensure_user(USER, "en").await.unwrap();

    assert_eq!(h.flows.start_payment(&h.target(USER)).await.unwrap(), None);
    assert_eq!(h.notifier.last().await, Some(Notice::DraftMissing));
    assert!(h.repo.list_orders(USER, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn stub_start_fills_server_and_protocol_from_plan() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "custom:nl:vless:3:2", "sbp").await.unwrap();

    let order_id = h.flows.start_payment(&h.target(USER)).await.unwrap().unwrap();
    let order = h.order(USER, order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.server, "nl");
    assert_eq!(order.protocol, "vless");
    // (2.50 + 1.00) * 3 * 0.95
    assert_eq!(order.amount_usd, dec!(9.98));
    assert_eq!(event_types(&h, order_id).await, vec!["started"]);
    assert_eq!(
        h.notifier.last().await,
        Some(Notice::StubPaymentStarted { order_id })
    );
}

#[tokio::test]
async fn disabled_method_is_refused_before_order_creation() {
    let h = TestHarness::builder()
        .with_toggles(PaymentToggles {
            sbp: false,
            stars: true,
            cryptobot: true,
        })
        .build()
        .await
        .unwrap();
    h.seed_draft(USER, "ready:standard:1", "sbp").await.unwrap();

    assert_eq!(h.flows.start_payment(&h.target(USER)).await.unwrap(), None);
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentUnavailable));
    assert!(h.repo.list_orders(USER, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_method_is_unavailable() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:1", "paypal").await.unwrap();

    assert_eq!(h.flows.start_payment(&h.target(USER)).await.unwrap(), None);
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentUnavailable));
}

#[tokio::test]
async fn price_override_applies_to_new_orders() {
    let h = TestHarness::new().await.unwrap();
    h.repo
        .set_config_value("pricing.ready.standard.1.usd", "3.50")
        .await
        .unwrap();
    h.seed_draft(USER, "ready:standard:1", "sbp").await.unwrap();

    let order_id = h.flows.start_payment(&h.target(USER)).await.unwrap().unwrap();
    assert_eq!(h.order(USER, order_id).await.unwrap().amount_usd, dec!(3.50));
}

#[tokio::test]
async fn stub_success_pays_and_dispatches() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:1", "sbp").await.unwrap();
    let target = h.target(USER);
    let order_id = h.flows.start_payment(&target).await.unwrap().unwrap();

    h.flows
        .finish_stub_payment(&target, order_id, StubResult::Success)
        .await
        .unwrap();

    let order = h.order(USER, order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert!(order.paid_at.is_some());
    assert_eq!(
        event_types(&h, order_id).await,
        vec!["started", "stub_success", "succeeded"]
    );
    assert_eq!(h.orchestrator.create_requests().await.len(), 1);
    assert!(h
        .notifier
        .notices()
        .await
        .iter()
        .any(|n| matches!(n, Notice::BuildStarted { order_id: Some(id), .. } if *id == order_id)));

    // Pressing success again is a duplicate signal.
    h.flows
        .finish_stub_payment(&target, order_id, StubResult::Success)
        .await
        .unwrap();
    assert_eq!(h.notifier.last().await, Some(Notice::AlreadyPaid { order_id }));
    assert_eq!(h.orchestrator.create_requests().await.len(), 1);
    assert_eq!(event_types(&h, order_id).await.len(), 3);
}

#[tokio::test]
async fn stub_cancel_then_success_stays_cancelled() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:premium:1", "sbp").await.unwrap();
    let target = h.target(USER);
    let order_id = h.flows.start_payment(&target).await.unwrap().unwrap();

    h.flows
        .finish_stub_payment(&target, order_id, StubResult::Cancel)
        .await
        .unwrap();
    let order = h.order(USER, order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.failure_reason.as_deref(), Some("local_stub_cancelled"));
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentCancelled { order_id }));

    h.flows
        .finish_stub_payment(&target, order_id, StubResult::Success)
        .await
        .unwrap();
    assert_eq!(h.order(USER, order_id).await.unwrap().status, OrderStatus::Cancelled);
    assert_eq!(h.notifier.last().await, Some(Notice::OrderClosed { order_id }));
    assert!(h.orchestrator.create_requests().await.is_empty());
}

#[tokio::test]
async fn stub_failure_records_reason() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:3", "sbp").await.unwrap();
    let target = h.target(USER);
    let order_id = h.flows.start_payment(&target).await.unwrap().unwrap();

    h.flows
        .finish_stub_payment(&target, order_id, StubResult::Failed)
        .await
        .unwrap();
    let order = h.order(USER, order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.failure_reason.as_deref(), Some("local_stub_failure"));
    assert_eq!(event_types(&h, order_id).await, vec!["started", "failed"]);
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentFailed { order_id }));
}

#[tokio::test]
async fn orders_of_other_users_are_invisible() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:1", "sbp").await.unwrap();
    let order_id = h.flows.start_payment(&h.target(USER)).await.unwrap().unwrap();

    h.flows
        .finish_stub_payment(&h.target(OTHER), order_id, StubResult::Success)
        .await
        .unwrap();
    assert_eq!(h.notifier.last().await, Some(Notice::OrderMissing));
    assert_eq!(h.order(USER, order_id).await.unwrap().status, OrderStatus::Pending);
}

#[tokio::test]
async fn stars_invoice_then_successful_payment() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:1", "stars").await.unwrap();
    let target = h.target(USER);
    let order_id = h.flows.start_payment(&target).await.unwrap().unwrap();

    assert_eq!(
        h.notifier.last().await,
        Some(Notice::StarsInvoice {
            order_id,
            title: "1 mo • STANDARD".into(),
            description: "1 mo • STANDARD • $2.00".into(),
            stars: 100,
        })
    );

    let payload = stars_payload(order_id);
    assert_eq!(
        h.flows.stars_pre_checkout(USER, &payload, "XTR").await.unwrap(),
        Ok(order_id)
    );
    assert_eq!(
        h.flows.stars_pre_checkout(USER, &payload, "USD").await.unwrap(),
        Err(StarsRejection::WrongCurrency("USD".into()))
    );
    assert_eq!(
        h.flows.stars_pre_checkout(OTHER, &payload, "XTR").await.unwrap(),
        Err(StarsRejection::UnknownOrder)
    );
    assert_eq!(
        h.flows.stars_pre_checkout(USER, "order_1", "XTR").await.unwrap(),
        Err(StarsRejection::ForeignPayload)
    );

    let outcome = h
        .flows
        .stars_successful_payment(&target, &payload, "charge-77")
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        Some(PaidOutcome::Completed { connection_id: Some(_) })
    ));
    assert_eq!(
        event_types(&h, order_id).await,
        vec!["started", "stars_payment_update", "succeeded"]
    );

    // Once paid, a new pre-checkout for the same order is declined.
    assert_eq!(
        h.flows.stars_pre_checkout(USER, &payload, "XTR").await.unwrap(),
        Err(StarsRejection::NotPending {
            order_id,
            status: OrderStatus::Paid
        })
    );
}

#[tokio::test]
async fn stars_pre_checkout_rejects_other_methods() {
    let h = TestHarness::new().await.unwrap();
    let order = h
        .pending_order(USER, "ready:standard:1", "auto", "wireguard", "sbp", dec!(2.00))
        .await
        .unwrap();
    assert_eq!(
        h.flows
            .stars_pre_checkout(USER, &stars_payload(order.id), "XTR")
            .await
            .unwrap(),
        Err(StarsRejection::WrongMethod(order.id))
    );
}

#[tokio::test]
async fn foreign_stars_payload_is_ignored() {
    let h = TestHarness::new().await.unwrap();
    let outcome = h
        .flows
        .stars_successful_payment(&h.target(USER), "something_else", "charge")
        .await
        .unwrap();
    assert_eq!(outcome, None);
    assert!(h.notifier.notices().await.is_empty());
}

#[tokio::test]
async fn cryptobot_invoice_lifecycle_paid() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:1", "cryptobot").await.unwrap();
    let target = h.target(USER);
    let order_id = h.flows.start_payment(&target).await.unwrap().unwrap();

    let requests = h.gateway.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].asset, "USDT");
    assert_eq!(requests[0].amount, "2.00");
    assert_eq!(requests[0].payload, format!("order_{order_id}"));
    assert_eq!(
        h.notifier.last().await,
        Some(Notice::InvoiceAwaitingPayment {
            order_id,
            invoice_id: 1000,
            pay_url: "https://pay.example/invoice/1000".into(),
            rechecked: false,
        })
    );

    h.flows.check_cryptobot_payment(&target, order_id, 1000).await.unwrap();
    assert_eq!(
        h.notifier.last().await,
        Some(Notice::InvoiceAwaitingPayment {
            order_id,
            invoice_id: 1000,
            pay_url: "https://pay.example/invoice/1000".into(),
            rechecked: true,
        })
    );
    assert_eq!(h.order(USER, order_id).await.unwrap().status, OrderStatus::Pending);

    h.gateway.set_status(1000, "PAID").await;
    h.flows.check_cryptobot_payment(&target, order_id, 1000).await.unwrap();
    assert_eq!(h.order(USER, order_id).await.unwrap().status, OrderStatus::Paid);
    assert_eq!(
        event_types(&h, order_id).await,
        vec!["started", "cryptobot_paid", "succeeded"]
    );
    assert_eq!(h.orchestrator.create_requests().await.len(), 1);
}

#[tokio::test]
async fn cryptobot_invoice_of_another_order_pays_nothing() {
    let h = TestHarness::new().await.unwrap();
    let target = h.target(USER);
    h.seed_draft(USER, "ready:standard:1", "cryptobot").await.unwrap();
    let cheap = h.flows.start_payment(&target).await.unwrap().unwrap();
    assert_eq!(h.order(USER, cheap).await.unwrap().invoice_id, Some(1000));
    h.gateway.set_status(1000, "paid").await;
    h.flows.check_cryptobot_payment(&target, cheap, 1000).await.unwrap();
    assert_eq!(h.order(USER, cheap).await.unwrap().status, OrderStatus::Paid);

    h.seed_draft(USER, "ready:premium:12", "cryptobot").await.unwrap();
    let pricey = h.flows.start_payment(&target).await.unwrap().unwrap();
    assert_eq!(h.order(USER, pricey).await.unwrap().invoice_id, Some(1001));

    h.flows.check_cryptobot_payment(&target, pricey, 1000).await.unwrap();
    assert_eq!(h.notifier.last().await, Some(Notice::OrderMissing));
    let order = h.order(USER, pricey).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(event_types(&h, pricey).await, vec!["started"]);
    assert_eq!(h.orchestrator.create_requests().await.len(), 1);
}

#[tokio::test]
async fn cryptobot_expired_invoice_fails_order() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:1", "cryptobot").await.unwrap();
    let target = h.target(USER);
    let order_id = h.flows.start_payment(&target).await.unwrap().unwrap();

    h.gateway.set_status(1000, "expired").await;
    h.flows.check_cryptobot_payment(&target, order_id, 1000).await.unwrap();

    let order = h.order(USER, order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.failure_reason.as_deref(), Some("cryptobot_expired"));
    assert_eq!(
        event_types(&h, order_id).await,
        vec!["started", "cryptobot_expired"]
    );
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentFailed { order_id }));

    // Late payment on the gateway side cannot reopen the order.
    h.gateway.set_status(1000, "paid").await;
    h.flows.check_cryptobot_payment(&target, order_id, 1000).await.unwrap();
    assert_eq!(h.order(USER, order_id).await.unwrap().status, OrderStatus::Failed);
    assert_eq!(h.notifier.last().await, Some(Notice::OrderClosed { order_id }));
    assert!(h.orchestrator.create_requests().await.is_empty());
}

#[tokio::test]
async fn cryptobot_gateway_outage_keeps_order_pending() {
    let h = TestHarness::new().await.unwrap();
    h.seed_draft(USER, "ready:standard:1", "cryptobot").await.unwrap();
    let target = h.target(USER);
    let order_id = h.flows.start_payment(&target).await.unwrap().unwrap();

    h.gateway.set_unavailable(true);
    h.flows.check_cryptobot_payment(&target, order_id, 1000).await.unwrap();
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentUnavailable));
    assert_eq!(h.order(USER, order_id).await.unwrap().status, OrderStatus::Pending);

    h.gateway.set_unavailable(false);
    h.flows.check_cryptobot_payment(&target, order_id, 4242).await.unwrap();
    assert_eq!(h.notifier.last().await, Some(Notice::OrderMissing));
}

#[tokio::test]
async fn cryptobot_invoice_creation_failure_leaves_pending_order() {
    let h = TestHarness::new().await.unwrap();
    h.gateway.set_unavailable(true);
    h.seed_draft(USER, "ready:standard:1", "cryptobot").await.unwrap();

    let order_id = h.flows.start_payment(&h.target(USER)).await.unwrap().unwrap();
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentUnavailable));
    assert_eq!(h.order(USER, order_id).await.unwrap().status, OrderStatus::Pending);
    assert!(event_types(&h, order_id).await.is_empty());
}

#[tokio::test]
async fn cryptobot_without_gateway_is_unavailable() {
    let h = TestHarness::builder().without_gateway().build().await.unwrap();
    assert!(!h.flows.is_available(vpnshop_core::types::PaymentMethod::Cryptobot));
    h.seed_draft(USER, "ready:standard:1", "cryptobot").await.unwrap();

    assert_eq!(h.flows.start_payment(&h.target(USER)).await.unwrap(), None);
    assert_eq!(h.notifier.last().await, Some(Notice::PaymentUnavailable));
    assert!(h.repo.list_orders(USER, 5).await.unwrap().is_empty());
}
