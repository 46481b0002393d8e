// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Menu routing against a real coordinator stack with mock collaborators.

use std::sync::Arc;

use teloxide::types::InlineKeyboardButtonKind;
use vpnshop_catalog::Tier;
use vpnshop_core::types::{
    ChatTarget, ConnectionLimits, ConnectionUpdate, NewConnection, Notice, PaymentMethod,
    ServerNode,
};
use vpnshop_core::InvoiceGateway;
use vpnshop_coordinator::{NodeDirectory, PaymentFlows, SupportDesk};
use vpnshop_payments::PaymentToggles;
use vpnshop_telegram::action::{BackTarget, MenuAction, SupportAction};
use vpnshop_telegram::handler::{handle_start, handle_text, route};
use vpnshop_telegram::screens::Screen;
use vpnshop_telegram::{BotState, Lang, Reply};
use vpnshop_test_utils::TestHarness;

const USER: i64 = 501;
const ADMIN: i64 = 900;

fn state(h: &TestHarness, toggles: PaymentToggles) -> BotState {
    BotState::new(
        Arc::clone(&h.repo),
        Arc::clone(&h.coordinator),
        PaymentFlows::new(
            Arc::clone(&h.coordinator),
            Some(h.gateway.clone() as Arc<dyn InvoiceGateway>),
            toggles,
        ),
        SupportDesk::new(Arc::clone(&h.repo), h.notifier.clone(), vec![ADMIN]),
        NodeDirectory::new(Arc::clone(&h.repo), h.orchestrator.clone()),
        "en",
    )
}

fn all_methods() -> PaymentToggles {
    PaymentToggles {
        sbp: true,
        stars: true,
        cryptobot: true,
    }
}

fn screen(reply: Reply) -> Screen {
    match reply {
        Reply::Screen(screen) => screen,
        other => panic!("expected a screen, got {other:?}"),
    }
}

fn callbacks(screen: &Screen) -> Vec<String> {
    screen
        .keyboard
        .iter()
        .flat_map(|k| k.inline_keyboard.iter().flatten())
        .filter_map(|b| match &b.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

async fn target(state: &BotState, tg_id: i64) -> ChatTarget {
    state.target_for(tg_id, tg_id, Some("en-US")).await.unwrap()
}

async fn active_connection(h: &TestHarness, tg_id: i64) -> i64 {
    let connection = h
        .repo
        .create_connection(&NewConnection {
            tg_id,
            order_id: None,
            renew_of: None,
            server_id: "DE-1".into(),
            protocol: "wireguard".into(),
            limits: ConnectionLimits {
                speed_mbps: 100,
                devices: 3,
                data_gb: None,
            },
            expires_at: "2027-01-01T00:00:00.000Z".into(),
        })
        .await
        .unwrap();
    h.repo
        .update_connection_task(connection.id, &ConnectionUpdate::creating("t-1"))
        .await
        .unwrap();
    h.repo
        .update_connection_task(connection.id, &ConnectionUpdate::active("CFG"))
        .await
        .unwrap();
    connection.id
}

#[tokio::test]
async fn first_contact_detects_language_and_keeps_it() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());

    let first = state.target_for(USER, USER, Some("ru-RU")).await.unwrap();
    assert_eq!(first.lang, "ru");
    let again = state.target_for(USER, USER, Some("en")).await.unwrap();
    assert_eq!(again.lang, "ru");

    let unknown = state.target_for(USER + 1, USER + 1, Some("de")).await.unwrap();
    assert_eq!(unknown.lang, "en");
}

#[tokio::test]
async fn ready_month_fills_draft_and_offers_payment() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;

    let reply = route(
        &state,
        &target,
        MenuAction::ReadyMonth {
            tier: Tier::Standard,
            months: 1,
        },
    )
    .await
    .unwrap();
    let screen = screen(reply);
    assert!(screen.text.starts_with("1 mo • STANDARD\n$2.00 • 190 ₽ • 100 ⭐"));
    assert_eq!(
        callbacks(&screen),
        vec![
            "payment:sbp",
            "payment:stars",
            "payment:cryptobot",
            "payment:edit_connection",
            "back:buy"
        ]
    );

    let draft = h.repo.get_draft(USER).await.unwrap();
    assert_eq!(draft.plan.as_deref(), Some("ready:standard:1"));
    assert_eq!(draft.server.as_deref(), Some("auto"));
    assert_eq!(draft.protocol.as_deref(), Some("wireguard"));
    assert!(draft.payment.is_none());
}

#[tokio::test]
async fn custom_devices_fill_draft() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;

    let reply = route(
        &state,
        &target,
        MenuAction::CustomDevices {
            server: "nl".into(),
            protocol: "vless".into(),
            months: 3,
            devices: 2,
        },
    )
    .await
    .unwrap();
    assert!(screen(reply).text.starts_with("CUSTOM • 3 mo"));

    let draft = h.repo.get_draft(USER).await.unwrap();
    assert_eq!(draft.plan.as_deref(), Some("custom:nl:vless:3:2"));
    assert_eq!(draft.server.as_deref(), Some("nl"));
    assert_eq!(draft.protocol.as_deref(), Some("vless"));
}

#[tokio::test]
async fn selections_outside_catalog_restart_custom_flow() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;

    let reply = route(
        &state,
        &target,
        MenuAction::CustomDevices {
            server: "us".into(),
            protocol: "vless".into(),
            months: 3,
            devices: 4,
        },
    )
    .await
    .unwrap();
    assert!(callbacks(&screen(reply)).contains(&"custom_server:de".to_string()));
    assert!(h.repo.get_draft(USER).await.unwrap().plan.is_none());

    for (server, protocol) in [("xx", "vless"), ("de", "pptp")] {
        let reply = route(
            &state,
            &target,
            MenuAction::CustomMonth {
                server: server.into(),
                protocol: protocol.into(),
                months: 3,
            },
        )
        .await
        .unwrap();
        let buttons = callbacks(&screen(reply));
        assert!(buttons.contains(&"custom_server:de".to_string()));
        assert!(!buttons.iter().any(|b| b.starts_with("custom_devices:")));
    }
}

#[tokio::test]
async fn choosing_payment_shows_summary() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;
    route(
        &state,
        &target,
        MenuAction::ReadyMonth {
            tier: Tier::Premium,
            months: 3,
        },
    )
    .await
    .unwrap();

    let reply = route(&state, &target, MenuAction::ChoosePayment(PaymentMethod::Stars))
        .await
        .unwrap();
    let screen = screen(reply);
    assert!(screen.text.contains("Payment: ⭐ Telegram Stars"));
    assert_eq!(callbacks(&screen), vec!["pay:start", "back:payment", "back:main"]);
    assert_eq!(
        h.repo.get_draft(USER).await.unwrap().payment.as_deref(),
        Some("stars")
    );
}

#[tokio::test]
async fn disabled_method_is_refused_and_hidden() {
    let h = TestHarness::new().await.unwrap();
    let state = state(
        &h,
        PaymentToggles {
            sbp: true,
            stars: false,
            cryptobot: true,
        },
    );
    let target = target(&state, USER).await;
    let picker = route(
        &state,
        &target,
        MenuAction::ReadyMonth {
            tier: Tier::Standard,
            months: 6,
        },
    )
    .await
    .unwrap();
    assert!(!callbacks(&screen(picker)).contains(&"payment:stars".to_string()));

    let reply = route(&state, &target, MenuAction::ChoosePayment(PaymentMethod::Stars))
        .await
        .unwrap();
    assert!(screen(reply).text.contains("unavailable"));
    assert!(h.repo.get_draft(USER).await.unwrap().payment.is_none());
}

#[tokio::test]
async fn pay_start_hands_over_to_payment_flow() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;
    route(
        &state,
        &target,
        MenuAction::ReadyMonth {
            tier: Tier::Standard,
            months: 1,
        },
    )
    .await
    .unwrap();
    route(&state, &target, MenuAction::ChoosePayment(PaymentMethod::Sbp))
        .await
        .unwrap();

    let reply = route(&state, &target, MenuAction::PayStart).await.unwrap();
    assert!(matches!(reply, Reply::Silent));
    assert!(matches!(
        h.notifier.last().await,
        Some(Notice::StubPaymentStarted { .. })
    ));
}

#[tokio::test]
async fn pay_start_without_draft_reports_missing_selection() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;

    let reply = route(&state, &target, MenuAction::PayStart).await.unwrap();
    assert!(matches!(reply, Reply::Silent));
    assert_eq!(h.notifier.last().await, Some(Notice::DraftMissing));
}

#[tokio::test]
async fn language_switch_rerenders_welcome() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;

    let reply = route(&state, &target, MenuAction::SetLanguage(Lang::Ru))
        .await
        .unwrap();
    match reply {
        Reply::Welcome(screen) => assert!(screen.text.contains("Добро пожаловать")),
        other => panic!("expected welcome, got {other:?}"),
    }
    assert_eq!(h.repo.get_user(USER).await.unwrap().unwrap().language, "ru");
}

#[tokio::test]
async fn support_compose_captures_next_text() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;

    // Outside compose mode, text brings back the menu.
    assert!(matches!(
        handle_text(&state, &target, "hello").await.unwrap(),
        Reply::Welcome(_)
    ));

    route(&state, &target, MenuAction::Support(SupportAction::Create))
        .await
        .unwrap();
    let blank = handle_text(&state, &target, "   ").await.unwrap();
    assert!(screen(blank).text.starts_with("Describe your problem"));

    let reply = handle_text(&state, &target, "VPN drops every hour").await.unwrap();
    assert!(matches!(reply, Reply::Silent));
    let tickets = h.repo.list_support_tickets(Some(USER), false).await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].text, "VPN drops every hour");
    assert!(matches!(
        h.notifier.last().await,
        Some(Notice::SupportTicketCreated { .. })
    ));
}

#[tokio::test]
async fn open_tickets_are_admin_only() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let user = target(&state, USER).await;
    let admin = target(&state, ADMIN).await;
    h.repo.create_support_ticket(USER, "refund please").await.unwrap();

    let denied = screen(
        route(&state, &user, MenuAction::Support(SupportAction::Open))
            .await
            .unwrap(),
    );
    assert!(!denied.text.contains("refund please"));
    assert!(!callbacks(&denied).contains(&"support:open".to_string()));

    let listed = screen(
        route(&state, &admin, MenuAction::Support(SupportAction::Open))
            .await
            .unwrap(),
    );
    assert!(listed.text.contains("refund please"));
}

#[tokio::test]
async fn start_resets_draft_and_compose_state() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;
    h.seed_draft(USER, "ready:standard:1", "sbp").await.unwrap();
    route(&state, &target, MenuAction::Support(SupportAction::Create))
        .await
        .unwrap();

    let reply = handle_start(&state, &target).await.unwrap();
    assert!(matches!(reply, Reply::Welcome(_)));
    assert!(!h.repo.get_draft(USER).await.unwrap().is_complete());
    assert!(h.repo.get_user(USER).await.unwrap().unwrap().state_name.is_none());
}

#[tokio::test]
async fn renewal_walks_country_and_node_pickers() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;
    let connection_id = active_connection(&h, USER).await;
    h.orchestrator
        .set_nodes(vec![
            ServerNode {
                server_id: "FI-2".into(),
                country: "fi".into(),
                ping_ms: 20,
                status: "up".into(),
                white_ip: String::new(),
                stats: String::new(),
            },
            ServerNode {
                server_id: "FI-9".into(),
                country: "fi".into(),
                ping_ms: 5,
                status: "down".into(),
                white_ip: String::new(),
                stats: String::new(),
            },
        ])
        .await;

    let countries = screen(
        route(&state, &target, MenuAction::Renew { connection_id })
            .await
            .unwrap(),
    );
    assert!(callbacks(&countries).contains(&format!("renew:{connection_id}:fi")));

    let nodes = screen(
        route(
            &state,
            &target,
            MenuAction::RenewCountry {
                connection_id,
                country: "fi".into(),
            },
        )
        .await
        .unwrap(),
    );
    let node_callbacks = callbacks(&nodes);
    assert_eq!(node_callbacks[0], format!("node:{connection_id}:fi:FI-2"));
    assert!(!node_callbacks.iter().any(|c| c.ends_with("FI-9")));

    h.orchestrator.accept_with("renew-1").await;
    let reply = route(
        &state,
        &target,
        MenuAction::RenewNode {
            connection_id,
            country: "fi".into(),
            server_id: "FI-2".into(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(reply, Reply::Silent));
    let renews = h.orchestrator.renew_requests().await;
    assert_eq!(renews.len(), 1);
    assert_eq!(renews[0].renew_of, connection_id);
    assert_eq!(renews[0].server_id, "FI-2");
}

#[tokio::test]
async fn renewal_of_foreign_connection_is_refused() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let intruder = target(&state, USER + 1).await;
    let connection_id = active_connection(&h, USER).await;

    let reply = screen(
        route(&state, &intruder, MenuAction::Renew { connection_id })
            .await
            .unwrap(),
    );
    assert_eq!(reply.text, "Connection not found.");

    let reply = route(
        &state,
        &intruder,
        MenuAction::RenewNode {
            connection_id,
            country: "fi".into(),
            server_id: "FI-2".into(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(reply, Reply::Screen(_)));
    assert!(h.orchestrator.renew_requests().await.is_empty());
}

#[tokio::test]
async fn back_to_main_is_the_welcome_screen() {
    let h = TestHarness::new().await.unwrap();
    let state = state(&h, all_methods());
    let target = target(&state, USER).await;
    match route(&state, &target, MenuAction::Back(BackTarget::Main))
        .await
        .unwrap()
    {
        Reply::Welcome(screen) => {
            assert_eq!(callbacks(&screen), vec!["menu:buy", "menu:account", "menu:lang"]);
        }
        other => panic!("expected welcome, got {other:?}"),
    }
}
