// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update routing.
//!
//! Endpoints translate Telegram updates into coordinator calls and screens.
//! [`route`] holds the menu logic and never touches the Bot API; the
//! endpoints hand its [`Reply`] to the [`TelegramNotifier`].

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatKind, SuccessfulPayment, User};
use tracing::{debug, error, info, warn};

use vpnshop_catalog::{
    offer_from_plan, PlanCode, AUTO_SERVER, DEVICE_OPTIONS, MONTH_OPTIONS, PROTOCOL_KEYS,
    READY_PROTOCOL, SERVER_KEYS,
};
use vpnshop_core::types::{
    ChatTarget, Connection, ConnectionStatus, DraftPatch, Notice, PaymentMethod,
    SUPPORT_COMPOSE_STATE,
};
use vpnshop_core::{Repository, VpnshopError};
use vpnshop_coordinator::{load_pricing, NodeDirectory, OrderCoordinator, PaymentFlows, SupportDesk};

use crate::action::{BackTarget, InfoPage, MenuAction, MenuScreen, SupportAction};
use crate::keyboards;
use crate::locale::{Lang, Text};
use crate::notifier::{Reply, TelegramNotifier};
use crate::screens::{self, Screen};

/// Orders shown on the account screen.
const ORDER_HISTORY_LIMIT: u32 = 10;

const ALL_METHODS: [PaymentMethod; 3] = [
    PaymentMethod::Sbp,
    PaymentMethod::Stars,
    PaymentMethod::Cryptobot,
];

/// Shared state injected into every endpoint.
pub struct BotState {
    pub repo: Arc<dyn Repository>,
    pub coordinator: Arc<OrderCoordinator>,
    pub flows: PaymentFlows,
    pub support: SupportDesk,
    pub nodes: NodeDirectory,
    pub default_language: String,
}

impl BotState {
    pub fn new(
        repo: Arc<dyn Repository>,
        coordinator: Arc<OrderCoordinator>,
        flows: PaymentFlows,
        support: SupportDesk,
        nodes: NodeDirectory,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            coordinator,
            flows,
            support,
            nodes,
            default_language: default_language.into(),
        }
    }

    /// Registers the user on first contact and resolves their chat target.
    ///
    /// A new user's language is detected from the client's language code;
    /// an existing user keeps the stored one.
    pub async fn target_for(
        &self,
        tg_id: i64,
        chat_id: i64,
        client_language: Option<&str>,
    ) -> Result<ChatTarget, VpnshopError> {
        let detected = Lang::detect(client_language, &self.default_language);
        let user = self.repo.ensure_user(tg_id, &detected.to_string()).await?;
        let lang = Lang::resolve(Some(user.language.as_str()), &self.default_language);
        Ok(ChatTarget {
            chat_id,
            tg_id,
            lang: lang.to_string(),
        })
    }

    fn lang(&self, target: &ChatTarget) -> Lang {
        Lang::resolve(Some(target.lang.as_str()), &self.default_language)
    }

    fn available_methods(&self) -> Vec<PaymentMethod> {
        ALL_METHODS
            .into_iter()
            .filter(|m| self.flows.is_available(*m))
            .collect()
    }

    /// Connection `connection_id` if it belongs to `tg_id` and is active.
    async fn owned_active_connection(
        &self,
        tg_id: i64,
        connection_id: i64,
    ) -> Result<Option<Connection>, VpnshopError> {
        Ok(self
            .repo
            .get_connection(connection_id)
            .await?
            .filter(|c| c.tg_id == tg_id && c.status == ConnectionStatus::Active))
    }
}

pub fn welcome_screen(lang: Lang) -> Screen {
    Screen::new(lang.t(Text::Welcome), keyboards::main_menu(lang))
}

fn support_screen(state: &BotState, lang: Lang, tg_id: i64) -> Screen {
    Screen::new(
        lang.t(Text::SupportTitle),
        keyboards::support_menu(lang, state.support.is_admin(tg_id)),
    )
}

/// Offer summary for the user's draft with the payment picker.
async fn payment_screen(state: &BotState, lang: Lang, tg_id: i64) -> Result<Screen, VpnshopError> {
    let draft = state.repo.get_draft(tg_id).await?;
    let pricing = load_pricing(state.repo.as_ref()).await;
    let Some(offer) = draft.plan.as_deref().and_then(|p| offer_from_plan(p, &pricing)) else {
        return Ok(screens::notice_screen(lang, &Notice::DraftMissing));
    };
    let text = format!(
        "{}\n\n{}",
        screens::offer_text(lang, &offer, draft.payment.as_deref()),
        lang.t(Text::PaymentTitle)
    );
    Ok(Screen::new(
        text,
        keyboards::payment_menu(lang, &state.available_methods()),
    ))
}

/// Draft summary with the pay button, once a method is chosen.
async fn summary_screen(state: &BotState, lang: Lang, tg_id: i64) -> Result<Screen, VpnshopError> {
    let draft = state.repo.get_draft(tg_id).await?;
    let pricing = load_pricing(state.repo.as_ref()).await;
    let Some(offer) = draft.plan.as_deref().and_then(|p| offer_from_plan(p, &pricing)) else {
        return Ok(screens::notice_screen(lang, &Notice::DraftMissing));
    };
    Ok(Screen::new(
        screens::offer_text(lang, &offer, draft.payment.as_deref()),
        keyboards::summary_menu(lang),
    ))
}

fn connection_missing(lang: Lang) -> Screen {
    Screen::new(lang.t(Text::ConnectionMissing), keyboards::account_back(lang))
}

/// Applies a menu action for `target` and returns what to show next.
pub async fn route(
    state: &BotState,
    target: &ChatTarget,
    action: MenuAction,
) -> Result<Reply, VpnshopError> {
    let lang = state.lang(target);
    let tg_id = target.tg_id;

    let screen = match action {
        MenuAction::Back(BackTarget::Main) => return Ok(Reply::Welcome(welcome_screen(lang))),
        MenuAction::Menu(MenuScreen::Buy) | MenuAction::Back(BackTarget::Buy) | MenuAction::EditConnection => {
            Screen::new(lang.t(Text::BuyTitle), keyboards::buy_menu(lang))
        }
        MenuAction::Menu(MenuScreen::Account) | MenuAction::Back(BackTarget::Account) => {
            Screen::new(lang.t(Text::AccountTitle), keyboards::account_menu(lang))
        }
        MenuAction::Menu(MenuScreen::Lang) => {
            Screen::new(lang.t(Text::LangTitle), keyboards::language_menu(lang))
        }
        MenuAction::Menu(MenuScreen::Support) => support_screen(state, lang, tg_id),
        MenuAction::Menu(MenuScreen::Orders) => {
            let orders = state.repo.list_orders(tg_id, ORDER_HISTORY_LIMIT).await?;
            Screen::new(
                screens::orders_text(lang, &orders),
                keyboards::account_back(lang),
            )
        }
        MenuAction::Menu(MenuScreen::Configs) => {
            let connections = state.repo.list_connections(tg_id).await?;
            Screen::new(
                screens::connections_text(lang, &connections),
                keyboards::configs_menu(lang, &connections),
            )
        }
        MenuAction::Back(BackTarget::Payment) => payment_screen(state, lang, tg_id).await?,

        MenuAction::BuyReady => {
            let pricing = load_pricing(state.repo.as_ref()).await;
            Screen::new(
                lang.t(Text::ReadyPlanTitle),
                keyboards::ready_plan_menu(lang, &pricing),
            )
        }
        MenuAction::ReadyInfo => {
            let pricing = load_pricing(state.repo.as_ref()).await;
            Screen::new(
                screens::ready_details_text(lang, &pricing),
                keyboards::ready_info_menu(lang),
            )
        }
        MenuAction::ReadyPlan(tier) => {
            let pricing = load_pricing(state.repo.as_ref()).await;
            Screen::new(
                format!("{}\n{}", tier.label(), lang.t(Text::ReadyMonthsTitle)),
                keyboards::ready_months_menu(lang, tier, &pricing),
            )
        }
        MenuAction::ReadyMonth { tier, months } => {
            state
                .repo
                .upsert_draft(
                    tg_id,
                    &DraftPatch::default()
                        .plan(PlanCode::ready(tier, months).to_string())
                        .server(AUTO_SERVER)
                        .protocol(READY_PROTOCOL),
                )
                .await?;
            payment_screen(state, lang, tg_id).await?
        }

        MenuAction::BuyCustom => Screen::new(
            lang.t(Text::CustomServerTitle),
            keyboards::custom_server_menu(lang),
        ),
        MenuAction::CustomServer { server } if SERVER_KEYS.contains(&server.as_str()) => {
            Screen::new(
                lang.t(Text::CustomProtocolTitle),
                keyboards::custom_protocol_menu(lang, &server),
            )
        }
        MenuAction::CustomProtocol { server, protocol }
            if SERVER_KEYS.contains(&server.as_str())
                && PROTOCOL_KEYS.contains(&protocol.as_str()) =>
        {
            Screen::new(
                lang.t(Text::CustomMonthsTitle),
                keyboards::custom_months_menu(lang, &server, &protocol),
            )
        }
        MenuAction::CustomMonth {
            server,
            protocol,
            months,
        } if SERVER_KEYS.contains(&server.as_str())
            && PROTOCOL_KEYS.contains(&protocol.as_str())
            && MONTH_OPTIONS.contains(&months) =>
        {
            Screen::new(
                lang.t(Text::CustomDevicesTitle),
                keyboards::custom_devices_menu(lang, &server, &protocol, months),
            )
        }
        MenuAction::CustomDevices {
            server,
            protocol,
            months,
            devices,
        } if SERVER_KEYS.contains(&server.as_str())
            && PROTOCOL_KEYS.contains(&protocol.as_str())
            && MONTH_OPTIONS.contains(&months)
            && DEVICE_OPTIONS.contains(&devices) =>
        {
            let plan = PlanCode::custom(server.clone(), protocol.clone(), months, devices);
            state
                .repo
                .upsert_draft(
                    tg_id,
                    &DraftPatch::default()
                        .plan(plan.to_string())
                        .server(server)
                        .protocol(protocol),
                )
                .await?;
            payment_screen(state, lang, tg_id).await?
        }
        MenuAction::CustomServer { .. }
        | MenuAction::CustomProtocol { .. }
        | MenuAction::CustomMonth { .. }
        | MenuAction::CustomDevices { .. } => {
            debug!(tg_id, "custom selection outside the catalog");
            Screen::new(
                lang.t(Text::CustomServerTitle),
                keyboards::custom_server_menu(lang),
            )
        }

        MenuAction::ChoosePayment(method) => {
            if !state.flows.is_available(method) {
                screens::notice_screen(lang, &Notice::PaymentUnavailable)
            } else {
                state
                    .repo
                    .upsert_draft(tg_id, &DraftPatch::default().payment(method.to_string()))
                    .await?;
                summary_screen(state, lang, tg_id).await?
            }
        }
        MenuAction::PayStart => {
            state.flows.start_payment(target).await?;
            return Ok(Reply::Silent);
        }
        MenuAction::PayResult { result, order_id } => {
            state
                .flows
                .finish_stub_payment(target, order_id, result)
                .await?;
            return Ok(Reply::Silent);
        }
        MenuAction::CheckCryptobot {
            order_id,
            invoice_id,
        } => {
            state
                .flows
                .check_cryptobot_payment(target, order_id, invoice_id)
                .await?;
            return Ok(Reply::Silent);
        }

        MenuAction::SetLanguage(new_lang) => {
            state.repo.set_language(tg_id, &new_lang.to_string()).await?;
            info!(tg_id, language = %new_lang, "language changed");
            return Ok(Reply::Welcome(welcome_screen(new_lang)));
        }

        MenuAction::Support(SupportAction::Create) => {
            state.support.begin_compose(tg_id).await?;
            Screen::new(lang.t(Text::SupportPrompt), keyboards::support_back(lang))
        }
        MenuAction::Support(SupportAction::My) => {
            let tickets = state.support.my_tickets(tg_id).await?;
            Screen::new(
                screens::tickets_text(lang, Text::SupportMy, &tickets),
                keyboards::support_back(lang),
            )
        }
        MenuAction::Support(SupportAction::Open) => match state.support.open_tickets(tg_id).await? {
            Some(tickets) => Screen::new(
                screens::tickets_text(lang, Text::SupportOpenAdmin, &tickets),
                keyboards::support_back(lang),
            ),
            None => {
                warn!(tg_id, "open ticket list requested by non-admin");
                support_screen(state, lang, tg_id)
            }
        },
        MenuAction::Info(InfoPage::Terms) => {
            Screen::new(lang.t(Text::Terms), keyboards::support_back(lang))
        }
        MenuAction::Info(InfoPage::Privacy) => {
            Screen::new(lang.t(Text::Privacy), keyboards::support_back(lang))
        }

        MenuAction::Renew { connection_id } => {
            if state
                .owned_active_connection(tg_id, connection_id)
                .await?
                .is_none()
            {
                connection_missing(lang)
            } else {
                Screen::new(
                    lang.t(Text::RenewCountryTitle),
                    keyboards::renew_country_menu(lang, connection_id),
                )
            }
        }
        MenuAction::RenewCountry {
            connection_id,
            country,
        } => {
            if state
                .owned_active_connection(tg_id, connection_id)
                .await?
                .is_none()
            {
                connection_missing(lang)
            } else {
                let nodes = state.nodes.nodes_for_country(&country).await?;
                if nodes.is_empty() {
                    Screen::new(
                        lang.t(Text::NodesEmpty),
                        keyboards::renew_country_menu(lang, connection_id),
                    )
                } else {
                    Screen::new(
                        lang.t(Text::NodesTitle),
                        keyboards::node_menu(lang, connection_id, &country, &nodes),
                    )
                }
            }
        }
        MenuAction::RenewNode {
            connection_id,
            country,
            server_id,
        } => {
            let Some(old) = state.owned_active_connection(tg_id, connection_id).await? else {
                return Ok(Reply::Screen(connection_missing(lang)));
            };
            match state.nodes.find(&country, &server_id).await? {
                Some(node) => {
                    state
                        .coordinator
                        .renew_connection(&old, &node, target)
                        .await?;
                    return Ok(Reply::Silent);
                }
                None => Screen::new(
                    lang.t(Text::NodesEmpty),
                    keyboards::renew_country_menu(lang, connection_id),
                ),
            }
        }
    };
    Ok(Reply::Screen(screen))
}

/// Handles a plain text message. Only support tickets are captured from text;
/// anything else brings back the main menu.
pub async fn handle_text(
    state: &BotState,
    target: &ChatTarget,
    text: &str,
) -> Result<Reply, VpnshopError> {
    let lang = state.lang(target);
    if state.support.submit_if_composing(target, text).await?.is_some() {
        return Ok(Reply::Silent);
    }
    let composing = state
        .repo
        .get_user(target.tg_id)
        .await?
        .and_then(|u| u.state_name)
        .is_some_and(|name| name == SUPPORT_COMPOSE_STATE);
    if composing {
        return Ok(Reply::Screen(Screen::new(
            lang.t(Text::SupportPrompt),
            keyboards::support_back(lang),
        )));
    }
    Ok(Reply::Welcome(welcome_screen(lang)))
}

/// `/start`: drops any unfinished draft and session state, then shows the welcome screen.
pub async fn handle_start(state: &BotState, target: &ChatTarget) -> Result<Reply, VpnshopError> {
    state.repo.reset_draft(target.tg_id).await?;
    state.repo.set_session_state(target.tg_id, None).await?;
    Ok(Reply::Welcome(welcome_screen(state.lang(target))))
}

// --- Telegram-facing helpers ---

/// Only private chats are served.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

pub fn is_start_command(msg: &Message) -> bool {
    msg.text()
        .and_then(|text| text.split_whitespace().next())
        .is_some_and(|word| word == "/start" || word.starts_with("/start@"))
}

fn user_id(user: &User) -> i64 {
    user.id.0 as i64
}

/// Charge id Telegram assigned to a successful payment, as a plain string.
pub fn charge_id(payment: &SuccessfulPayment) -> String {
    serde_json::to_value(payment)
        .ok()
        .and_then(|value| {
            value
                .get("telegram_payment_charge_id")
                .and_then(|id| id.as_str())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

async fn present(notifier: &TelegramNotifier, target: &ChatTarget, reply: Result<Reply, VpnshopError>) {
    match reply {
        Ok(reply) => {
            if let Err(e) = notifier.present(target, reply).await {
                error!(tg_id = target.tg_id, error = %e, "failed to render screen");
            }
        }
        Err(e) => error!(tg_id = target.tg_id, error = %e, "update handling failed"),
    }
}

async fn message_target(state: &BotState, msg: &Message) -> Option<ChatTarget> {
    let user = msg.from.as_ref()?;
    match state
        .target_for(user_id(user), msg.chat.id.0, user.language_code.as_deref())
        .await
    {
        Ok(target) => Some(target),
        Err(e) => {
            error!(chat_id = msg.chat.id.0, error = %e, "cannot register user");
            None
        }
    }
}

pub async fn on_start(
    bot: Bot,
    state: Arc<BotState>,
    notifier: Arc<TelegramNotifier>,
    msg: Message,
) -> ResponseResult<()> {
    let Some(target) = message_target(&state, &msg).await else {
        return respond(());
    };
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        debug!(error = %e, "start command not deleted");
    }
    let reply = handle_start(&state, &target).await;
    present(&notifier, &target, reply).await;
    respond(())
}

pub async fn on_text(
    state: Arc<BotState>,
    notifier: Arc<TelegramNotifier>,
    msg: Message,
) -> ResponseResult<()> {
    let (Some(target), Some(text)) = (message_target(&state, &msg).await, msg.text()) else {
        return respond(());
    };
    let reply = handle_text(&state, &target, text).await;
    present(&notifier, &target, reply).await;
    respond(())
}

pub async fn on_successful_payment(state: Arc<BotState>, msg: Message) -> ResponseResult<()> {
    let Some(payment) = msg.successful_payment() else {
        return respond(());
    };
    let Some(target) = message_target(&state, &msg).await else {
        return respond(());
    };
    let charge_id = charge_id(payment);
    match state
        .flows
        .stars_successful_payment(&target, &payment.invoice_payload, &charge_id)
        .await
    {
        Ok(Some(outcome)) => info!(tg_id = target.tg_id, ?outcome, "stars payment applied"),
        Ok(None) => debug!(tg_id = target.tg_id, "successful payment for a foreign payload"),
        Err(e) => error!(tg_id = target.tg_id, error = %e, "stars payment not applied"),
    }
    respond(())
}

pub async fn on_pre_checkout(
    bot: Bot,
    state: Arc<BotState>,
    query: PreCheckoutQuery,
) -> ResponseResult<()> {
    let tg_id = user_id(&query.from);
    let lang = match state.target_for(tg_id, tg_id, query.from.language_code.as_deref()).await {
        Ok(target) => state.lang(&target),
        Err(_) => Lang::resolve(None, &state.default_language),
    };
    let verdict = state
        .flows
        .stars_pre_checkout(tg_id, &query.invoice_payload, &query.currency.to_string())
        .await;

    match verdict {
        Ok(Ok(order_id)) => {
            debug!(order_id, tg_id, "pre-checkout accepted");
            bot.answer_pre_checkout_query(query.id.clone(), true).await?;
        }
        Ok(Err(rejection)) => {
            info!(tg_id, ?rejection, "pre-checkout declined");
            bot.answer_pre_checkout_query(query.id.clone(), false)
                .error_message(lang.t(Text::StarsPrecheckoutError))
                .await?;
        }
        Err(e) => {
            error!(tg_id, error = %e, "pre-checkout lookup failed");
            bot.answer_pre_checkout_query(query.id.clone(), false)
                .error_message(lang.t(Text::StarsPrecheckoutError))
                .await?;
        }
    }
    respond(())
}

pub async fn on_callback(
    bot: Bot,
    state: Arc<BotState>,
    notifier: Arc<TelegramNotifier>,
    query: CallbackQuery,
) -> ResponseResult<()> {
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        debug!(error = %e, "callback not acknowledged");
    }
    let Some(data) = query.data.as_deref() else {
        return respond(());
    };
    let action = match data.parse::<MenuAction>() {
        Ok(action) => action,
        Err(e) => {
            debug!(error = %e, "ignoring callback");
            return respond(());
        }
    };

    let tg_id = user_id(&query.from);
    let target = match state
        .target_for(tg_id, tg_id, query.from.language_code.as_deref())
        .await
    {
        Ok(target) => target,
        Err(e) => {
            error!(tg_id, error = %e, "cannot register user");
            return respond(());
        }
    };
    debug!(tg_id, action = %action, "callback");
    let reply = route(&state, &target, action).await;
    present(&notifier, &target, reply).await;
    respond(())
}
