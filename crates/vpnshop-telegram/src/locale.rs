// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! English and Russian interface strings.

use strum::{Display, EnumIter, EnumString};

/// Interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Lang {
    En,
    Ru,
}

impl Lang {
    /// Label shown on the language picker.
    pub fn label(self) -> &'static str {
        match self {
            Self::En => "🇬🇧 English",
            Self::Ru => "🇷🇺 Русский",
        }
    }

    /// Stored language if supported, else the configured default, else English.
    pub fn resolve(stored: Option<&str>, default: &str) -> Self {
        stored
            .and_then(|code| code.parse().ok())
            .or_else(|| default.parse().ok())
            .unwrap_or(Self::En)
    }

    /// Language for a first contact, from the client's language code
    /// (`ru`, `ru-RU`, `en-GB` ...).
    pub fn detect(client_code: Option<&str>, default: &str) -> Self {
        client_code
            .and_then(|code| code.to_lowercase().split('-').next().map(str::to_string))
            .and_then(|base| base.parse().ok())
            .unwrap_or_else(|| Self::resolve(None, default))
    }

    pub fn t(self, text: Text) -> &'static str {
        let (en, ru) = text.pair();
        match self {
            Self::En => en,
            Self::Ru => ru,
        }
    }
}

/// Fixed interface strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Text {
    Welcome,
    MenuBuy,
    MenuAccount,
    MenuLang,
    MenuSupport,
    MenuOrders,
    MenuConfigs,
    Back,
    BackToMain,
    BuyTitle,
    BuyReady,
    BuyCustom,
    ReadyPlanTitle,
    ReadyMonthsTitle,
    ReadyDetailsTitle,
    ReadyDetailsButton,
    CustomServerTitle,
    CustomProtocolTitle,
    CustomMonthsTitle,
    CustomDevicesTitle,
    PaymentTitle,
    PaymentNotSelected,
    PaymentEditConnection,
    SummaryPay,
    PaySimTitle,
    PaySuccess,
    PayFailed,
    PayCancel,
    PayRetry,
    PayMissingDraft,
    PayMissingOrder,
    PayUnavailable,
    CryptobotInvoiceText,
    CryptobotPending,
    CryptobotOpenInvoice,
    CryptobotCheckPayment,
    StarsInvoiceTitle,
    StarsPrecheckoutError,
    LangTitle,
    AccountTitle,
    SupportTitle,
    SupportCreate,
    SupportMy,
    SupportOpenAdmin,
    SupportPrompt,
    SupportEmpty,
    InfoTermsButton,
    InfoPrivacyButton,
    Terms,
    Privacy,
    OrdersTitle,
    OrdersEmpty,
    ConfigsTitle,
    ConfigsEmpty,
    RenewButton,
    ConnectionMissing,
    RenewCountryTitle,
    NodesTitle,
    NodesEmpty,
    ServerLabel,
    ProtocolLabel,
    PaymentLabel,
    ExpiresLabel,
}

impl Text {
    fn pair(self) -> (&'static str, &'static str) {
        match self {
            Self::Welcome => (
                "👋 Welcome! Fast and private VPN in a couple of taps.\nChoose an action below.",
                "👋 Добро пожаловать! Быстрый и приватный VPN в пару нажатий.\nВыберите действие ниже.",
            ),
            Self::MenuBuy => ("🛒 Buy VPN", "🛒 Купить VPN"),
            Self::MenuAccount => ("👤 Account", "👤 Аккаунт"),
            Self::MenuLang => ("🌐 Language", "🌐 Язык"),
            Self::MenuSupport => ("💬 Support", "💬 Поддержка"),
            Self::MenuOrders => ("🧾 My orders", "🧾 Мои заказы"),
            Self::MenuConfigs => ("🔑 My configs", "🔑 Мои конфиги"),
            Self::Back => ("⬅️ Back", "⬅️ Назад"),
            Self::BackToMain => ("🏠 Main menu", "🏠 Главное меню"),
            Self::BuyTitle => ("How would you like to buy?", "Как будем покупать?"),
            Self::BuyReady => ("📦 Ready plans", "📦 Готовые тарифы"),
            Self::BuyCustom => ("🛠 Build your own", "🛠 Собрать свой"),
            Self::ReadyPlanTitle => ("Choose a plan:", "Выберите тариф:"),
            Self::ReadyMonthsTitle => ("Choose the term:", "Выберите срок:"),
            Self::ReadyDetailsTitle => ("📋 Plan details", "📋 Подробнее о тарифах"),
            Self::ReadyDetailsButton => ("ℹ️ Plan details", "ℹ️ Подробнее"),
            Self::CustomServerTitle => ("Choose a server location:", "Выберите локацию сервера:"),
            Self::CustomProtocolTitle => ("Choose a protocol:", "Выберите протокол:"),
            Self::CustomMonthsTitle => ("Choose the term:", "Выберите срок:"),
            Self::CustomDevicesTitle => ("How many devices?", "Сколько устройств?"),
            Self::PaymentTitle => ("Choose a payment method:", "Выберите способ оплаты:"),
            Self::PaymentNotSelected => ("not selected", "не выбрано"),
            Self::PaymentEditConnection => ("✏️ Change plan", "✏️ Изменить тариф"),
            Self::SummaryPay => ("✅ Pay", "✅ Оплатить"),
            Self::PaySimTitle => (
                "SBP test payment. Choose the outcome:",
                "Тестовая оплата СБП. Выберите результат:",
            ),
            Self::PaySuccess => ("✅ Payment succeeded", "✅ Оплата прошла"),
            Self::PayFailed => ("❌ Payment failed", "❌ Ошибка оплаты"),
            Self::PayCancel => ("🚫 Cancel", "🚫 Отменить"),
            Self::PayRetry => ("🔁 Try again", "🔁 Попробовать снова"),
            Self::PayMissingDraft => (
                "Your selection is incomplete. Please start the purchase again.",
                "Выбор не завершён. Пожалуйста, начните покупку заново.",
            ),
            Self::PayMissingOrder => ("Order not found.", "Заказ не найден."),
            Self::PayUnavailable => (
                "This payment method is unavailable right now. Please choose another one.",
                "Этот способ оплаты сейчас недоступен. Выберите другой.",
            ),
            Self::CryptobotInvoiceText => (
                "Invoice created. Pay it in CryptoBot, then press «Check payment».",
                "Счёт создан. Оплатите его в CryptoBot и нажмите «Проверить оплату».",
            ),
            Self::CryptobotPending => (
                "Payment not received yet. Try again in a minute.",
                "Оплата ещё не поступила. Проверьте через минуту.",
            ),
            Self::CryptobotOpenInvoice => ("💳 Open invoice", "💳 Открыть счёт"),
            Self::CryptobotCheckPayment => ("🔄 Check payment", "🔄 Проверить оплату"),
            Self::StarsInvoiceTitle => ("VPN subscription", "Подписка VPN"),
            Self::StarsPrecheckoutError => (
                "This invoice can no longer be paid.",
                "Этот счёт больше нельзя оплатить.",
            ),
            Self::LangTitle => ("Choose your language:", "Выберите язык:"),
            Self::AccountTitle => ("👤 Your account", "👤 Ваш аккаунт"),
            Self::SupportTitle => ("💬 Support and information", "💬 Поддержка и информация"),
            Self::SupportCreate => ("✉️ Write to support", "✉️ Написать в поддержку"),
            Self::SupportMy => ("📨 My tickets", "📨 Мои обращения"),
            Self::SupportOpenAdmin => ("🗂 Open tickets", "🗂 Открытые обращения"),
            Self::SupportPrompt => (
                "Describe your problem in one message.",
                "Опишите проблему одним сообщением.",
            ),
            Self::SupportEmpty => ("No tickets yet.", "Обращений пока нет."),
            Self::InfoTermsButton => ("📄 Terms of service", "📄 Условия использования"),
            Self::InfoPrivacyButton => ("🔒 Privacy policy", "🔒 Политика конфиденциальности"),
            Self::Terms => (
                "📄 Terms of service\n\nThe service is provided for lawful use only. Subscriptions are non-refundable once the configuration has been delivered.",
                "📄 Условия использования\n\nСервис предоставляется только для законного использования. После выдачи конфигурации подписка не возвращается.",
            ),
            Self::Privacy => (
                "🔒 Privacy policy\n\nWe store your Telegram id, orders and support requests. Traffic is not logged.",
                "🔒 Политика конфиденциальности\n\nМы храним ваш Telegram id, заказы и обращения. Трафик не логируется.",
            ),
            Self::OrdersTitle => ("🧾 Recent orders", "🧾 Последние заказы"),
            Self::OrdersEmpty => ("You have no orders yet.", "У вас пока нет заказов."),
            Self::ConfigsTitle => ("🔑 Your connections", "🔑 Ваши подключения"),
            Self::ConfigsEmpty => ("You have no connections yet.", "У вас пока нет подключений."),
            Self::RenewButton => ("🔁 Renew", "🔁 Продлить"),
            Self::ConnectionMissing => ("Connection not found.", "Подключение не найдено."),
            Self::RenewCountryTitle => (
                "Choose a country for the new configuration:",
                "Выберите страну для новой конфигурации:",
            ),
            Self::NodesTitle => ("Choose a server:", "Выберите сервер:"),
            Self::NodesEmpty => (
                "No servers are available in this country right now.",
                "Сейчас в этой стране нет доступных серверов.",
            ),
            Self::ServerLabel => ("Server", "Сервер"),
            Self::ProtocolLabel => ("Protocol", "Протокол"),
            Self::PaymentLabel => ("Payment", "Оплата"),
            Self::ExpiresLabel => ("Expires", "Действует до"),
        }
    }
}

/// Display name of a server key.
pub fn server_label(lang: Lang, server: &str) -> String {
    let name = match (lang, server) {
        (Lang::En, "auto") => "🌍 Auto (best server)",
        (Lang::Ru, "auto") => "🌍 Авто (лучший сервер)",
        (Lang::En, "de") => "🇩🇪 Germany",
        (Lang::Ru, "de") => "🇩🇪 Германия",
        (Lang::En, "fi") => "🇫🇮 Finland",
        (Lang::Ru, "fi") => "🇫🇮 Финляндия",
        (Lang::En, "no") => "🇳🇴 Norway",
        (Lang::Ru, "no") => "🇳🇴 Норвегия",
        (Lang::En, "nl") => "🇳🇱 Netherlands",
        (Lang::Ru, "nl") => "🇳🇱 Нидерланды",
        _ => return server.to_string(),
    };
    name.to_string()
}

/// Display name of a protocol key.
pub fn protocol_label(protocol: &str) -> String {
    match protocol {
        "wireguard" => "WireGuard".to_string(),
        "vless" => "VLESS".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Display name of a payment method key.
pub fn payment_label(lang: Lang, method: &str) -> String {
    let name = match (lang, method) {
        (Lang::En, "sbp") => "🏦 SBP (test)",
        (Lang::Ru, "sbp") => "🏦 СБП (тест)",
        (_, "stars") => "⭐ Telegram Stars",
        (_, "cryptobot") => "🪙 CryptoBot",
        _ => return method.to_string(),
    };
    name.to_string()
}

/// Short word for a month count.
pub fn months_label(lang: Lang, months: u32) -> String {
    match lang {
        Lang::En => format!("{months} mo"),
        Lang::Ru => format!("{months} мес"),
    }
}

pub fn devices_label(lang: Lang, devices: u32) -> String {
    match lang {
        Lang::En if devices == 1 => "1 device".to_string(),
        Lang::En => format!("{devices} devices"),
        Lang::Ru => format!("{devices} устр."),
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_text_is_translated() {
        for text in Text::iter() {
            for lang in Lang::iter() {
                assert!(!lang.t(text).is_empty(), "{text:?} missing for {lang}");
            }
            let (en, ru) = text.pair();
            assert_ne!(en, ru, "{text:?} is not translated");
        }
    }

    #[test]
    fn detection_uses_base_language() {
        assert_eq!(Lang::detect(Some("ru-RU"), "en"), Lang::Ru);
        assert_eq!(Lang::detect(Some("EN"), "ru"), Lang::En);
        assert_eq!(Lang::detect(Some("de"), "ru"), Lang::Ru);
        assert_eq!(Lang::detect(None, "xx"), Lang::En);
    }

    #[test]
    fn resolution_prefers_stored_language() {
        assert_eq!(Lang::resolve(Some("ru"), "en"), Lang::Ru);
        assert_eq!(Lang::resolve(Some("fr"), "ru"), Lang::Ru);
        assert_eq!(Lang::resolve(None, "fr"), Lang::En);
    }

    #[test]
    fn labels() {
        assert_eq!(protocol_label("wireguard"), "WireGuard");
        assert_eq!(protocol_label("hysteria"), "Hysteria");
        assert_eq!(server_label(Lang::Ru, "de"), "🇩🇪 Германия");
        assert_eq!(server_label(Lang::En, "DE-1"), "DE-1");
        assert_eq!(payment_label(Lang::En, "stars"), "⭐ Telegram Stars");
        assert_eq!(devices_label(Lang::En, 1), "1 device");
    }
}
