use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Locale {
        match tag.to_ascii_lowercase().as_str() {
            "ru" | "ru-ru" => Locale::Ru,
            t if t.starts_with("ru") => Locale::Ru,
            _ => Locale::En,
        }
    }
}

/// `?lang=` wins over `Accept-Language`; anything unrecognised is English.
pub fn detect_locale(req: &HttpRequest) -> Locale {
    if let Some(lang) = req.query_string().split('&').find_map(|kv| {
        let (k, v) = kv.split_once('=')?;
        if k == "lang" { Some(v) } else { None }
    }) {
        return Locale::from_tag(lang);
    }

    if let Some(h) = req.headers().get("Accept-Language").and_then(|v| v.to_str().ok()) {
        return Locale::from_tag(h.trim());
    }

    Locale::En
}

pub fn no_results(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Запрос выполнен, но результатов нет.",
        Locale::En => "The query completed but returned no results.",
    }
}

pub fn more_rows(locale: Locale, omitted: usize) -> String {
    match locale {
        Locale::Ru => format!("… ещё строк: {}", omitted),
        Locale::En if omitted == 1 => "… 1 more row".to_string(),
        Locale::En => format!("… {} more rows", omitted),
    }
}

pub fn error_prefix(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Не удалось получить ответ",
        Locale::En => "Sorry, the question could not be answered",
    }
}

pub fn timed_out(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Сервис не ответил вовремя. Попробуйте задать вопрос ещё раз.",
        Locale::En => "The query service did not finish in time. Please try asking again.",
    }
}

pub fn interrupted(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Запрос был прерван до получения ответа.",
        Locale::En => "The question was interrupted before an answer arrived.",
    }
}

pub fn service_unreachable(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Сервис запросов недоступен",
        Locale::En => "The query service could not be reached",
    }
}

pub fn service_failed(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Сервис запросов сообщил об ошибке",
        Locale::En => "The query service reported an error",
    }
}

pub fn not_configured(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Ассистент не настроен.",
        Locale::En => "The assistant is not configured.",
    }
}

pub fn request_rejected(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Вопрос не был принят.",
        Locale::En => "The question was not accepted.",
    }
}
