//! Locales and message catalogs.
//!
//! Catalogs live in `locales/{en,pt,es}.yaml` and are embedded at compile
//! time. Nested YAML maps are flattened into dotted keys (`Login.title`).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    #[default]
    En,
    Pt,
    Es,
}

impl Locale {
    pub const ALL: [Self; 3] = [Self::En, Self::Pt, Self::Es];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Pt => "pt",
            Self::Es => "es",
        }
    }

    /// Catalog key of the language's name in the switcher.
    #[must_use]
    pub fn name_key(self) -> &'static str {
        match self {
            Self::En => "LanguageSwitcher.english",
            Self::Pt => "LanguageSwitcher.portuguese",
            Self::Es => "LanguageSwitcher.spanish",
        }
    }

    /// Locale named by the first segment of `path`, if any.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        path.trim_start_matches('/')
            .split('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "pt" => Ok(Self::Pt),
            "es" => Ok(Self::Es),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

/// Reads the locale from the first path segment; unknown locales are 404.
impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_path(parts.uri.path()).ok_or(AppError::NotFound)
    }
}

type Catalog = HashMap<String, String>;

static CATALOGS: LazyLock<HashMap<Locale, Catalog>> = LazyLock::new(|| {
    [
        (Locale::En, include_str!("../../locales/en.yaml")),
        (Locale::Pt, include_str!("../../locales/pt.yaml")),
        (Locale::Es, include_str!("../../locales/es.yaml")),
    ]
    .into_iter()
    .map(|(locale, source)| (locale, load_catalog(locale, source)))
    .collect()
});

fn load_catalog(locale: Locale, source: &str) -> Catalog {
    let mut catalog = Catalog::new();
    match serde_yaml::from_str::<serde_yaml::Value>(source) {
        Ok(root) => flatten("", &root, &mut catalog),
        Err(e) => {
            tracing::error!(
                name: "i18n.catalog.invalid",
                locale = %locale,
                error = %e,
                "Message catalog failed to parse"
            );
        }
    }
    catalog
}

fn flatten(prefix: &str, value: &serde_yaml::Value, out: &mut Catalog) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let Some(k) = k.as_str() else { continue };
                let key = if prefix.is_empty() {
                    k.to_string()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        serde_yaml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        serde_yaml::Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        serde_yaml::Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        _ => {}
    }
}

/// Translate `key`, falling back to English and then to the key itself.
#[must_use]
pub fn t(locale: Locale, key: &str) -> String {
    CATALOGS
        .get(&locale)
        .and_then(|c| c.get(key))
        .or_else(|| CATALOGS.get(&Locale::En).and_then(|c| c.get(key)))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Translate `key` and substitute `{name}` placeholders.
#[must_use]
pub fn t_with(locale: Locale, key: &str, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(t(locale, key), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}

/// Same path under another locale, for the language switcher.
#[must_use]
pub fn switch_locale_path(path: &str, locale: Locale) -> String {
    let trimmed = path.trim_start_matches('/');
    let (first, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));

    if first.parse::<Locale>().is_ok() {
        if rest.is_empty() {
            format!("/{locale}")
        } else {
            format!("/{locale}/{rest}")
        }
    } else if trimmed.is_empty() {
        format!("/{locale}")
    } else {
        format!("/{locale}/{trimmed}")
    }
}
