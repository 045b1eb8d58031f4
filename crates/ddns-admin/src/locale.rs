//! Operator-facing language selection and message rendering

use serde::{Deserialize, Serialize};

/// Language used for rejections and warnings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// English
    #[default]
    En,
    /// Simplified Chinese
    Zh,
}

impl Lang {
    /// Pick a language from an `Accept-Language` header value
    ///
    /// Only the first (most preferred) tag is consulted. Anything that is
    /// not Chinese falls back to English.
    pub fn from_accept_language(header: Option<&str>) -> Self {
        let first_tag = header
            .and_then(|h| h.split(',').next())
            .and_then(|tag| tag.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if first_tag.starts_with("zh") {
            Lang::Zh
        } else {
            Lang::En
        }
    }
}

/// Render a 1-based position as an ordinal ("1st", "第1")
pub fn ordinal(n: usize, lang: Lang) -> String {
    match lang {
        Lang::Zh => format!("第{n}"),
        Lang::En => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{n}{suffix}")
        }
    }
}

/// Soft warnings raised while assembling an update
///
/// Warnings never block an update; they are logged and handed back to the
/// caller next to the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The entry at this 1-based position has neither IPv4 nor IPv6 domains
    NoDomains {
        /// 1-based position in the submitted list
        position: usize,
    },
}

impl Warning {
    /// Operator-facing message in the given language
    pub fn message(&self, lang: Lang) -> String {
        match self {
            Warning::NoDomains { position } => {
                let nth = ordinal(*position, lang);
                match lang {
                    Lang::En => format!("The {nth} configuration has no domains filled in"),
                    Lang::Zh => format!("{nth} 个配置未填写域名"),
                }
            }
        }
    }
}
