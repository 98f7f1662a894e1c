//! Content language codes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use waypass_core::AppError;

/// Content languages served by the product.
///
/// The set is closed; "all active languages" means every variant here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LanguageCode {
    /// Spanish.
    Es,
    /// English.
    En,
    /// French.
    Fr,
    /// Italian.
    It,
}

impl LanguageCode {
    /// Returns a stable storage value for this language.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
            Self::Fr => "fr",
            Self::It => "it",
        }
    }

    /// Returns all active languages.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[LanguageCode] = &[
            LanguageCode::Es,
            LanguageCode::En,
            LanguageCode::Fr,
            LanguageCode::It,
        ];

        ALL
    }
}

impl FromStr for LanguageCode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "es" => Ok(Self::Es),
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            "it" => Ok(Self::It),
            _ => Err(AppError::Validation(format!(
                "unknown language code '{value}'"
            ))),
        }
    }
}
