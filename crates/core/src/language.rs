//! Language tags, pairs, and Han-script conversion tables
//!
//! Language codes are opaque BCP-47-style tags. The set of supported
//! languages is not a closed enum: it is derived from the model catalog at
//! runtime. This module carries only the static knowledge the router needs:
//! alias canonicalization and the Chinese script variants that are handled
//! by deterministic conversion instead of a neural model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudo-tag requesting source-language detection.
pub const AUTO: &str = "auto";

/// The pivot language for indirect pairs.
pub const ENGLISH: &str = "en";

/// Canonical tag for Simplified Chinese, the modeled Han script.
pub const SIMPLIFIED_CHINESE: &str = "zh-Hans";

/// Chinese script variants that are not directly modeled. Each routes
/// through [`to_hans`] / [`from_hans`] conversion around the Simplified
/// models.
pub const HAN_VARIANTS: &[&str] = &["zh-Hant", "zh-HK", "zh-TW"];

/// An ordered `(from, to)` pair of language tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub from: String,
    pub to: String,
}

impl LanguagePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Stable map key, `"{from}_{to}"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.from, self.to)
    }

    /// Parse a pair back out of a [`key`](Self::key) string.
    pub fn from_key(key: &str) -> Option<Self> {
        let (from, to) = key.split_once('_')?;
        if from.is_empty() || to.is_empty() {
            return None;
        }
        Some(Self::new(from, to))
    }

    /// The two single-hop pairs used when pivoting through English.
    pub fn pivot_legs(&self) -> (LanguagePair, LanguagePair) {
        (
            LanguagePair::new(self.from.clone(), ENGLISH),
            LanguagePair::new(ENGLISH, self.to.clone()),
        )
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.from, self.to)
    }
}

/// Alternate tags and the canonical tag each maps onto.
pub const ALIASES: &[(&str, &str)] = &[
    ("zh", SIMPLIFIED_CHINESE),
    ("zh-CN", SIMPLIFIED_CHINESE),
    ("zh-SG", SIMPLIFIED_CHINESE),
    ("iw", "he"),
    ("in", "id"),
    ("no", "nb"),
];

/// Map an alternate tag onto the canonical tag used by the catalog.
///
/// Unrecognized tags pass through unchanged; validation against the
/// supported set happens separately.
pub fn canonicalize(tag: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(tag)
}

/// A deterministic Han-script conversion scheme.
///
/// The converter backend is an external collaborator (see
/// [`crate::traits::ScriptConverter`]); these values name which transform
/// to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HanConversion {
    TraditionalToSimplified,
    HongKongToSimplified,
    TaiwanToSimplified,
    SimplifiedToTraditional,
    SimplifiedToHongKong,
    SimplifiedToTaiwan,
}

impl HanConversion {
    /// Stable scheme identifier understood by converter backends.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::TraditionalToSimplified => "t2s",
            Self::HongKongToSimplified => "hk2s",
            Self::TaiwanToSimplified => "tw2s",
            Self::SimplifiedToTraditional => "s2t",
            Self::SimplifiedToHongKong => "s2hk",
            Self::SimplifiedToTaiwan => "s2tw",
        }
    }
}

impl fmt::Display for HanConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scheme())
    }
}

/// Check whether a tag is a Chinese script variant routed via conversion.
pub fn is_han_variant(tag: &str) -> bool {
    HAN_VARIANTS.contains(&tag)
}

/// Check whether a tag uses Han script at all (variant or Simplified).
pub fn is_han(tag: &str) -> bool {
    tag == SIMPLIFIED_CHINESE || is_han_variant(tag)
}

/// Conversion from a script variant into Simplified Chinese.
pub fn to_hans(variant: &str) -> Option<HanConversion> {
    match variant {
        "zh-Hant" => Some(HanConversion::TraditionalToSimplified),
        "zh-HK" => Some(HanConversion::HongKongToSimplified),
        "zh-TW" => Some(HanConversion::TaiwanToSimplified),
        _ => None,
    }
}

/// Conversion from Simplified Chinese into a script variant.
pub fn from_hans(variant: &str) -> Option<HanConversion> {
    match variant {
        "zh-Hant" => Some(HanConversion::SimplifiedToTraditional),
        "zh-HK" => Some(HanConversion::SimplifiedToHongKong),
        "zh-TW" => Some(HanConversion::SimplifiedToTaiwan),
        _ => None,
    }
}
