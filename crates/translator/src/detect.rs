//! Language detection
//!
//! Short-text classification via a statistical classifier with a
//! script-map fallback. Detection never fails: every internal miss
//! collapses to `"en"`.
//!
//! Mapping rule: the classifier yields an ISO 639-3 code. If it has a
//! two-letter equivalent, that is the answer; otherwise the code is
//! looked up in a fixed rewrite table mapping minority and regional
//! languages onto a related major language; otherwise `"en"`.

use anuvaad_core::{ENGLISH, SIMPLIFIED_CHINESE};

/// Rewrite table for classifier codes without a usable two-letter tag.
/// Routing behavior depends on these exact entries.
const ALPHA3_REWRITES: &[(&str, &str)] = &[
    ("cmn", SIMPLIFIED_CHINESE),
    ("yue", "zh-Hant"),
    ("wuu", SIMPLIFIED_CHINESE),
    ("nan", "zh-Hant"),
    ("hak", "zh-Hant"),
    ("bho", "hi"),
    ("mai", "hi"),
    ("mag", "hi"),
    ("awa", "hi"),
    ("hne", "hi"),
];

/// Statistical language detector with a script-map fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    /// Classify a short text to a language tag, `"en"` when uncertain.
    ///
    /// Runs of whitespace are collapsed first; empty input is `"en"`.
    /// Input truncation is the caller's job.
    pub fn detect(&self, text: &str) -> String {
        let cleaned = collapse_whitespace(text);
        if cleaned.is_empty() {
            return ENGLISH.to_string();
        }

        match whatlang::detect(&cleaned) {
            Some(info) => classify(info.lang().code()),
            None => script_fallback(&cleaned),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn classify(alpha3: &str) -> String {
    if let Some(alpha2) = alpha2_for(alpha3) {
        return alpha2.to_string();
    }
    for (code, rewrite) in ALPHA3_REWRITES {
        if *code == alpha3 {
            return rewrite.to_string();
        }
    }
    ENGLISH.to_string()
}

/// ISO 639-3 → ISO 639-1 for every code the classifier can produce.
/// Chinese codes are deliberately absent here; they go through the
/// rewrite table so they land on a script-qualified tag.
fn alpha2_for(alpha3: &str) -> Option<&'static str> {
    let alpha2 = match alpha3 {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "arb" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    };
    Some(alpha2)
}

/// Script-map fallback for texts the classifier cannot call: bucket
/// characters by script block and map the dominant block to a language.
fn script_fallback(text: &str) -> String {
    let mut hiragana_katakana = 0usize;
    let mut hangul = 0usize;
    let mut han = 0usize;

    for c in text.chars() {
        let code = c as u32;
        match code {
            0x3040..=0x30FF => hiragana_katakana += 1,
            0xAC00..=0xD7AF | 0x1100..=0x11FF => hangul += 1,
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => han += 1,
            _ => {}
        }
    }

    let best = hiragana_katakana.max(hangul).max(han);
    if best == 0 {
        ENGLISH.to_string()
    } else if best == hiragana_katakana {
        "ja".to_string()
    } else if best == hangul {
        "ko".to_string()
    } else {
        SIMPLIFIED_CHINESE.to_string()
    }
}
