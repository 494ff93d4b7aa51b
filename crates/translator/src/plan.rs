//! Translation planning
//!
//! Pure computation of how a (canonical) pair is served: identity,
//! deterministic script conversion, or a neural engine with optional
//! pre/post conversion and pivoting through English.

use anuvaad_core::language::{
    from_hans, is_han, is_han_variant, to_hans, HanConversion, LanguagePair, SIMPLIFIED_CHINESE,
};

/// How one translation request is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Source equals target; return the input unchanged.
    Identity,
    /// Pure script conversion; no neural engine involved. One step for a
    /// simple conversion, two for a variant→variant chain.
    Script { steps: Vec<HanConversion> },
    /// Neural translation on the effective pair.
    Neural {
        pair: LanguagePair,
        pre: Option<HanConversion>,
        post: Option<HanConversion>,
        /// Two models (source→en, en→target) in one engine.
        pivot: bool,
    },
}

/// Compute the plan for canonical `from`/`to` tags. `has_direct` answers
/// whether a pair is modeled as a single hop.
pub fn compute(from: &str, to: &str, has_direct: impl Fn(&LanguagePair) -> bool) -> Plan {
    if from == to {
        return Plan::Identity;
    }

    let mut pre = None;
    let mut post = None;
    let mut effective_from = from;
    let mut effective_to = to;

    if is_han_variant(from) {
        pre = to_hans(from);
        effective_from = SIMPLIFIED_CHINESE;
    }
    if is_han_variant(to) {
        post = from_hans(to);
        effective_to = SIMPLIFIED_CHINESE;
    }

    if is_han(effective_from) && is_han(effective_to) {
        let steps: Vec<HanConversion> = pre.into_iter().chain(post).collect();
        return Plan::Script { steps };
    }

    let pair = LanguagePair::new(effective_from, effective_to);
    let pivot = !has_direct(&pair);
    Plan::Neural {
        pair,
        pre,
        post,
        pivot,
    }
}
