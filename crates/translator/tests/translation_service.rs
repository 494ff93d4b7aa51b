//! End-to-end tests for the translation service (plan -> pool -> result)
//!
//! These run against a seeded offline model store and a deterministic
//! tagging runtime, so every expected output is exact.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::timeout;

use anuvaad_engine::EngineError;
use anuvaad_translator::{Texts, TranslatorError};
use common::{service, service_with, RuntimeBehavior};

/// S1: a directly modeled pair goes through one pool, no conversion.
#[tokio::test]
async fn test_direct_pair_simple_text() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let result = svc
        .translator
        .translate("Hello, world!", "en", "zh-Hans")
        .await
        .unwrap();

    assert_eq!(result, Texts::One("[en-zh-Hans] Hello, world!".to_string()));
    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 1);
    assert_eq!(svc.runtime_calls.load(Ordering::SeqCst), 1);
    assert_eq!(svc.convert_calls.load(Ordering::SeqCst), 0);

    let stats = svc.translator.stats();
    assert_eq!(stats.pools.len(), 1);
    assert_eq!(stats.pools[0].pair, "en_zh-Hans");
    assert!(!stats.pools[0].pivoting);
}

/// S2: a pair without a direct model pivots through English inside one
/// engine.
#[tokio::test]
async fn test_pivot_pair() {
    let svc = service(&[("ja", "en"), ("en", "zh-Hans")]).await;

    let result = svc
        .translator
        .translate("こんにちは、世界！", "ja", "zh-Hans")
        .await
        .unwrap();

    assert_eq!(
        result,
        Texts::One("[ja-en-zh-Hans] こんにちは、世界！".to_string())
    );

    let stats = svc.translator.stats();
    assert_eq!(stats.pools.len(), 1);
    assert!(stats.pools[0].pivoting);
}

/// S3: Simplified → Traditional is a pure conversion; no engine is built.
#[tokio::test]
async fn test_pure_script_conversion() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let result = svc
        .translator
        .translate("简体中文", "zh-Hans", "zh-Hant")
        .await
        .unwrap();

    assert_eq!(result, Texts::One("s2t(简体中文)".to_string()));
    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 0);
    assert_eq!(svc.convert_calls.load(Ordering::SeqCst), 1);
}

/// S4: variant → variant chains through Simplified; still no engine.
#[tokio::test]
async fn test_complex_script_conversion() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let result = svc
        .translator
        .translate("繁體中文", "zh-Hant", "zh-HK")
        .await
        .unwrap();

    assert_eq!(result, Texts::One("s2hk(t2s(繁體中文))".to_string()));
    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 0);
    assert_eq!(svc.convert_calls.load(Ordering::SeqCst), 2);
}

/// S5: "auto" detects the source and then routes normally.
#[tokio::test]
async fn test_auto_detection() {
    let svc = service(&[("ru", "en")]).await;

    let result = svc
        .translator
        .translate("Супербыстрый движок", "auto", "en")
        .await
        .unwrap();

    assert_eq!(result, Texts::One("[ru-en] Супербыстрый движок".to_string()));
}

/// S6: batch order is preserved and blanks never reach a worker.
#[tokio::test]
async fn test_batch_ordering_and_blanks() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let result = svc
        .translator
        .translate(vec!["A", "", "B"], "en", "zh-Hans")
        .await
        .unwrap();

    assert_eq!(
        result,
        Texts::Many(vec![
            "[en-zh-Hans] A".to_string(),
            String::new(),
            "[en-zh-Hans] B".to_string(),
        ])
    );
    assert_eq!(svc.runtime_calls.load(Ordering::SeqCst), 2);
}

/// Identity short-circuits, including through aliases.
#[tokio::test]
async fn test_identity_short_circuit() {
    let svc = service(&[("en", "de"), ("de", "en")]).await;

    let result = svc.translator.translate("hallo", "de", "de").await.unwrap();
    assert_eq!(result, Texts::One("hallo".to_string()));

    // "zh" aliases to "zh-Hans", so this is an identity too.
    let svc = service(&[("en", "zh-Hans")]).await;
    let result = svc
        .translator
        .translate("简体", "zh", "zh-Hans")
        .await
        .unwrap();
    assert_eq!(result, Texts::One("简体".to_string()));
    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 0);
}

/// Whitespace-only input produces the empty string without dispatch.
#[tokio::test]
async fn test_whitespace_only_input() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let result = svc
        .translator
        .translate("   \t ", "en", "zh-Hans")
        .await
        .unwrap();

    assert_eq!(result, Texts::One(String::new()));
    assert_eq!(svc.runtime_calls.load(Ordering::SeqCst), 0);
    // The pool was still built for the pair; only dispatch is skipped.
}

/// Leading and trailing whitespace of each text survives translation.
#[tokio::test]
async fn test_whitespace_wrapping_preserved() {
    let svc = service(&[("en", "de")]).await;

    let result = svc
        .translator
        .translate("  hi \n", "en", "de")
        .await
        .unwrap();

    assert_eq!(result, Texts::One("  [en-de] hi \n".to_string()));
}

/// Unknown tags are rejected up front.
#[tokio::test]
async fn test_invalid_language() {
    let svc = service(&[("en", "de")]).await;

    let err = svc
        .translator
        .translate("x", "xx", "en")
        .await
        .unwrap_err();
    assert!(matches!(err, TranslatorError::InvalidLanguage(tag) if tag == "xx"));

    let err = svc
        .translator
        .translate("x", "en", "yy")
        .await
        .unwrap_err();
    assert!(matches!(err, TranslatorError::InvalidLanguage(tag) if tag == "yy"));
}

/// A variant source is pre-converted, then translated from Simplified.
#[tokio::test]
async fn test_variant_source_pre_conversion() {
    let svc = service(&[("zh-Hans", "en")]).await;

    let result = svc
        .translator
        .translate("繁體文字", "zh-Hant", "en")
        .await
        .unwrap();

    assert_eq!(result, Texts::One("[zh-Hans-en] t2s(繁體文字)".to_string()));
}

/// A variant target is translated to Simplified, then post-converted.
#[tokio::test]
async fn test_variant_target_post_conversion() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let result = svc
        .translator
        .translate("hello", "en", "zh-TW")
        .await
        .unwrap();

    assert_eq!(result, Texts::One("s2tw([en-zh-Hans] hello)".to_string()));
}

/// Preloading twice reuses the cached entry; no second pool is built.
#[tokio::test]
async fn test_preload_is_cached() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let handle = svc.translator.preload("en", "zh-Hans").await.unwrap();
    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 1);

    let _again = svc.translator.preload("en", "zh-Hans").await.unwrap();
    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 1);

    let result = handle.translate("hey").await.unwrap();
    assert_eq!(result, Texts::One("[en-zh-Hans] hey".to_string()));
}

/// Concurrent requests against the same new pair build exactly one pool.
#[tokio::test]
async fn test_single_flight_pool_construction() {
    let svc = service(&[("en", "zh-Hans")]).await;

    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let translator = svc.translator.clone();
            tokio::spawn(async move {
                translator
                    .translate(format!("text {n}"), "en", "zh-Hans")
                    .await
            })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap().unwrap();
        assert!(matches!(result, Texts::One(text) if text.starts_with("[en-zh-Hans] text")));
    }

    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 1);
    assert_eq!(svc.translator.stats().pools.len(), 1);
}

/// Supported languages include catalog tags, variants, and aliases.
#[tokio::test]
async fn test_supported_languages() {
    let svc = service(&[("en", "zh-Hans"), ("en", "de")]).await;

    let supported = svc.translator.supported_languages();
    for tag in ["en", "de", "zh-Hans", "zh-Hant", "zh-HK", "zh-TW", "zh", "zh-CN"] {
        assert!(supported.contains(&tag.to_string()), "missing {tag}");
    }
    assert!(!supported.contains(&"fr".to_string()));
}

/// A failed inference fails that request; the pool stays usable.
#[tokio::test]
async fn test_single_translation_failure_keeps_pool() {
    let svc = service_with(
        &[("en", "de")],
        RuntimeBehavior::FailTranslations,
        |_| {},
    )
    .await;

    let err = svc
        .translator
        .translate("hello", "en", "de")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TranslatorError::Engine(EngineError::Translation(_))
    ));
    assert_eq!(svc.translator.stats().pools.len(), 1);
}

/// A worker fault destroys the pool; a later call rebuilds it.
#[tokio::test]
async fn test_worker_fault_evicts_pool() {
    let svc = service_with(&[("en", "de")], RuntimeBehavior::Panic, |_| {}).await;

    let err = timeout(
        Duration::from_secs(10),
        svc.translator.translate("hello", "en", "de"),
    )
    .await
    .expect("translate timed out")
    .unwrap_err();

    assert!(matches!(
        err,
        TranslatorError::Engine(EngineError::WorkerLost(_)) | TranslatorError::Shutdown
    ));

    // The faulted pool is gone from the cache.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while svc.translator.stats().pools.len() != 0 {
        assert!(std::time::Instant::now() < deadline, "pool not evicted");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(svc.engines_created.load(Ordering::SeqCst), 1);
}

/// Shutdown rejects in-flight work, empties the cache, and sticks.
#[tokio::test]
async fn test_shutdown() {
    let svc = service_with(&[("en", "de")], RuntimeBehavior::Slow, |_| {}).await;

    let translator = svc.translator.clone();
    let in_flight =
        tokio::spawn(async move { translator.translate("slow one", "en", "de").await });

    // Give the request time to reach the worker.
    tokio::time::sleep(Duration::from_millis(100)).await;
    svc.translator.shutdown().await;

    let err = timeout(Duration::from_secs(5), in_flight)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancellation(), "unexpected error: {err}");

    assert_eq!(svc.translator.stats().pools.len(), 0);
    assert_eq!(svc.translator.stats().pending, 0);

    // Further calls fail with Shutdown; a second shutdown is a no-op.
    let err = svc
        .translator
        .translate("more", "en", "de")
        .await
        .unwrap_err();
    assert!(matches!(err, TranslatorError::Shutdown));
    svc.translator.shutdown().await;
}

/// Discarding a pair voids its in-flight requests but keeps it usable.
#[tokio::test]
async fn test_discard_translations() {
    let svc = service_with(&[("en", "de")], RuntimeBehavior::Slow, |_| {}).await;

    // Warm the pool, then put a batch in flight.
    svc.translator.preload("en", "de").await.unwrap();
    let translator = svc.translator.clone();
    let in_flight = tokio::spawn(async move {
        translator
            .translate(vec!["one", "two", "three"], "en", "de")
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    svc.translator.discard_translations("en", "de").await.unwrap();

    let err = timeout(Duration::from_secs(5), in_flight)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        TranslatorError::Engine(EngineError::Discarded)
    ));

    // The pool survives a discard.
    assert_eq!(svc.translator.stats().pools.len(), 1);
    let result = svc.translator.translate("after", "en", "de").await.unwrap();
    assert_eq!(result, Texts::One("[en-de] after".to_string()));
}

/// Idle pools are swept out after the timeout.
#[tokio::test]
async fn test_idle_eviction() {
    let svc = service_with(&[("en", "de")], RuntimeBehavior::Tag, |settings| {
        settings.idle_timeout_min = 0.002; // 120 ms
        settings.memory_check_interval_ms = 40;
    })
    .await;

    svc.translator.translate("hi", "en", "de").await.unwrap();
    assert_eq!(svc.translator.stats().pools.len(), 1);

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while svc.translator.stats().pools.len() != 0 {
        assert!(std::time::Instant::now() < deadline, "pool never evicted");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// A non-positive idle timeout disables eviction entirely.
#[tokio::test]
async fn test_idle_eviction_disabled() {
    let svc = service_with(&[("en", "de")], RuntimeBehavior::Tag, |settings| {
        settings.idle_timeout_min = 0.0;
        settings.memory_check_interval_ms = 25;
    })
    .await;

    svc.translator.translate("hi", "en", "de").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(svc.translator.stats().pools.len(), 1);
}

/// Scalar input yields scalar output; list input yields list output.
#[tokio::test]
async fn test_shape_preservation() {
    let svc = service(&[("en", "de")]).await;

    let scalar = svc.translator.translate("one", "en", "de").await.unwrap();
    assert!(matches!(scalar, Texts::One(_)));

    let list = svc
        .translator
        .translate(vec!["one"], "en", "de")
        .await
        .unwrap();
    assert!(matches!(list, Texts::Many(ref texts) if texts.len() == 1));
}
