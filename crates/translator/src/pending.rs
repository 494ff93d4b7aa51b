//! Pending translation bookkeeping
//!
//! The coordinator owns one entry per in-flight message. Every entry is
//! resolved exactly once: resolving removes it from the map before the
//! completion is delivered.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

use anuvaad_engine::{MessageId, TranslationId, TranslationResponse};

use crate::TranslatorError;

/// One outstanding request awaiting a worker response.
pub(crate) struct PendingTranslation {
    #[allow(dead_code)]
    pub translation_id: TranslationId,
    pub pair_key: String,
    pub tx: oneshot::Sender<Result<TranslationResponse, TranslatorError>>,
}

/// Map of message id → pending translation.
#[derive(Default)]
pub(crate) struct PendingMap {
    inner: Mutex<HashMap<MessageId, PendingTranslation>>,
}

impl PendingMap {
    pub fn insert(&self, message_id: MessageId, pending: PendingTranslation) {
        self.inner.lock().insert(message_id, pending);
    }

    pub fn remove(&self, message_id: MessageId) -> Option<PendingTranslation> {
        self.inner.lock().remove(&message_id)
    }

    pub fn resolve(&self, response: TranslationResponse) {
        match self.remove(response.message_id) {
            Some(pending) => {
                let _ = pending.tx.send(Ok(response));
            }
            None => {
                // Cancelled, discarded, or already failed; the result is
                // dropped.
                tracing::debug!(
                    message_id = response.message_id,
                    "Response for unknown message discarded"
                );
            }
        }
    }

    pub fn reject(&self, message_id: MessageId, error: TranslatorError) {
        if let Some(pending) = self.remove(message_id) {
            let _ = pending.tx.send(Err(error));
        }
    }

    /// Fail every pending message for one pair with the same error.
    pub fn reject_pair(&self, pair_key: &str, make_error: impl Fn() -> TranslatorError) {
        let drained: Vec<PendingTranslation> = {
            let mut inner = self.inner.lock();
            let ids: Vec<MessageId> = inner
                .iter()
                .filter(|(_, p)| p.pair_key == pair_key)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter().filter_map(|id| inner.remove(&id)).collect()
        };
        for pending in drained {
            let _ = pending.tx.send(Err(make_error()));
        }
    }

    /// Fail every pending message.
    pub fn reject_all(&self, make_error: impl Fn() -> TranslatorError) {
        let drained: Vec<PendingTranslation> = {
            let mut inner = self.inner.lock();
            inner.drain().map(|(_, p)| p).collect()
        };
        for pending in drained {
            let _ = pending.tx.send(Err(make_error()));
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}
