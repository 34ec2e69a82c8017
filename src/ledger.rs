use std::sync::Mutex;

use crate::request::LedgerSelector;

#[derive(Debug, Default, Clone)]
struct LedgerView {
    validated_index: Option<u64>,
    validated_hash: Option<String>,
}

/// Tracks the most recent validated ledger observed from server responses.
///
/// The tracker never hands out its cached numeric index as a request
/// default: a cached index may be stale relative to whichever server ends
/// up serving the request, so [`LedgerTracker::default_selector`] yields the
/// `"validated"` keyword instead.
#[derive(Debug, Default)]
pub struct LedgerTracker {
    inner: Mutex<LedgerView>,
}

impl LedgerTracker {
    /// Records a validated ledger seen in a server message.
    pub fn observe(&self, index: u64, hash: Option<&str>) {
        let mut view = self.inner.lock().expect("ledger view mutex poisoned");
        view.validated_index = Some(index);
        if let Some(hash) = hash {
            view.validated_hash = Some(hash.to_string());
        }
    }

    pub fn validated_index(&self) -> Option<u64> {
        self.inner
            .lock()
            .expect("ledger view mutex poisoned")
            .validated_index
    }

    pub fn validated_hash(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("ledger view mutex poisoned")
            .validated_hash
            .clone()
    }

    /// Selector to use when a request needs a ledger but the caller gave
    /// none: always the keyword identifier, never a cached numeric index.
    pub fn default_selector(&self) -> LedgerSelector {
        LedgerSelector::Identifier("validated".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_updates_the_view() {
        let tracker = LedgerTracker::default();
        assert_eq!(tracker.validated_index(), None);

        tracker.observe(9592219, Some("AB"));
        assert_eq!(tracker.validated_index(), Some(9592219));
        assert_eq!(tracker.validated_hash().as_deref(), Some("AB"));

        tracker.observe(9592220, None);
        assert_eq!(tracker.validated_index(), Some(9592220));
        assert_eq!(tracker.validated_hash().as_deref(), Some("AB"));
    }

    #[test]
    fn default_selector_is_the_validated_keyword() {
        let tracker = LedgerTracker::default();
        tracker.observe(9592219, None);
        assert_eq!(
            tracker.default_selector(),
            LedgerSelector::Identifier("validated".to_string())
        );
    }
}
