//! Result-set change detection.
//!
//! A signature is a SHA-256 digest over the ordered `(id, status)` pairs of
//! a fetched collection; settlements also hash their amounts since those
//! can change materially between polls. An unchanged signature only allows
//! skipping the per-item scan when the previous scan of that collection
//! resolved every eligible item. Otherwise an item stuck on a delivery or
//! ledger failure would never be retried while the upstream result set
//! stays the same.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::domain::item::RemoteItem;

/// Content hash of a fetched result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Compute the signature of an ordered item sequence.
    #[must_use]
    pub fn compute(items: &[RemoteItem]) -> Self {
        let mut hasher = Sha256::new();
        for item in items {
            match item {
                RemoteItem::Order(o) => {
                    hasher.update(format!("{}|{};", o.trade_no, o.status.code()));
                }
                RemoteItem::Settlement(s) => {
                    hasher.update(format!(
                        "{}|{}|{}|{};",
                        s.id,
                        s.status.code(),
                        s.amount.normalize(),
                        s.realized_amount.normalize()
                    ));
                }
            }
        }
        Self(hex::encode(hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix is enough to correlate log lines.
        f.write_str(&self.0[..self.0.len().min(12)])
    }
}

/// Tracks the last observed signature of one collection and whether the
/// scan that produced it left anything unresolved.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    last_signature: Option<Signature>,
    last_pass_clean: bool,
}

impl ChangeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the items behind `signature` must be scanned this cycle.
    #[must_use]
    pub fn needs_scan(&self, signature: &Signature) -> bool {
        !(self.last_pass_clean && self.last_signature.as_ref() == Some(signature))
    }

    /// Remember the outcome of a scan over the result set `signature`.
    pub fn record(&mut self, signature: Signature, clean: bool) {
        self.last_signature = Some(signature);
        self.last_pass_clean = clean;
    }

    #[must_use]
    pub fn last_signature(&self) -> Option<&Signature> {
        self.last_signature.as_ref()
    }

    #[must_use]
    pub const fn last_pass_clean(&self) -> bool {
        self.last_pass_clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{order, settlement};
    use rust_decimal_macros::dec;

    #[test]
    fn identical_sequences_share_a_signature() {
        let a = vec![order("T1", "1").into(), order("T2", "0").into()];
        let b = vec![order("T1", "1").into(), order("T2", "0").into()];
        assert_eq!(Signature::compute(&a), Signature::compute(&b));
    }

    #[test]
    fn status_change_alters_signature() {
        let before = vec![order("T1", "0").into()];
        let after = vec![order("T1", "1").into()];
        assert_ne!(Signature::compute(&before), Signature::compute(&after));
    }

    #[test]
    fn change_between_non_success_codes_alters_signature() {
        let before = vec![order("T1", "0").into()];
        let after = vec![order("T1", "2").into()];
        assert_ne!(Signature::compute(&before), Signature::compute(&after));
    }

    #[test]
    fn order_of_items_matters() {
        let a = vec![order("T1", "1").into(), order("T2", "1").into()];
        let b = vec![order("T2", "1").into(), order("T1", "1").into()];
        assert_ne!(Signature::compute(&a), Signature::compute(&b));
    }

    #[test]
    fn settlement_realized_amount_alters_signature() {
        let before = vec![settlement("S1", "1", dec!(100), dec!(99.40)).into()];
        let after = vec![settlement("S1", "1", dec!(100), dec!(98.00)).into()];
        assert_ne!(Signature::compute(&before), Signature::compute(&after));
    }

    #[test]
    fn settlement_gross_amount_alters_signature() {
        let before = vec![settlement("S1", "1", dec!(100), dec!(99.40)).into()];
        let after = vec![settlement("S1", "1", dec!(120), dec!(99.40)).into()];
        assert_ne!(Signature::compute(&before), Signature::compute(&after));
    }

    #[test]
    fn settlement_amount_scale_does_not_alter_signature() {
        let before = vec![settlement("S1", "1", dec!(100), dec!(99.40)).into()];
        let after = vec![settlement("S1", "1", dec!(100), dec!(99.4)).into()];
        assert_eq!(Signature::compute(&before), Signature::compute(&after));
    }

    #[test]
    fn order_amount_is_not_part_of_signature() {
        let mut changed = order("T1", "1");
        changed.amount = dec!(1234);
        let before = vec![order("T1", "1").into()];
        let after = vec![changed.into()];
        assert_eq!(Signature::compute(&before), Signature::compute(&after));
    }

    #[test]
    fn fresh_detector_always_scans() {
        let detector = ChangeDetector::new();
        assert!(detector.needs_scan(&Signature::compute(&[])));
    }

    #[test]
    fn clean_pass_with_same_signature_skips_scan() {
        let sig = Signature::compute(&[order("T1", "1").into()]);
        let mut detector = ChangeDetector::new();
        detector.record(sig.clone(), true);
        assert!(!detector.needs_scan(&sig));
    }

    #[test]
    fn unresolved_pass_forces_rescan_of_same_signature() {
        let sig = Signature::compute(&[order("T1", "1").into()]);
        let mut detector = ChangeDetector::new();
        detector.record(sig.clone(), false);
        assert!(detector.needs_scan(&sig));

        detector.record(sig.clone(), true);
        assert!(!detector.needs_scan(&sig));
    }

    #[test]
    fn new_signature_scans_even_after_clean_pass() {
        let first = Signature::compute(&[order("T1", "1").into()]);
        let second = Signature::compute(&[order("T1", "1").into(), order("T2", "1").into()]);
        let mut detector = ChangeDetector::new();
        detector.record(first, true);
        assert!(detector.needs_scan(&second));
    }

    #[test]
    fn display_is_a_short_prefix() {
        let sig = Signature::compute(&[]);
        assert_eq!(sig.as_str().len(), 64);
        assert_eq!(sig.to_string().len(), 12);
    }
}
