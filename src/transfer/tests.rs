//! State Transfer Tests

#[cfg(test)]
mod tests {
    use crate::causal::{CausalDeliveryEngine, Delivery, UpdateEvent};
    use crate::clock::VectorClock;
    use crate::membership::types::NodeId;
    use crate::storage::store::VersionedStore;
    use crate::transfer::{InstallReport, StateTransferService};
    use std::sync::Arc;

    fn vc(pairs: &[(&str, u64)]) -> VectorClock {
        pairs.iter().map(|(id, c)| (*id, *c)).collect()
    }

    fn engine(id: &str) -> CausalDeliveryEngine {
        CausalDeliveryEngine::new(NodeId::from(id), Arc::new(VersionedStore::new()))
    }

    #[test]
    fn test_capture_pairs_store_with_clock() {
        let mut source = engine("a");
        source.local_write("x", "1");
        source.local_write("y", "2");

        let snapshot = StateTransferService::capture(&source);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.clock, vc(&[("a", 2)]));
        assert_eq!(snapshot.store["x"].clock, vc(&[("a", 1)]));
        assert_eq!(snapshot.store["y"].value, "2");
    }

    #[test]
    fn test_install_overwrites_and_merges() {
        let mut source = engine("a");
        source.local_write("x", "from-a");
        let snapshot = StateTransferService::capture(&source);

        let mut target = engine("b");
        target.local_write("x", "from-b");
        target.local_write("z", "only-b");

        let report = StateTransferService::install(&mut target, snapshot);

        assert_eq!(
            report,
            InstallReport {
                entries: 1,
                reconciled: 0
            }
        );
        assert_eq!(target.store().get("x"), Some("from-a".to_string()));
        assert_eq!(target.store().get("z"), Some("only-b".to_string()));
        assert_eq!(target.clock(), &vc(&[("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_install_drains_updates_it_unblocks() {
        let mut source = engine("a");
        source.local_write("x", "1");
        let snapshot = StateTransferService::capture(&source);
        let next = source.local_write("x", "2");

        // The follow-up write arrives before the snapshot.
        let mut target = engine("b");
        assert_eq!(target.receive(next), Delivery::Buffered);

        let report = StateTransferService::install(&mut target, snapshot);

        assert_eq!(report.reconciled, 1);
        assert_eq!(target.pending_len(), 0);
        assert_eq!(target.store().get("x"), Some("2".to_string()));
    }

    #[test]
    fn test_install_drops_buffered_updates_it_covers() {
        let mut source = engine("a");
        source.local_write("x", "1");
        let early = source.local_write("x", "2");
        source.local_write("x", "3");
        let snapshot = StateTransferService::capture(&source);

        let mut target = engine("b");
        assert_eq!(target.receive(early), Delivery::Buffered);

        let report = StateTransferService::install(&mut target, snapshot);

        assert_eq!(report.reconciled, 0);
        assert_eq!(target.pending_len(), 0);
        assert_eq!(target.store().get("x"), Some("3".to_string()));
        assert_eq!(target.clock(), &vc(&[("a", 3), ("b", 0)]));
    }

    #[test]
    fn test_empty_snapshot_changes_nothing() {
        let source = engine("a");
        let snapshot = StateTransferService::capture(&source);
        assert!(snapshot.is_empty());

        let mut target = engine("b");
        target.receive(UpdateEvent::new("k", "v", NodeId::from("c"), vc(&[("c", 1)])));
        let report = StateTransferService::install(&mut target, snapshot);

        assert_eq!(report.entries, 0);
        assert_eq!(target.store().get("k"), Some("v".to_string()));
        assert_eq!(target.clock(), &vc(&[("a", 0), ("b", 0), ("c", 1)]));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut source = engine("a");
        source.local_write("k", "v");
        let snapshot = StateTransferService::capture(&source);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["clock"]["a"], 1);
        assert_eq!(json["store"]["k"]["value"], "v");
        assert_eq!(json["store"]["k"]["clock"]["a"], 1);
    }
}
