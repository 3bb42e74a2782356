//! Network handle that remembers topology changes between steps.

use std::sync::Arc;

use phasenet_core::{ChangeTracker, Changes, GraphObserver, Network};

/// A shared network plus a subscribed [`ChangeTracker`].
///
/// The tracker is unsubscribed again when the handle is dropped.
pub(crate) struct TrackedNetwork {
    network: Arc<Network>,
    tracker: Arc<ChangeTracker>,
    observer: Arc<dyn GraphObserver>,
}

impl TrackedNetwork {
    pub fn new(network: Arc<Network>) -> Self {
        let tracker = Arc::new(ChangeTracker::new());
        let observer: Arc<dyn GraphObserver> = tracker.clone();
        network.subscribe(observer.clone());
        Self {
            network,
            tracker,
            observer,
        }
    }
    
    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }
    
    /// Changes committed since the previous call.
    pub fn drain(&self) -> Changes {
        self.tracker.drain()
    }
}

impl Drop for TrackedNetwork {
    fn drop(&mut self) {
        self.network.unsubscribe(&self.observer);
    }
}
