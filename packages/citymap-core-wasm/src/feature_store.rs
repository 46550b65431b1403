use serde::Serialize;
use std::cell::RefCell;

use crate::error::FetchError;
use crate::models::FeatureCollection;
use crate::console_log;

/// Which listing a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    All,
    Filtered,
}

/// Status of the most recently issued request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Filtering,
    Error(String),
}

impl RequestState {
    pub fn is_busy(&self) -> bool {
        matches!(self, RequestState::Loading | RequestState::Filtering)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Receipt for an issued request; only the newest ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    seq: u64,
}

impl RequestTicket {
    #[cfg(test)]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Current building data plus request status.
///
/// `data` is `None` when no request has completed successfully since the
/// last failure ("no data"), which is distinct from an empty collection
/// ("query ran, zero matches").
#[derive(Debug, Default)]
pub struct FeatureStore {
    data: Option<FeatureCollection>,
    state: RequestState,
    issued: u64,
    applied: u64,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Option<&FeatureCollection> {
        self.data.as_ref()
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Sequence number of the last completion that was applied.
    #[cfg(test)]
    pub fn applied_seq(&self) -> u64 {
        self.applied
    }

    /// Mark a new request as in flight. Any earlier ticket becomes stale.
    pub fn begin(&mut self, mode: LoadMode) -> RequestTicket {
        self.issued += 1;
        self.state = match mode {
            LoadMode::All => RequestState::Loading,
            LoadMode::Filtered => RequestState::Filtering,
        };
        RequestTicket { seq: self.issued }
    }

    /// Apply the outcome of `ticket` if it is still the newest request.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<FeatureCollection, FetchError>,
    ) -> Completion {
        if ticket.seq != self.issued {
            console_log!(
                "Discarding stale response #{} (latest request is #{})",
                ticket.seq,
                self.issued
            );
            return Completion::Stale;
        }

        self.applied = ticket.seq;
        match result {
            Ok(collection) => {
                self.data = Some(collection);
                self.state = RequestState::Idle;
            }
            Err(err) => {
                self.data = None;
                self.state = RequestState::Error(err.to_string());
            }
        }
        Completion::Applied
    }

    /// Release a request that will never complete. Leaves the data alone
    /// and only clears the busy flag if nothing newer is in flight.
    pub fn abandon(&mut self, ticket: RequestTicket) {
        if ticket.seq == self.issued && self.state.is_busy() {
            console_log!("Request #{} abandoned before completion", ticket.seq);
            self.state = RequestState::Idle;
        }
    }
}

/// Access point through which the fetcher mutates a store. Borrows must
/// stay inside `f`; a store is never held across a suspension point.
pub trait StoreHandle {
    fn with_store<R>(&self, f: impl FnOnce(&mut FeatureStore) -> R) -> R;
}

impl StoreHandle for RefCell<FeatureStore> {
    fn with_store<R>(&self, f: impl FnOnce(&mut FeatureStore) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

/// Scoped finalization for one in-flight request: completing consumes the
/// guard, dropping it early abandons the ticket.
pub struct InFlight<'a, H: StoreHandle> {
    store: &'a H,
    ticket: Option<RequestTicket>,
}

impl<'a, H: StoreHandle> InFlight<'a, H> {
    pub fn begin(store: &'a H, mode: LoadMode) -> Self {
        let ticket = store.with_store(|s| s.begin(mode));
        Self {
            store,
            ticket: Some(ticket),
        }
    }

    #[cfg(test)]
    pub fn ticket(&self) -> Option<RequestTicket> {
        self.ticket
    }

    pub fn finish(mut self, result: Result<FeatureCollection, FetchError>) -> Completion {
        match self.ticket.take() {
            Some(ticket) => self.store.with_store(|s| s.complete(ticket, result)),
            None => Completion::Stale,
        }
    }
}

impl<H: StoreHandle> Drop for InFlight<'_, H> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.store.with_store(|s| s.abandon(ticket));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Building;

    fn collection(ids: &[&str]) -> FeatureCollection {
        FeatureCollection {
            buildings: ids
                .iter()
                .map(|id| Building::new(*id, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]))
                .collect(),
        }
    }

    #[test]
    fn begin_sets_mode_specific_busy_state() {
        let mut store = FeatureStore::new();
        assert_eq!(store.state(), &RequestState::Idle);
        store.begin(LoadMode::All);
        assert_eq!(store.state(), &RequestState::Loading);
        store.begin(LoadMode::Filtered);
        assert_eq!(store.state(), &RequestState::Filtering);
        assert!(store.is_busy());
    }

    #[test]
    fn success_installs_data_and_clears_error() {
        let mut store = FeatureStore::new();
        let t = store.begin(LoadMode::All);
        store.complete(t, Err(FetchError::Network("offline".into())));
        assert_eq!(store.state().error(), Some("network failure: offline"));
        assert!(store.data().is_none());

        let t = store.begin(LoadMode::All);
        assert_eq!(store.state(), &RequestState::Loading);
        assert_eq!(store.complete(t, Ok(collection(&["a", "b"]))), Completion::Applied);
        assert_eq!(store.state(), &RequestState::Idle);
        assert_eq!(store.data().unwrap().len(), 2);
    }

    #[test]
    fn failure_clears_to_no_data_not_empty() {
        let mut store = FeatureStore::new();
        let t = store.begin(LoadMode::All);
        store.complete(t, Ok(collection(&["a"])));

        let t = store.begin(LoadMode::Filtered);
        store.complete(
            t,
            Err(FetchError::Http {
                status: 500,
                message: "boom".into(),
            }),
        );
        assert_eq!(store.state(), &RequestState::Error("boom".into()));
        assert!(store.data().is_none());
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut store = FeatureStore::new();
        let older = store.begin(LoadMode::All);
        let newer = store.begin(LoadMode::Filtered);

        assert_eq!(store.complete(newer, Ok(collection(&["n"]))), Completion::Applied);
        assert_eq!(store.complete(older, Ok(collection(&["o1", "o2"]))), Completion::Stale);
        assert_eq!(store.data().unwrap().buildings[0].id, "n");
        assert_eq!(store.applied_seq(), newer.seq());
        assert_eq!(store.state(), &RequestState::Idle);
    }

    #[test]
    fn stale_failure_does_not_clobber_newer_request_state() {
        let mut store = FeatureStore::new();
        let older = store.begin(LoadMode::All);
        let _newer = store.begin(LoadMode::Filtered);
        store.complete(older, Err(FetchError::Timeout(10)));
        assert_eq!(store.state(), &RequestState::Filtering);
    }

    #[test]
    fn dropped_guard_clears_busy_state() {
        let cell = RefCell::new(FeatureStore::new());
        {
            let t = cell.borrow_mut().begin(LoadMode::All);
            cell.borrow_mut().complete(t, Ok(collection(&["kept"])));
        }
        {
            let guard = InFlight::begin(&cell, LoadMode::Filtered);
            assert!(guard.ticket().is_some());
            assert_eq!(cell.borrow().state(), &RequestState::Filtering);
        }
        assert_eq!(cell.borrow().state(), &RequestState::Idle);
        assert_eq!(cell.borrow().data().unwrap().buildings[0].id, "kept");
    }

    #[test]
    fn finished_guard_does_not_abandon() {
        let cell = RefCell::new(FeatureStore::new());
        let guard = InFlight::begin(&cell, LoadMode::All);
        assert_eq!(guard.finish(Err(FetchError::Network("x".into()))), Completion::Applied);
        assert!(cell.borrow().state().error().is_some());
    }
}
