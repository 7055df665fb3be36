use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use shared::protocol::PeoplePage;
use tokio::sync::Mutex;

use crate::error::ClientError;
use crate::pagination::{ListEvent, ListState};
use crate::query::ListQuery;

/// Where listing pages come from. Production code plugs in
/// [`crate::PeopleClient`]; tests plug in fakes with controlled timing.
#[async_trait]
pub trait ListBackend: Send + Sync {
    async fn fetch_page(&self, query: ListQuery) -> Result<PeoplePage, ClientError>;
}

/// Drives the listing view: owns the current [`ListState`] snapshot and
/// refetches after every parameter change.
///
/// Overlapping calls are allowed. Each dispatch carries a monotonically
/// increasing sequence number; a completion only lands if its number still
/// matches the latest issued one, so a stale response (or its error) is
/// discarded silently instead of overwriting newer state. The lock is never
/// held across the network await.
pub struct ListSession<B> {
    backend: B,
    state: Mutex<ListState>,
    seq: AtomicU64,
}

impl<B: ListBackend> ListSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(ListState::default()),
            seq: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> ListState {
        self.state.lock().await.clone()
    }

    pub async fn set_filter(&self, name: &str, value: &str) -> Result<(), ClientError> {
        self.transition(Some(ListEvent::FilterChanged {
            name: name.to_string(),
            value: value.to_string(),
        }))
        .await
    }

    pub async fn set_sort(&self, field: &str) -> Result<(), ClientError> {
        self.transition(Some(ListEvent::SortClicked(field.to_string())))
            .await
    }

    pub async fn set_page_size(&self, size: u32) -> Result<(), ClientError> {
        self.transition(Some(ListEvent::PageSizeChanged(size))).await
    }

    pub async fn go_to_page(&self, index: u32) -> Result<(), ClientError> {
        self.transition(Some(ListEvent::PageRequested(index))).await
    }

    /// Refetches with the current parameters, e.g. after a create or delete.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.transition(None).await
    }

    async fn transition(&self, event: Option<ListEvent>) -> Result<(), ClientError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let query = {
            let mut state = self.state.lock().await;
            let mut next = state.clone();
            if let Some(event) = event {
                next = next.apply(event);
            }
            next = next.apply(ListEvent::FetchIssued { seq });
            let query = next.query();
            *state = next;
            query
        };

        let outcome = self.backend.fetch_page(query).await;

        let mut state = self.state.lock().await;
        let superseded = state.latest_seq != seq;
        match outcome {
            Ok(page) => {
                *state = state.clone().apply(ListEvent::PageArrived { seq, page });
                Ok(())
            }
            Err(err) => {
                *state = state.clone().apply(ListEvent::FetchFailed { seq });
                if superseded {
                    // A newer dispatch owns the state now; this failure is
                    // as stale as its data would have been.
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }
}
