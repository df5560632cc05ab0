//! Listing fetch cycle and delete action for the property list view.
//!
//! # Design
//! `ListingController` owns the view's `QueryState` and the last successful
//! `Page`. Every query mutation issues a new fetch tagged with a monotonically
//! increasing sequence number; the host executes the request and hands the
//! result back to [`ListingController::complete`] together with that number.
//! Only the response for the latest sequence number is committed, so a slow
//! response for an older query can never overwrite a newer page.
//!
//! A failed fetch keeps the previously displayed page and records an error
//! message. Nothing retries automatically.

use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, GENERIC_ERROR_MESSAGE};
use crate::http::{HttpRequest, HttpResponse};
use crate::query::{QueryAction, QueryState};
use crate::types::{Page, Property, PropertyId};

/// Prompt shown before a delete is dispatched.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this property?";

/// Identity of an issued listing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestSeq(u64);

/// A listing request the host must execute.
#[derive(Debug, Clone)]
pub struct PendingFetch {
    pub seq: RequestSeq,
    pub request: HttpRequest,
}

/// What `complete` did with a response.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was replaced and the error cleared.
    Applied,
    /// The latest fetch failed; the previous page stays on screen.
    Failed(ApiError),
    /// The response belonged to a superseded fetch and was dropped.
    Stale,
}

/// Yes/no gate in front of destructive actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A confirmed delete the host must execute.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub id: PropertyId,
    pub request: HttpRequest,
}

#[derive(Debug, Default)]
pub struct ListingController {
    query: QueryState,
    page: Option<Page<Property>>,
    error: Option<String>,
    issued: u64,
    in_flight: Option<RequestSeq>,
}

impl ListingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a prepared query instead of the defaults.
    pub fn with_query(query: QueryState) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Last successfully fetched page.
    pub fn page(&self) -> Option<&Page<Property>> {
        self.page.as_ref()
    }

    pub fn rows(&self) -> &[Property] {
        self.page.as_ref().map(|p| p.data.as_slice()).unwrap_or(&[])
    }

    pub fn last_page(&self) -> Option<u32> {
        self.page.as_ref().map(|p| p.last_page)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while the fetch for the current query state is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn can_go_prev(&self) -> bool {
        self.query.can_go_prev()
    }

    pub fn can_go_next(&self) -> bool {
        self.last_page()
            .map(|last| self.query.can_go_next(last))
            .unwrap_or(false)
    }

    /// Initial fetch for a freshly mounted view.
    pub fn mount(&mut self, client: &ApiClient) -> PendingFetch {
        self.issue(client)
    }

    /// Apply a user action and fetch the resulting state.
    pub fn dispatch(&mut self, client: &ApiClient, action: QueryAction) -> PendingFetch {
        self.query = self.query.apply(action, self.last_page());
        self.issue(client)
    }

    /// Fetch the current state again without changing it.
    pub fn refresh(&mut self, client: &ApiClient) -> PendingFetch {
        self.issue(client)
    }

    fn issue(&mut self, client: &ApiClient) -> PendingFetch {
        self.issued += 1;
        let seq = RequestSeq(self.issued);
        self.in_flight = Some(seq);
        let request = client.build_list_properties(&self.query);
        debug!(seq = self.issued, url = %request.url(), "listing fetch issued");
        PendingFetch { seq, request }
    }

    /// Reconcile the result of a fetch. `result` is the host's transport
    /// outcome; transport failures should be passed as `ApiError::Transport`.
    pub fn complete(
        &mut self,
        client: &ApiClient,
        seq: RequestSeq,
        result: Result<HttpResponse, ApiError>,
    ) -> FetchOutcome {
        if seq != RequestSeq(self.issued) {
            debug!(seq = seq.0, latest = self.issued, "discarding stale listing response");
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        match result.and_then(|response| client.parse_list_properties(response)) {
            Ok(page) => {
                debug!(
                    seq = seq.0,
                    rows = page.data.len(),
                    current_page = page.current_page,
                    last_page = page.last_page,
                    "listing page applied"
                );
                self.page = Some(page);
                self.error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!(seq = seq.0, error = %err, "listing fetch failed");
                self.error = Some(err.display_message(GENERIC_ERROR_MESSAGE));
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Ask for confirmation and, if granted, build the delete request.
    pub fn request_delete(
        &self,
        client: &ApiClient,
        id: PropertyId,
        confirm: &mut impl Confirm,
    ) -> Option<PendingDelete> {
        if !confirm.confirm(DELETE_PROMPT) {
            debug!(%id, "delete declined");
            return None;
        }
        Some(PendingDelete {
            id,
            request: client.build_delete_property(id),
        })
    }

    /// On success returns a refresh of the current query state. The page
    /// number is left as is even if the deleted row was the last one on it.
    pub fn complete_delete(
        &mut self,
        client: &ApiClient,
        pending: PendingDelete,
        result: Result<HttpResponse, ApiError>,
    ) -> Result<PendingFetch, ApiError> {
        match result.and_then(|response| client.parse_delete_property(response)) {
            Ok(()) => {
                debug!(id = %pending.id, "property deleted");
                Ok(self.refresh(client))
            }
            Err(err) => {
                warn!(id = %pending.id, error = %err, "delete failed");
                self.error = Some(err.display_message(GENERIC_ERROR_MESSAGE));
                Err(err)
            }
        }
    }
}
