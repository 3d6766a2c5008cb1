//! Dispatch lifecycle engine and query layer.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::entities::{Dispatch, DispatchFilter, PodDetails};
use crate::errors::{DispatchError, DispatchResult};
use crate::repositories::DispatchRepository;

/// Orchestrates lifecycle transitions and paged queries over the dispatch
/// collection. Every mutation is a single read-modify-write of one row;
/// concurrent writers race at the store's commit granularity.
pub struct DispatchService {
    dispatches: Arc<dyn DispatchRepository>,
}

impl DispatchService {
    pub fn new(dispatches: Arc<dyn DispatchRepository>) -> Self {
        Self { dispatches }
    }

    #[instrument(skip(self, description))]
    pub async fn create(
        &self,
        area: &str,
        description: Option<String>,
    ) -> DispatchResult<Dispatch> {
        let area = area.trim();
        if area.is_empty() {
            return Err(DispatchError::validation_error("area is required"));
        }

        let dispatch = Dispatch::new(area.to_string(), description);
        let created = self.dispatches.create(&dispatch).await?;
        debug!(dispatch_id = created.id, area = %created.area, "dispatch created");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> DispatchResult<Dispatch> {
        self.dispatches
            .find_by_id(id)
            .await?
            .ok_or(DispatchError::DispatchNotFound { id })
    }

    #[instrument(skip(self))]
    pub async fn accept(&self, id: i64, caller_id: i64) -> DispatchResult<Dispatch> {
        let mut dispatch = self.get(id).await?;
        dispatch.accept(caller_id)?;
        self.dispatches.update(&dispatch).await?;
        debug!(dispatch_id = id, owner_id = caller_id, "dispatch accepted");
        Ok(dispatch)
    }

    #[instrument(skip(self))]
    pub async fn start(&self, id: i64, caller_id: i64) -> DispatchResult<Dispatch> {
        let mut dispatch = self.owned(id, caller_id).await?;
        dispatch.start()?;
        self.dispatches.update(&dispatch).await?;
        debug!(dispatch_id = id, "dispatch started");
        Ok(dispatch)
    }

    #[instrument(skip(self, pod))]
    pub async fn complete(
        &self,
        id: i64,
        caller_id: i64,
        pod: PodDetails,
    ) -> DispatchResult<Dispatch> {
        // Payload validation comes before any lookup so an empty completion
        // request is a 400 regardless of whether the dispatch exists.
        if pod.is_empty() {
            return Err(DispatchError::validation_error(
                "at least one proof-of-delivery field is required",
            ));
        }

        let mut dispatch = self.owned(id, caller_id).await?;
        dispatch.complete(pod)?;
        self.dispatches.update(&dispatch).await?;
        debug!(dispatch_id = id, "dispatch completed");
        Ok(dispatch)
    }

    /// Fetches a dispatch the caller owns. Absence and foreign ownership are
    /// deliberately indistinguishable so that an unauthorized caller cannot
    /// probe for existence.
    async fn owned(&self, id: i64, caller_id: i64) -> DispatchResult<Dispatch> {
        match self.dispatches.find_by_id(id).await? {
            Some(dispatch) if dispatch.is_owned_by(caller_id) => Ok(dispatch),
            _ => Err(DispatchError::DispatchNotFound { id }),
        }
    }

    /// Paged listing in storage order; the total is the unfiltered
    /// collection count.
    pub async fn page(&self, skip: i64, limit: i64) -> DispatchResult<(Vec<Dispatch>, i64)> {
        let filter = DispatchFilter {
            offset: Some(skip),
            limit: Some(limit),
            ..Default::default()
        };
        let items = self.dispatches.list(&filter).await?;
        let total = self.dispatches.count(&DispatchFilter::default()).await?;
        Ok((items, total))
    }

    pub async fn page_by_owner(
        &self,
        owner_id: i64,
        skip: i64,
        limit: i64,
    ) -> DispatchResult<(Vec<Dispatch>, i64)> {
        let filter = DispatchFilter {
            owner_id: Some(owner_id),
            offset: Some(skip),
            limit: Some(limit),
            ..Default::default()
        };
        let items = self.dispatches.list(&filter).await?;
        let total = self
            .dispatches
            .count(&DispatchFilter {
                owner_id: Some(owner_id),
                ..Default::default()
            })
            .await?;
        Ok((items, total))
    }

    /// Filtered paged listing; the total honours the same predicates as the
    /// page itself.
    pub async fn page_filtered(
        &self,
        criteria: DispatchFilter,
        skip: i64,
        limit: i64,
    ) -> DispatchResult<(Vec<Dispatch>, i64)> {
        let count_filter = DispatchFilter {
            offset: None,
            limit: None,
            ..criteria.clone()
        };
        let filter = DispatchFilter {
            offset: Some(skip),
            limit: Some(limit),
            ..criteria
        };
        let items = self.dispatches.list(&filter).await?;
        let total = self.dispatches.count(&count_filter).await?;
        Ok((items, total))
    }
}
