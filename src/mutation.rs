//! Optimistic Mutations
//!
//! Create, update and delete against a cached collection:
//! 1. validate the payload (nothing is touched when it is rejected)
//! 2. cancel in-flight fetches of the collection
//! 3. apply the speculative edit to the cache
//! 4. call the backend
//! 5. success: swap in the server's version and invalidate the collection
//! 6. failure: roll the edit back and return the error
//! 7. either way: invalidate dependent aggregate keys

use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::api::ResourceApi;
use crate::cache::{MutationContext, QueryClient, QueryKey};
use crate::error::{ApiError, ApiResult};
use crate::resource::{Collection, Record, RecordId, Resource};

pub struct Mutations<R: Resource, A> {
    client: QueryClient,
    api: Rc<A>,
    key: QueryKey<Collection<R>>,
    dependents: Vec<String>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource, A> Clone for Mutations<R, A> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api: self.api.clone(),
            key: self.key.clone(),
            dependents: self.dependents.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R, A> Mutations<R, A>
where
    R: Resource,
    A: ResourceApi<R>,
{
    pub fn new(client: QueryClient, api: Rc<A>, key: QueryKey<Collection<R>>) -> Self {
        Self {
            client,
            api,
            key,
            dependents: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Aggregate key refreshed after every mutation, e.g. statistics
    pub fn invalidates(mut self, prefix: &str) -> Self {
        self.dependents.push(prefix.to_string());
        self
    }

    pub fn key(&self) -> &QueryKey<Collection<R>> {
        &self.key
    }

    pub async fn create(&self, draft: R::Draft) -> ApiResult<Record<R>> {
        let draft = R::validate_draft(draft)?;
        self.client.cancel(self.key.path());

        let local_id = self.client.next_local_id();
        let speculative = Record::pending(local_id, R::speculative(&draft));
        let context = self.client.apply_optimistic(&self.key, move |records| {
            let mut next = records.clone();
            next.push(speculative.clone());
            next
        });
        debug!(key = self.key.path(), %local_id, "speculative create");

        let result = self.api.create(&draft).await;
        if let Ok(created) = &result {
            let created = created.clone();
            self.succeed(context, move |records| {
                let mut next = records.clone();
                if !next.iter().any(|r| r.id == created.id) {
                    next.push(created.clone());
                }
                next
            })
            .await;
        } else {
            self.fail(context, &result);
        }
        self.settle().await;
        result
    }

    pub async fn update(&self, id: &RecordId<R::Id>, patch: R::Patch) -> ApiResult<Record<R>> {
        let id = confirmed_id::<R>(id)?;
        let patch = R::validate_patch(patch)?;
        self.client.cancel(self.key.path());

        let context = {
            let id = id.clone();
            let patch = patch.clone();
            self.client.apply_optimistic(&self.key, move |records| {
                records
                    .iter()
                    .map(|r| match r.server_id() {
                        Some(rid) if *rid == id => {
                            let mut r = r.clone();
                            r.fields.apply_patch(&patch);
                            r
                        }
                        _ => r.clone(),
                    })
                    .collect()
            })
        };

        let result = self.api.update(&id, &patch).await;
        if let Ok(updated) = &result {
            let updated = updated.clone();
            self.succeed(context, move |records| {
                records
                    .iter()
                    .map(|r| if r.id == updated.id { updated.clone() } else { r.clone() })
                    .collect()
            })
            .await;
        } else {
            self.fail(context, &result);
        }
        self.settle().await;
        result
    }

    pub async fn delete(&self, id: &RecordId<R::Id>) -> ApiResult<()> {
        let id = confirmed_id::<R>(id)?;
        self.client.cancel(self.key.path());

        let removed = id.clone();
        let remove = move |records: &Collection<R>| -> Collection<R> {
            records
                .iter()
                .filter(|r| r.server_id() != Some(&removed))
                .cloned()
                .collect()
        };
        let context = self.client.apply_optimistic(&self.key, remove.clone());

        let result = self.api.delete(&id).await;
        if result.is_ok() {
            self.succeed(context, remove).await;
        } else {
            self.fail(context, &result);
        }
        self.settle().await;
        result
    }

    async fn succeed<F>(&self, context: MutationContext<Collection<R>>, edit: F)
    where
        F: Fn(&Collection<R>) -> Collection<R> + 'static,
    {
        self.client.confirm_with(context, edit);
        self.client.invalidate(self.key.path()).await;
    }

    fn fail<T>(&self, context: MutationContext<Collection<R>>, result: &ApiResult<T>) {
        if let Err(e) = result {
            warn!(key = self.key.path(), error = %e, "mutation failed, rolling back");
        }
        self.client.rollback(context);
    }

    async fn settle(&self) {
        for prefix in &self.dependents {
            self.client.invalidate(prefix).await;
        }
    }
}

/// Records still waiting for the server cannot be addressed by id
fn confirmed_id<R: Resource>(id: &RecordId<R::Id>) -> ApiResult<R::Id> {
    match id {
        RecordId::Confirmed(id) => Ok(id.clone()),
        RecordId::Pending { .. } => Err(ApiError::validation(
            "This item is still being saved; try again in a moment",
        )),
    }
}
