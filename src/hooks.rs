//! Reactive Hooks
//!
//! Bridge cache subscriptions into Leptos signals.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::cache::{QueryClient, QueryKey, QueryState};

/// Signal following the cache state of `key`.
///
/// Fetches on mount (served from cache when fresh). The subscription lives
/// as long as the calling component.
pub fn use_query<T>(client: QueryClient, key: QueryKey<T>) -> ReadSignal<QueryState<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let (state, set_state) = signal(client.read(&key));
    let subscription = client.watch(&key, move |next| {
        let _ = set_state.try_set(next);
    });
    // Disposed with the owner, which drops the subscription
    StoredValue::new_local(subscription);

    spawn_local(async move {
        // Errors land in the cache state
        let _ = client.fetch(&key).await;
    });
    state
}

/// Force a refetch, e.g. from a retry button
pub fn refetch<T: Clone + 'static>(client: QueryClient, key: QueryKey<T>) {
    spawn_local(async move {
        let _ = client.refetch(&key).await;
    });
}
