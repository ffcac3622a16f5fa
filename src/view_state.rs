//! View State
//!
//! Pure mapping from cache state to what a list screen shows. Exactly one
//! of loading, failed or content is shown; an empty collection is content.

use crate::cache::QueryState;
use crate::error::{ApiError, ErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub enum ListView<T> {
    /// Nothing cached and no error yet
    Loading,
    /// Nothing cached and the last fetch failed; offer a retry
    Failed { message: String },
    /// Fetched, no items
    Empty,
    Items {
        items: Vec<T>,
        /// A refresh is running in the background
        refreshing: bool,
    },
}

impl<T: Clone> ListView<T> {
    /// Cached data wins over a later fetch error so a failed refresh never
    /// hides what is already on screen
    pub fn from_state(state: &QueryState<Vec<T>>) -> Self {
        match (&state.data, &state.error) {
            (Some(items), _) if items.is_empty() => ListView::Empty,
            (Some(items), _) => ListView::Items {
                items: items.clone(),
                refreshing: state.is_fetching,
            },
            (None, Some(err)) => ListView::Failed {
                message: error_message(err),
            },
            (None, None) => ListView::Loading,
        }
    }
}

/// User-facing text for an error
pub fn error_message(err: &ApiError) -> String {
    match err.kind {
        ErrorKind::Network => "No se pudo conectar con el servidor".to_string(),
        ErrorKind::Cancelled => "La solicitud fue cancelada".to_string(),
        ErrorKind::Server | ErrorKind::Validation | ErrorKind::Decode => err.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(data: Option<Vec<u32>>, error: Option<ApiError>) -> QueryState<Vec<u32>> {
        QueryState {
            data,
            error,
            is_fetching: false,
            is_stale: false,
            updated_at: None,
        }
    }

    #[test]
    fn test_loading_until_first_result() {
        assert_eq!(ListView::from_state(&state(None, None)), ListView::Loading);
    }

    #[test]
    fn test_empty_is_not_loading() {
        assert_eq!(ListView::from_state(&state(Some(vec![]), None)), ListView::Empty);
    }

    #[test]
    fn test_error_without_data_offers_retry() {
        let view = ListView::from_state(&state(None, Some(ApiError::network("refused"))));
        assert_eq!(
            view,
            ListView::Failed {
                message: "No se pudo conectar con el servidor".to_string()
            }
        );
    }

    #[test]
    fn test_cached_items_survive_refresh_error() {
        let mut s = state(Some(vec![1, 2]), Some(ApiError::server(500, None)));
        s.is_fetching = true;
        assert_eq!(
            ListView::from_state(&s),
            ListView::Items {
                items: vec![1, 2],
                refreshing: true
            }
        );
    }

    #[test]
    fn test_server_detail_is_shown_verbatim() {
        let err = ApiError::server(404, Some("Tarea no encontrada".to_string()));
        assert_eq!(error_message(&err), "Tarea no encontrada");
    }
}
