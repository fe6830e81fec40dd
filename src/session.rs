//! Session-scoped state: the current extraction response, the sheet/table
//! selection, and the projection set.

use crate::core::models::MultiSheetResponse;
use crate::projection::ProjectionSet;
use crate::select::SelectionState;
use tracing::{debug, info};

/// Owner of everything a single UI session derives from.
///
/// The response is replaced wholesale, never patched; selection and
/// projections reset with it. Fetches are generation-numbered so a stale
/// result arriving late is discarded instead of clobbering a newer one.
#[derive(Debug, Default)]
pub struct Session {
    response: Option<MultiSheetResponse>,
    latest_generation: u64,
    pub selection: SelectionState,
    pub projections: ProjectionSet,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response(&self) -> Option<&MultiSheetResponse> {
        self.response.as_ref()
    }

    /// Install a fetched response unless a newer fetch already landed.
    ///
    /// Accepting a response resets the selection and clears the projection
    /// set; returns whether the response was accepted.
    pub fn install_response(&mut self, generation: u64, response: MultiSheetResponse) -> bool {
        if generation < self.latest_generation {
            debug!(
                generation,
                latest = self.latest_generation,
                "discarding superseded extraction response"
            );
            return false;
        }
        info!(
            generation,
            sheets = response.sheet_count(),
            id = %response.id,
            "installed extraction response"
        );
        self.latest_generation = generation;
        self.response = Some(response);
        self.selection = SelectionState::new();
        self.projections.clear();
        true
    }

    /// Drop the current response and all state derived from it.
    pub fn reset(&mut self) {
        self.response = None;
        self.selection = SelectionState::new();
        self.projections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(name: &str) -> MultiSheetResponse {
        MultiSheetResponse::from_value(serde_json::json!({
            "sheets": { name: {"tables": [{"tableData": {"headers": ["A"], "rows": [{"A": 1}]}}]} },
            "sheetOrder": [name]
        }))
        .unwrap()
    }

    #[test]
    fn test_install_resets_selection_and_projections() {
        let mut session = Session::new();
        assert!(session.install_response(1, response("First")));
        let installed = session.response().unwrap().clone();
        session.selection.select_sheet(&installed, "First");
        session.projections.add("Upside", "A");

        assert!(session.install_response(2, response("Second")));
        assert_eq!(session.selection, SelectionState::new());
        assert!(session.projections.is_empty());
        assert_eq!(session.response().unwrap().sheet_order, vec!["Second"]);
    }

    #[test]
    fn test_stale_generation_discarded() {
        let mut session = Session::new();
        assert!(session.install_response(5, response("Newer")));
        assert!(!session.install_response(3, response("Stale")));
        assert_eq!(session.response().unwrap().sheet_order, vec!["Newer"]);
    }

    #[test]
    fn test_equal_generation_replaces() {
        let mut session = Session::new();
        assert!(session.install_response(1, response("A")));
        assert!(session.install_response(1, response("B")));
        assert_eq!(session.response().unwrap().sheet_order, vec!["B"]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        session.install_response(1, response("A"));
        session.projections.add("P", "A");
        session.reset();
        assert!(session.response().is_none());
        assert!(session.projections.is_empty());
    }
}
