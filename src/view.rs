//! Consumer-side fold of result events into a displayable generation.

use serde::Serialize;

use crate::model::ModelResult;
use crate::orchestrator::ResultEvent;

/// One row of a generation as displayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    Done(&'a ModelResult),
    Pending(&'a str),
}

/// What a watcher of one generation knows so far. "Pending" exists only
/// here: a model that was dispatched but has not reported yet.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationView {
    pub generation_id: String,
    pub selected: Vec<String>,
    pub results: Vec<ModelResult>,
}

impl GenerationView {
    pub fn new(generation_id: &str, selected: Vec<String>) -> Self {
        Self {
            generation_id: generation_id.to_string(),
            selected,
            results: Vec::new(),
        }
    }

    /// Fold one event in. Events for other generations and repeat reports
    /// for a model already seen are ignored; returns whether the view changed.
    pub fn apply(&mut self, event: ResultEvent) -> bool {
        if event.generation_id != self.generation_id
            || self
                .results
                .iter()
                .any(|r| r.model_id == event.result.model_id)
        {
            return false;
        }
        self.results.push(event.result);
        true
    }

    /// Successful results, fastest first.
    pub fn succeeded(&self) -> Vec<&ModelResult> {
        let mut ok: Vec<&ModelResult> = self.results.iter().filter(|r| r.is_success()).collect();
        ok.sort_by_key(|r| r.execution_time_ms);
        ok
    }

    pub fn failed(&self) -> Vec<&ModelResult> {
        self.results.iter().filter(|r| !r.is_success()).collect()
    }

    pub fn pending(&self) -> Vec<&str> {
        self.selected
            .iter()
            .filter(|m| !self.results.iter().any(|r| &r.model_id == *m))
            .map(String::as_str)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.pending().is_empty()
    }

    /// Display order: successes fastest first, then failures, then models
    /// still pending.
    pub fn ordered(&self) -> Vec<Slot<'_>> {
        self.succeeded()
            .into_iter()
            .chain(self.failed())
            .map(Slot::Done)
            .chain(self.pending().into_iter().map(Slot::Pending))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Cost;

    fn event(generation_id: &str, result: ModelResult) -> ResultEvent {
        ResultEvent {
            generation_id: generation_id.to_string(),
            result,
        }
    }

    fn ok(model: &str, ms: u64) -> ModelResult {
        ModelResult::success("g", model, "p", "<p/>".into(), ms, Cost::ZERO)
    }

    #[test]
    fn starts_with_everything_pending() {
        let view = GenerationView::new("g", vec!["a".into(), "b".into()]);
        assert_eq!(view.pending(), vec!["a", "b"]);
        assert!(!view.is_complete());
    }

    #[test]
    fn folds_in_any_order_and_sorts_successes_by_time() {
        let mut view = GenerationView::new("g", vec!["a".into(), "b".into(), "c".into()]);
        assert!(view.apply(event("g", ok("c", 900))));
        assert!(view.apply(event(
            "g",
            ModelResult::failure("g", "b", "p", "timeout after 60000ms".into(), 60_000)
        )));
        assert_eq!(view.pending(), vec!["a"]);
        assert!(view.apply(event("g", ok("a", 300))));

        let fastest: Vec<&str> = view.succeeded().iter().map(|r| r.model_id.as_str()).collect();
        assert_eq!(fastest, vec!["a", "c"]);
        assert_eq!(view.failed()[0].model_id, "b");
        assert!(view.is_complete());
    }

    #[test]
    fn ordered_puts_pending_last() {
        let mut view = GenerationView::new("g", vec!["a".into(), "b".into(), "c".into()]);
        view.apply(event(
            "g",
            ModelResult::failure("g", "a", "p", "upstream error".into(), 5),
        ));
        view.apply(event("g", ok("c", 40)));

        let order: Vec<&str> = view
            .ordered()
            .into_iter()
            .map(|slot| match slot {
                Slot::Done(r) => r.model_id.as_str(),
                Slot::Pending(m) => m,
            })
            .collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn ignores_foreign_and_duplicate_events() {
        let mut view = GenerationView::new("g", vec!["a".into()]);
        assert!(!view.apply(event("other", ok("a", 1))));
        assert!(view.apply(event("g", ok("a", 1))));
        assert!(!view.apply(event("g", ok("a", 2))));
        assert_eq!(view.results.len(), 1);
    }
}
