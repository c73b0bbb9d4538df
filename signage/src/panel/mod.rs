//! Slide control panel.
//!
//! [`SlidePanel`] owns the panel's only piece of state, the selected slide,
//! and drives a [`SlideApi`] and a [`PanelView`]. Each `select` call takes a
//! monotonic request token; a response that arrives after a newer `select`
//! has started is discarded, so a slow response can never overwrite the
//! editor with a stale slide.

pub mod remote;
pub mod view;

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

pub use remote::{HttpSlideApi, RemoteError, SlideApi};
pub use view::{ConsoleView, PanelView};

/// Prompt shown when removing without a selection.
pub const SELECT_FIRST_PROMPT: &str = "Please select a slide to remove first.";

/// Currently selected slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Slide(String),
}

impl Selection {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Slide(id) => Some(id),
        }
    }
}

/// What a failed `select` does to the selection.
///
/// The editor is cleared either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectFailurePolicy {
    /// Reset the selection so it matches the cleared editor.
    #[default]
    ClearSelection,
    /// Keep the previous selection.
    KeepSelection,
}

#[derive(Debug)]
pub enum SelectOutcome {
    /// Editor shows the slide and it is selected.
    Shown,
    /// The fetch failed; the editor was cleared.
    Failed(RemoteError),
    /// A newer `select` started before this response arrived.
    Superseded,
}

#[derive(Debug)]
pub enum RemoveOutcome {
    /// Nothing selected; the user was prompted to select first.
    NothingSelected,
    /// The user declined the confirmation.
    Cancelled,
    /// The slide was deleted and its button removed.
    Removed(String),
    /// The delete failed; nothing changed.
    Failed(RemoteError),
}

#[derive(Debug, Default)]
struct PanelState {
    selected: Selection,
    latest_request: u64,
}

/// Slide control panel controller.
pub struct SlidePanel<A, V> {
    api: A,
    view: V,
    policy: SelectFailurePolicy,
    state: Mutex<PanelState>,
}

impl<A: SlideApi, V: PanelView> SlidePanel<A, V> {
    pub fn new(api: A, view: V) -> Self {
        Self::with_policy(api, view, SelectFailurePolicy::default())
    }

    pub fn with_policy(api: A, view: V, policy: SelectFailurePolicy) -> Self {
        Self {
            api,
            view,
            policy,
            state: Mutex::new(PanelState::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Current selection.
    pub fn selected(&self) -> Selection {
        self.lock().selected.clone()
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetch slide `id` into the editor and select it.
    pub async fn select(&self, id: &str) -> SelectOutcome {
        info!(slide = id, "Show slide");
        let token = {
            let mut state = self.lock();
            state.latest_request += 1;
            state.latest_request
        };

        let result = self.api.fetch_slide(id).await;

        let mut state = self.lock();
        if state.latest_request != token {
            debug!(slide = id, token, "Discarding superseded slide response");
            return SelectOutcome::Superseded;
        }

        match result {
            Ok(markup) => {
                self.view.set_editor(&markup);
                state.selected = Selection::Slide(id.to_string());
                SelectOutcome::Shown
            }
            Err(e) => {
                warn!(slide = id, "API error: {}", e);
                self.view.clear_editor();
                if self.policy == SelectFailurePolicy::ClearSelection {
                    state.selected = Selection::None;
                }
                SelectOutcome::Failed(e)
            }
        }
    }

    /// Delete the selected slide after confirmation.
    pub async fn remove(&self) -> RemoveOutcome {
        let Selection::Slide(id) = self.selected() else {
            self.view.alert(SELECT_FIRST_PROMPT);
            return RemoveOutcome::NothingSelected;
        };

        if !self
            .view
            .confirm(&format!("Are you sure you want to delete the slide '{id}'?"))
        {
            return RemoveOutcome::Cancelled;
        }

        match self.api.delete_slide(&id).await {
            Ok(()) => {
                self.view.remove_slide_button(&id);
                let mut state = self.lock();
                if state.selected.id() == Some(id.as_str()) {
                    state.selected = Selection::None;
                }
                info!(slide = %id, "Deleted slide");
                RemoveOutcome::Removed(id)
            }
            Err(e) => {
                warn!(slide = %id, "API error: {}", e);
                RemoveOutcome::Failed(e)
            }
        }
    }

    /// Slide creation placeholder.
    pub fn create(&self) {
        info!("Create slide requested; slide creation is not supported");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signage_common::api::ErrorResponse;
    use signage_common::errors::ErrorCode;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct ViewLog {
        editor: String,
        removed: Vec<String>,
        alerts: Vec<String>,
        confirms: Vec<String>,
    }

    struct MockView {
        answer: bool,
        log: Mutex<ViewLog>,
    }

    impl MockView {
        fn answering(answer: bool) -> Self {
            Self {
                answer,
                log: Mutex::new(ViewLog::default()),
            }
        }

        fn editor(&self) -> String {
            self.log.lock().unwrap().editor.clone()
        }
    }

    impl PanelView for MockView {
        fn set_editor(&self, markup: &str) {
            self.log.lock().unwrap().editor = markup.to_string();
        }

        fn clear_editor(&self) {
            self.log.lock().unwrap().editor.clear();
        }

        fn remove_slide_button(&self, id: &str) {
            self.log.lock().unwrap().removed.push(id.to_string());
        }

        fn alert(&self, message: &str) {
            self.log.lock().unwrap().alerts.push(message.to_string());
        }

        fn confirm(&self, message: &str) -> bool {
            self.log.lock().unwrap().confirms.push(message.to_string());
            self.answer
        }
    }

    fn api_error(code: ErrorCode) -> RemoteError {
        RemoteError::Api(ErrorResponse::bare(code))
    }

    /// Answers immediately from a fixed table.
    #[derive(Default)]
    struct MockApi {
        slides: HashMap<String, String>,
        fail_delete: bool,
        fetches: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl MockApi {
        fn with_slides(slides: &[(&str, &str)]) -> Self {
            Self {
                slides: slides
                    .iter()
                    .map(|(id, markup)| (id.to_string(), markup.to_string()))
                    .collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.fetches.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
        }
    }

    impl SlideApi for MockApi {
        async fn fetch_slide(&self, id: &str) -> Result<String, RemoteError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match id {
                "offline" => Err(RemoteError::Transport("connection refused".to_string())),
                _ => self
                    .slides
                    .get(id)
                    .cloned()
                    .ok_or_else(|| api_error(ErrorCode::InvalidRequest)),
            }
        }

        async fn delete_slide(&self, _id: &str) -> Result<(), RemoteError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_delete {
                Err(api_error(ErrorCode::Lock))
            } else {
                Ok(())
            }
        }

        async fn list_slides(&self) -> Result<Vec<String>, RemoteError> {
            Ok(self.slides.keys().cloned().collect())
        }
    }

    /// Answers each fetch only when the test releases it.
    #[derive(Default)]
    struct GatedApi {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<String, RemoteError>>>>,
    }

    impl GatedApi {
        fn gate(&self, id: &str) -> oneshot::Sender<Result<String, RemoteError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(id.to_string(), rx);
            tx
        }
    }

    impl SlideApi for GatedApi {
        async fn fetch_slide(&self, id: &str) -> Result<String, RemoteError> {
            let rx = self.gates.lock().unwrap().remove(id);
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(RemoteError::Transport("gate dropped".to_string()))),
                None => Err(RemoteError::Transport("no gate".to_string())),
            }
        }

        async fn delete_slide(&self, _id: &str) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn list_slides(&self) -> Result<Vec<String>, RemoteError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_select_success_updates_editor_and_selection() {
        signage_common::testing::init_global_test_logging();
        let panel = SlidePanel::new(
            MockApi::with_slides(&[("abc", "<p>hi</p>")]),
            MockView::answering(true),
        );

        let outcome = panel.select("abc").await;

        assert!(matches!(outcome, SelectOutcome::Shown));
        assert_eq!(panel.view().editor(), "<p>hi</p>");
        assert_eq!(panel.selected(), Selection::Slide("abc".to_string()));
    }

    #[tokio::test]
    async fn test_select_failure_clears_selection_by_default() {
        let panel = SlidePanel::new(
            MockApi::with_slides(&[("abc", "<p>hi</p>")]),
            MockView::answering(true),
        );
        panel.select("abc").await;

        let outcome = panel.select("missing").await;

        match outcome {
            SelectOutcome::Failed(e) => assert_eq!(e.code(), Some(ErrorCode::InvalidRequest)),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(panel.view().editor(), "");
        assert_eq!(panel.selected(), Selection::None);
    }

    #[tokio::test]
    async fn test_select_failure_can_keep_selection() {
        let panel = SlidePanel::with_policy(
            MockApi::with_slides(&[("abc", "<p>hi</p>")]),
            MockView::answering(true),
            SelectFailurePolicy::KeepSelection,
        );
        panel.select("abc").await;

        let outcome = panel.select("missing").await;

        assert!(matches!(outcome, SelectOutcome::Failed(_)));
        assert_eq!(panel.view().editor(), "");
        assert_eq!(panel.selected(), Selection::Slide("abc".to_string()));
    }

    #[tokio::test]
    async fn test_transport_failure_handled_like_error_response() {
        let panel = SlidePanel::new(
            MockApi::with_slides(&[("abc", "<p>hi</p>")]),
            MockView::answering(true),
        );
        panel.select("abc").await;

        let outcome = panel.select("offline").await;

        match outcome {
            SelectOutcome::Failed(e) => assert!(matches!(e, RemoteError::Transport(_))),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(panel.view().editor(), "");
        assert_eq!(panel.selected(), Selection::None);
    }

    #[tokio::test]
    async fn test_stale_response_does_not_clobber_editor() {
        let api = GatedApi::default();
        let abc = api.gate("abc");
        let xyz = api.gate("xyz");
        let panel = SlidePanel::new(api, MockView::answering(true));

        let (first, second) = tokio::join!(panel.select("abc"), async {
            xyz.send(Ok("<p>xyz</p>".to_string())).unwrap();
            let outcome = panel.select("xyz").await;
            abc.send(Ok("<p>abc</p>".to_string())).unwrap();
            outcome
        });

        assert!(matches!(second, SelectOutcome::Shown));
        assert!(matches!(first, SelectOutcome::Superseded));
        assert_eq!(panel.view().editor(), "<p>xyz</p>");
        assert_eq!(panel.selected(), Selection::Slide("xyz".to_string()));
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_clear_editor() {
        let api = GatedApi::default();
        let abc = api.gate("abc");
        let xyz = api.gate("xyz");
        let panel = SlidePanel::new(api, MockView::answering(true));

        let (first, _) = tokio::join!(panel.select("abc"), async {
            xyz.send(Ok("<p>xyz</p>".to_string())).unwrap();
            let outcome = panel.select("xyz").await;
            abc.send(Err(RemoteError::Transport("timeout".to_string())))
                .unwrap();
            outcome
        });

        assert!(matches!(first, SelectOutcome::Superseded));
        assert_eq!(panel.view().editor(), "<p>xyz</p>");
        assert_eq!(panel.selected(), Selection::Slide("xyz".to_string()));
    }

    #[tokio::test]
    async fn test_remove_without_selection_prompts_and_makes_no_call() {
        let panel = SlidePanel::new(MockApi::default(), MockView::answering(true));

        let outcome = panel.remove().await;

        assert!(matches!(outcome, RemoveOutcome::NothingSelected));
        assert_eq!(panel.api().calls(), 0);
        let log = panel.view().log.lock().unwrap();
        assert_eq!(log.alerts, vec![SELECT_FIRST_PROMPT.to_string()]);
        assert!(log.confirms.is_empty());
    }

    #[tokio::test]
    async fn test_remove_declined_makes_no_call() {
        let panel = SlidePanel::new(
            MockApi::with_slides(&[("abc", "<p>hi</p>")]),
            MockView::answering(false),
        );
        panel.select("abc").await;

        let outcome = panel.remove().await;

        assert!(matches!(outcome, RemoveOutcome::Cancelled));
        assert_eq!(panel.api().deletes.load(Ordering::SeqCst), 0);
        assert_eq!(panel.selected(), Selection::Slide("abc".to_string()));
        let log = panel.view().log.lock().unwrap();
        assert_eq!(
            log.confirms,
            vec!["Are you sure you want to delete the slide 'abc'?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_success_removes_button() {
        let panel = SlidePanel::new(
            MockApi::with_slides(&[("abc", "<p>hi</p>")]),
            MockView::answering(true),
        );
        panel.select("abc").await;

        let outcome = panel.remove().await;

        match outcome {
            RemoveOutcome::Removed(id) => assert_eq!(id, "abc"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(panel.view().log.lock().unwrap().removed, vec!["abc"]);
        assert_eq!(panel.selected(), Selection::None);
    }

    #[tokio::test]
    async fn test_remove_failure_changes_nothing() {
        let mut api = MockApi::with_slides(&[("abc", "<p>hi</p>")]);
        api.fail_delete = true;
        let panel = SlidePanel::new(api, MockView::answering(true));
        panel.select("abc").await;

        let outcome = panel.remove().await;

        match outcome {
            RemoveOutcome::Failed(e) => assert_eq!(e.code(), Some(ErrorCode::Lock)),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let log = panel.view().log.lock().unwrap();
        assert!(log.removed.is_empty());
        assert_eq!(log.editor, "<p>hi</p>");
        drop(log);
        assert_eq!(panel.selected(), Selection::Slide("abc".to_string()));
    }

    #[tokio::test]
    async fn test_create_is_placeholder() {
        let panel = SlidePanel::new(MockApi::default(), MockView::answering(true));
        panel.create();
        assert_eq!(panel.api().calls(), 0);
        assert_eq!(panel.selected(), Selection::None);
    }
}
