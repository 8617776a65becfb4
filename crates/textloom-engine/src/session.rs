//! Editor session: the single owner of "currently active" state.

use crate::command::BoxedCommand;
use crate::command::history::History;
use crate::content::block::{BehaviorRegistry, BlockBehavior, BlockId, JoinMode};
use crate::content::document::{Caret, Document, RegionAddr};
use crate::error::EditError;

/// The active inline widget, addressed through its owning region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWidget {
    pub addr: RegionAddr,
    pub index: usize,
}

/// One editing session over one document.
///
/// The active-block and active-widget pointers live here as explicit fields,
/// set on focus-in and cleared on focus-out, and every handler receives the
/// session instead of reaching for process-wide state. Input handlers build
/// pipelines (usually through the active block's [`BlockBehavior`]) and hand
/// them to [`Session::run`]; the session owns the history that serializes
/// them.
pub struct Session {
    document: Document,
    history: History,
    behaviors: BehaviorRegistry,
    active_block: Option<BlockId>,
    active_widget: Option<ActiveWidget>,
}

impl Session {
    pub fn new(document: Document) -> Self {
        Self::with_history(document, History::new())
    }

    pub fn with_history(document: Document, history: History) -> Self {
        Self {
            document,
            history,
            behaviors: BehaviorRegistry::new(),
            active_block: None,
            active_widget: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct document access for setup and ingestion. Mutations made here
    /// bypass history and cannot be undone.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn register_behavior(&mut self, behavior: Box<dyn BlockBehavior>) {
        self.behaviors.register(behavior);
    }

    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    /// Execute a command through history.
    pub fn run(&mut self, command: BoxedCommand) -> Result<(), EditError> {
        self.history.execute(&mut self.document, command)
    }

    pub fn undo(&mut self) -> Result<bool, EditError> {
        self.history.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> Result<bool, EditError> {
        self.history.redo(&mut self.document)
    }

    pub fn focus_block(&mut self, id: BlockId) -> Result<(), EditError> {
        if self.document.block(&id).is_none() {
            return Err(EditError::BlockNotFound(id));
        }
        log::trace!("focus block {id}");
        self.active_block = Some(id);
        Ok(())
    }

    /// Clears both active pointers; a widget cannot stay active without its
    /// block.
    pub fn blur_block(&mut self) {
        self.active_block = None;
        self.active_widget = None;
    }

    pub fn focus_widget(&mut self, widget: ActiveWidget) -> Result<(), EditError> {
        self.document.region(&widget.addr)?;
        self.active_widget = Some(widget);
        Ok(())
    }

    pub fn blur_widget(&mut self) {
        self.active_widget = None;
    }

    pub fn active_block(&self) -> Option<BlockId> {
        self.active_block
    }

    pub fn active_widget(&self) -> Option<ActiveWidget> {
        self.active_widget
    }

    /// Dispatch Enter-with-collapsed-caret through the caret block's
    /// registered behavior.
    pub fn press_enter(&mut self) -> Result<(), EditError> {
        let caret = self.collapsed_caret()?;
        let pipeline = {
            let behavior = self.behavior_for(&caret.block)?;
            behavior.enter_collapsed(&self.document, &caret)?
        };
        self.run(Box::new(pipeline.build()))
    }

    /// Dispatch Backspace-at-region-start; returns how the block related to
    /// its predecessor so the caller can place the caret.
    pub fn press_backspace(&mut self) -> Result<JoinMode, EditError> {
        let caret = self.collapsed_caret()?;
        let plan = {
            let behavior = self.behavior_for(&caret.block)?;
            behavior.backspace_at_start(&self.document, &caret)?
        };
        self.run(Box::new(plan.pipeline.build()))?;
        Ok(plan.mode)
    }

    fn behavior_for(&self, block: &BlockId) -> Result<&dyn BlockBehavior, EditError> {
        let block = self
            .document
            .block(block)
            .ok_or(EditError::BlockNotFound(*block))?;
        self.behaviors
            .get(block.kind())
            .ok_or_else(|| EditError::UnknownKind(block.kind().to_string()))
    }

    fn collapsed_caret(&self) -> Result<Caret, EditError> {
        let selection = self.document.selection().ok_or(EditError::NoRange)?;
        if !selection.is_collapsed() {
            return Err(EditError::NoRange);
        }
        Ok(selection.head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{NoteBehavior, note, sample_session};

    #[test]
    fn focus_tracks_and_validates_blocks() {
        let (mut session, ids) = sample_session();
        session.focus_block(ids[0]).unwrap();
        assert_eq!(session.active_block(), Some(ids[0]));

        session.blur_block();
        assert_eq!(session.active_block(), None);

        assert!(matches!(
            session.focus_block(BlockId::new()),
            Err(EditError::BlockNotFound(_))
        ));
    }

    #[test]
    fn blur_block_clears_the_active_widget_too() {
        let (mut session, ids) = sample_session();
        session.focus_block(ids[0]).unwrap();
        session
            .focus_widget(ActiveWidget {
                addr: RegionAddr::new(ids[0], 0),
                index: 0,
            })
            .unwrap();
        assert!(session.active_widget().is_some());
        session.blur_block();
        assert!(session.active_widget().is_none());
    }

    #[test]
    fn press_enter_without_a_selection_is_an_authoring_error() {
        let (mut session, _) = sample_session();
        assert!(matches!(session.press_enter(), Err(EditError::NoRange)));
    }

    #[test]
    fn press_enter_splits_through_the_behavior_and_undoes_atomically() {
        let (mut session, ids) = sample_session();
        session.register_behavior(Box::new(NoteBehavior));
        session.document_mut().set_caret(Caret::new(ids[0], 0, 2));

        session.press_enter().unwrap();
        let texts: Vec<String> = session
            .document()
            .blocks()
            .map(|(_, b)| b.regions()[0].text())
            .collect();
        assert_eq!(texts, vec!["al", "pha", "beta", "gamma"]);

        assert!(session.undo().unwrap());
        let texts: Vec<String> = session
            .document()
            .blocks()
            .map(|(_, b)| b.regions()[0].text())
            .collect();
        assert_eq!(texts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn press_enter_at_the_end_creates_an_empty_successor() {
        let (mut session, ids) = sample_session();
        session.register_behavior(Box::new(NoteBehavior));
        session.document_mut().set_caret(Caret::new(ids[2], 0, 5));

        session.press_enter().unwrap();
        let texts: Vec<String> = session
            .document()
            .blocks()
            .map(|(_, b)| b.regions()[0].text())
            .collect();
        assert_eq!(texts, vec!["alpha", "beta", "gamma", ""]);
    }

    #[test]
    fn press_backspace_connects_into_the_previous_block() {
        let (mut session, ids) = sample_session();
        session.register_behavior(Box::new(NoteBehavior));
        session.document_mut().set_caret(Caret::new(ids[1], 0, 0));

        let mode = session.press_backspace().unwrap();
        assert_eq!(mode, JoinMode::Connect);
        let texts: Vec<String> = session
            .document()
            .blocks()
            .map(|(_, b)| b.regions()[0].text())
            .collect();
        assert_eq!(texts, vec!["alphabeta", "gamma"]);

        assert!(session.undo().unwrap());
        let texts: Vec<String> = session
            .document()
            .blocks()
            .map(|(_, b)| b.regions()[0].text())
            .collect();
        assert_eq!(texts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn press_enter_requires_a_registered_behavior() {
        let (mut session, ids) = sample_session();
        session.document_mut().set_caret(Caret::new(ids[0], 0, 0));
        assert!(matches!(
            session.press_enter(),
            Err(EditError::UnknownKind(_))
        ));
    }

    #[test]
    fn serialize_round_trips_through_the_registry() {
        let (session, _) = sample_session();
        let mut registry = BehaviorRegistry::new();
        registry.register(Box::new(NoteBehavior));

        let payloads = session.document().serialize(&registry).unwrap();
        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[0].kind, "note");

        let rebuilt = Document::from_serialized(&payloads, &registry).unwrap();
        let texts: Vec<String> = rebuilt
            .blocks()
            .map(|(_, b)| b.regions()[0].text())
            .collect();
        assert_eq!(texts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn unknown_kinds_fail_serialization() {
        let mut doc = Document::new();
        doc.push_back(note("x")).unwrap();
        let registry = BehaviorRegistry::new();
        assert!(matches!(
            doc.serialize(&registry),
            Err(EditError::UnknownKind(_))
        ));
    }
}
