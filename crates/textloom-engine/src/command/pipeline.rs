//! Lazy, composable command pipelines.
//!
//! A pipeline turns a composite user action into an ordered list of steps.
//! Each step is evaluated only while the aggregate command first executes,
//! sees the document as earlier steps left it, and may read values earlier
//! steps parked in the scratch bag; that is what makes "delete the trailing
//! content, remember what was deleted, re-insert it elsewhere" a
//! three-liner. The aggregate is one undo step, and its redo replays the
//! recorded sub-commands without re-evaluating the lazy step functions, so
//! redo stays deterministic even when a step's logic depends on state that
//! has since gone stale.

use std::any::Any;
use std::collections::HashMap;
use std::mem;

use crate::command::{BoxedCommand, Command};
use crate::content::block::BlockId;
use crate::content::document::{Caret, Document};
use crate::content::region::Interval;
use crate::error::EditError;

/// The pipeline's fixed payload: what the triggering handler knew when it
/// built the pipeline. Steps receive it merged with their own override.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Context {
    pub block: Option<BlockId>,
    pub region: Option<usize>,
    pub interval: Option<Interval>,
    pub caret: Option<Caret>,
}

impl Context {
    /// Field-wise merge; fields set in `over` win.
    pub fn merged(&self, over: &Context) -> Context {
        Context {
            block: over.block.or(self.block),
            region: over.region.or(self.region),
            interval: over.interval.or(self.interval),
            caret: over.caret.or(self.caret),
        }
    }
}

/// Loosely-typed bag shared across the steps of one pipeline build.
///
/// Step functions are authored independently, so values pass forward by name
/// and the reader asserts the type on the way out.
#[derive(Default)]
pub struct Scratch {
    slots: HashMap<&'static str, Box<dyn Any>>,
}

impl Scratch {
    pub fn put<T: 'static>(&mut self, key: &'static str, value: T) {
        self.slots.insert(key, Box::new(value));
    }

    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.slots.get(key)?.downcast_ref()
    }

    /// Remove and return a value; a type mismatch leaves the slot in place.
    pub fn take<T: 'static>(&mut self, key: &'static str) -> Option<T> {
        match self.slots.remove(key)?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(boxed) => {
                self.slots.insert(key, boxed);
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }
}

/// Per-step control token.
#[derive(Debug, Default)]
pub struct Control {
    skip: bool,
    stop: bool,
}

impl Control {
    /// Treat this step as producing no command; the pipeline continues.
    pub fn skip(&mut self) {
        self.skip = true;
    }

    /// Run no further steps. Commands already executed stay in effect; a
    /// command returned by this step still runs first.
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

/// What a step sees while it is evaluated.
pub struct StepScope<'a> {
    /// The document as earlier steps left it. Read-only: mutation happens
    /// through the command the step returns.
    pub doc: &'a Document,
    /// The pipeline payload merged with this step's override.
    pub cx: &'a Context,
    pub scratch: &'a mut Scratch,
    pub control: &'a mut Control,
}

type StepFn = Box<dyn FnMut(&mut StepScope<'_>) -> Result<Option<BoxedCommand>, EditError>>;

struct Step {
    over: Option<Context>,
    run: StepFn,
}

type AfterHook = Box<dyn FnMut(&mut Document)>;

/// Builder composing lazy steps into one aggregate [`Command`].
pub struct CommandPipeline {
    context: Context,
    steps: Vec<Step>,
    on_execute: Vec<AfterHook>,
    on_undo: Vec<AfterHook>,
}

impl CommandPipeline {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            steps: Vec::new(),
            on_execute: Vec::new(),
            on_undo: Vec::new(),
        }
    }

    /// Append a lazy step.
    pub fn add_step<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut StepScope<'_>) -> Result<Option<BoxedCommand>, EditError> + 'static,
    {
        self.steps.push(Step {
            over: None,
            run: Box::new(f),
        });
        self
    }

    /// Append a lazy step with a context override merged over the pipeline
    /// payload for this step only.
    pub fn add_step_with<F>(mut self, over: Context, f: F) -> Self
    where
        F: FnMut(&mut StepScope<'_>) -> Result<Option<BoxedCommand>, EditError> + 'static,
    {
        self.steps.push(Step {
            over: Some(over),
            run: Box::new(f),
        });
        self
    }

    /// Hook run after every execute (first run and redo), typically to
    /// restore the caret after a structural change. Not required for the
    /// mutation's correctness.
    pub fn on_execute<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Document) + 'static,
    {
        self.on_execute.push(Box::new(hook));
        self
    }

    /// Hook run after every undo; the undo counterpart of
    /// [`CommandPipeline::on_execute`].
    pub fn on_undo<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Document) + 'static,
    {
        self.on_undo.push(Box::new(hook));
        self
    }

    /// Close the builder into a single aggregate command.
    pub fn build(self) -> PipelineCommand {
        PipelineCommand {
            context: self.context,
            steps: self.steps,
            scratch: Scratch::default(),
            recorded: Vec::new(),
            ran: false,
            on_execute: self.on_execute,
            on_undo: self.on_undo,
        }
    }
}

/// The aggregate command a pipeline builds into.
pub struct PipelineCommand {
    context: Context,
    steps: Vec<Step>,
    scratch: Scratch,
    recorded: Vec<BoxedCommand>,
    ran: bool,
    on_execute: Vec<AfterHook>,
    on_undo: Vec<AfterHook>,
}

impl PipelineCommand {
    /// Number of sub-commands recorded by the first execution.
    pub fn recorded_len(&self) -> usize {
        self.recorded.len()
    }
}

impl Command for PipelineCommand {
    /// First run: evaluate each step in order, executing and recording every
    /// produced sub-command immediately. Later runs replay the recorded list.
    ///
    /// A step error halts the pipeline with no rollback of sub-commands that
    /// already ran: step functions are pure computations over already-valid
    /// document state, so an error here is an authoring bug, not a runtime
    /// condition to recover from.
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        if self.ran {
            for command in &mut self.recorded {
                command.execute(doc)?;
            }
        } else {
            self.ran = true;
            let steps = mem::take(&mut self.steps);
            for mut step in steps {
                let cx = match &step.over {
                    Some(over) => self.context.merged(over),
                    None => self.context,
                };
                let mut control = Control::default();
                let produced = {
                    let mut scope = StepScope {
                        doc,
                        cx: &cx,
                        scratch: &mut self.scratch,
                        control: &mut control,
                    };
                    (step.run)(&mut scope)?
                };
                if !control.skip
                    && let Some(mut command) = produced
                {
                    command.execute(doc)?;
                    self.recorded.push(command);
                }
                if control.stop {
                    break;
                }
            }
        }
        for hook in &mut self.on_execute {
            hook(doc);
        }
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        for command in self.recorded.iter_mut().rev() {
            command.undo(doc)?;
        }
        for hook in &mut self.on_undo {
            hook(doc);
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ops::{CreateBlock, DeleteRange, InsertText};
    use crate::content::block::Block;
    use crate::content::document::{RegionAddr, Side};
    use crate::content::region::Region;
    use crate::position::token_count;

    fn doc_with(text: &str) -> (Document, RegionAddr) {
        let mut doc = Document::new();
        let block = Block::with_regions("note", vec![Region::from_text(text)]);
        let addr = RegionAddr::new(block.id(), 0);
        doc.push_back(block).expect("push");
        (doc, addr)
    }

    fn region_text(doc: &Document, addr: &RegionAddr) -> String {
        doc.region(addr).expect("region").text()
    }

    #[test]
    fn steps_run_in_order_and_see_earlier_effects() {
        let (mut doc, addr) = doc_with("");
        let mut pipeline = CommandPipeline::new(Context::default())
            .add_step(move |_| Ok(Some(Box::new(InsertText::new(addr, 0, "ab")))))
            .add_step(move |scope| {
                // The first step's insert is already applied.
                let count = token_count(scope.doc.region(&addr)?);
                assert_eq!(count, 2);
                Ok(Some(Box::new(InsertText::new(addr, count, "c"))))
            })
            .build();

        pipeline.execute(&mut doc).unwrap();
        assert_eq!(region_text(&doc, &addr), "abc");
        assert_eq!(pipeline.recorded_len(), 2);

        pipeline.undo(&mut doc).unwrap();
        assert_eq!(region_text(&doc, &addr), "");
    }

    #[test]
    fn skipped_steps_leave_no_phantom_undo() {
        let (mut doc, addr) = doc_with("");
        let mut pipeline = CommandPipeline::new(Context::default())
            .add_step(move |_| Ok(Some(Box::new(InsertText::new(addr, 0, "a")))))
            .add_step(move |scope| {
                scope.control.skip();
                // A command returned by a skipped step is discarded.
                Ok(Some(Box::new(InsertText::new(addr, 0, "never"))))
            })
            .add_step(move |_| Ok(Some(Box::new(InsertText::new(addr, 1, "b")))))
            .build();

        pipeline.execute(&mut doc).unwrap();
        assert_eq!(region_text(&doc, &addr), "ab");
        assert_eq!(pipeline.recorded_len(), 2);

        pipeline.undo(&mut doc).unwrap();
        assert_eq!(region_text(&doc, &addr), "");
    }

    #[test]
    fn stop_keeps_executed_commands_in_effect() {
        let (mut doc, addr) = doc_with("");
        let mut pipeline = CommandPipeline::new(Context::default())
            .add_step(move |scope| {
                scope.control.stop();
                Ok(Some(Box::new(InsertText::new(addr, 0, "kept"))))
            })
            .add_step(move |_| -> Result<Option<BoxedCommand>, EditError> {
                panic!("a stopped pipeline must not evaluate later steps");
            })
            .build();

        pipeline.execute(&mut doc).unwrap();
        assert_eq!(region_text(&doc, &addr), "kept");
    }

    #[test]
    fn scratch_carries_values_forward() {
        let (mut doc, addr) = doc_with("keep-tail");
        let mut pipeline = CommandPipeline::new(Context::default())
            .add_step(move |scope| {
                let text = scope.doc.region(&addr)?.text();
                let tail = text.split('-').next_back().unwrap_or("").to_string();
                scope.scratch.put("tail", tail);
                Ok(Some(Box::new(DeleteRange::new(
                    addr,
                    Interval::new(4, -1),
                ))))
            })
            .add_step(move |scope| {
                let tail: String = scope.scratch.take("tail").unwrap_or_default();
                let block = Block::with_regions("note", vec![Region::from_text(&tail)]);
                Ok(Some(Box::new(CreateBlock::new(
                    addr.block,
                    Side::After,
                    block,
                ))))
            })
            .build();

        pipeline.execute(&mut doc).unwrap();
        let texts: Vec<String> = doc.blocks().map(|(_, b)| b.regions()[0].text()).collect();
        assert_eq!(texts, vec!["keep", "tail"]);

        pipeline.undo(&mut doc).unwrap();
        let texts: Vec<String> = doc.blocks().map(|(_, b)| b.regions()[0].text()).collect();
        assert_eq!(texts, vec!["keep-tail"]);
    }

    #[test]
    fn redo_replays_recorded_commands_without_lazy_reevaluation() {
        let (mut doc, addr) = doc_with("");
        let mut evaluations = 0usize;
        let counter = std::rc::Rc::new(std::cell::Cell::new(0usize));
        let seen = counter.clone();
        let mut pipeline = CommandPipeline::new(Context::default())
            .add_step(move |_| {
                seen.set(seen.get() + 1);
                Ok(Some(Box::new(InsertText::new(addr, 0, "x"))))
            })
            .build();

        pipeline.execute(&mut doc).unwrap();
        evaluations += counter.get();
        pipeline.undo(&mut doc).unwrap();
        pipeline.execute(&mut doc).unwrap();
        assert_eq!(counter.get(), evaluations, "redo must not re-evaluate");
        assert_eq!(region_text(&doc, &addr), "x");
    }

    #[test]
    fn step_context_override_merges_over_the_payload() {
        let (mut doc, addr) = doc_with("");
        let base = Context {
            block: Some(addr.block),
            region: Some(0),
            ..Context::default()
        };
        let over = Context {
            interval: Some(Interval::collapsed(0)),
            ..Context::default()
        };
        let mut pipeline = CommandPipeline::new(base)
            .add_step_with(over, move |scope| {
                assert_eq!(scope.cx.block, Some(addr.block));
                assert_eq!(scope.cx.region, Some(0));
                assert_eq!(scope.cx.interval, Some(Interval::collapsed(0)));
                scope.control.skip();
                Ok(None)
            })
            .build();
        pipeline.execute(&mut doc).unwrap();
    }

    #[test]
    fn hooks_run_after_execute_and_undo() {
        let (mut doc, addr) = doc_with("abc");
        let caret = Caret::new(addr.block, 0, 3);
        let restored = Caret::new(addr.block, 0, 0);
        let mut pipeline = CommandPipeline::new(Context::default())
            .add_step(move |_| Ok(Some(Box::new(InsertText::new(addr, 3, "!")))))
            .on_execute(move |doc| doc.set_caret(caret))
            .on_undo(move |doc| doc.set_caret(restored))
            .build();

        pipeline.execute(&mut doc).unwrap();
        assert_eq!(doc.selection().map(|s| s.head), Some(caret));
        pipeline.undo(&mut doc).unwrap();
        assert_eq!(doc.selection().map(|s| s.head), Some(restored));
    }

    #[test]
    fn a_failing_step_halts_without_rolling_back() {
        let (mut doc, addr) = doc_with("");
        let mut pipeline = CommandPipeline::new(Context::default())
            .add_step(move |_| Ok(Some(Box::new(InsertText::new(addr, 0, "done")))))
            .add_step(move |_| Err(EditError::NoRange))
            .add_step(move |_| -> Result<Option<BoxedCommand>, EditError> {
                panic!("steps after a failure must not run");
            })
            .build();

        assert!(matches!(
            pipeline.execute(&mut doc),
            Err(EditError::NoRange)
        ));
        // The first step's effect stays; the error is an authoring bug for
        // the caller to surface, not a condition to auto-rollback.
        assert_eq!(region_text(&doc, &addr), "done");
    }
}
