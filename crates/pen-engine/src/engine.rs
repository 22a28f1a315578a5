//! Step executor and resumption entry points.

use std::sync::Arc;

use pen_types::{Document, ObjectId, ObjectStatus, Source};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checkpoint::{BranchArm, Checkpoint, Frame};
use crate::error::{EngineError, EngineResult, StepError};
use crate::object::{ExtraData, FailureInfo, Verdict, WorkflowObject};
use crate::step::{Advance, PipelineRegistry, Step};
use crate::store::ObjectStore;

/// How a step sequence finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Every step ran; the caller continues with its own sequence.
    Continue,
    /// A halt or wait parked the object.
    Suspended,
    /// An action requested an early stop.
    Stopped,
}

/// Runs pipelines over a shared object store.
///
/// The engine persists the object after every step, so any worker
/// holding the same store can pick up a suspended object and resume
/// it from its checkpoint.
pub struct Engine {
    store: Arc<dyn ObjectStore>,
    registry: PipelineRegistry,
}

impl Engine {
    pub fn new(store: Arc<dyn ObjectStore>, registry: PipelineRegistry) -> Self {
        Self { store, registry }
    }

    /// The underlying object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Create an object for `data` and run it until it completes,
    /// suspends, or fails. A step failure leaves the object persisted
    /// in the error state; the id is returned either way.
    pub fn start(
        &self,
        pipeline: &str,
        data: Document,
        source: Source,
    ) -> EngineResult<ObjectId> {
        self.start_with_extra(pipeline, data, ExtraData::new(source))
    }

    /// Like [`Engine::start`] with caller-provided side-channel state,
    /// for pipelines that begin with context already established.
    pub fn start_with_extra(
        &self,
        pipeline: &str,
        data: Document,
        extra: ExtraData,
    ) -> EngineResult<ObjectId> {
        self.registry.get(pipeline)?;
        let mut object = WorkflowObject::new(pipeline, data, extra);
        let id = object.id;
        self.store.save(&object)?;
        info!(object = %id, pipeline, "started workflow object");
        match self.run(&mut object) {
            Ok(_) | Err(EngineError::StepFailed { .. }) => Ok(id),
            Err(error) => Err(error),
        }
    }

    pub fn load(&self, id: &ObjectId) -> EngineResult<WorkflowObject> {
        self.store.load(id)
    }

    pub fn status(&self, id: &ObjectId) -> EngineResult<ObjectStatus> {
        Ok(self.store.load(id)?.status)
    }

    /// Deliver an operator decision to a halted object and run it
    /// forward. Fails with [`EngineError::StaleResumption`] if the
    /// object is no longer halted.
    pub fn resume(&self, id: &ObjectId, verdict: Verdict) -> EngineResult<ObjectStatus> {
        let mut object = self.store.load(id)?;
        if object.status != ObjectStatus::Halted {
            return Err(EngineError::StaleResumption {
                id: *id,
                status: object.status,
                expected: "halted",
            });
        }
        info!(object = %id, approved = verdict.approved, "resuming halted object");
        object.extra.approved = Some(verdict.approved);
        object.extra.approval_reason = verdict.reason;
        object.extra.halt_action = None;
        object.extra.halt_message = None;
        object.status = ObjectStatus::Running;
        object.touch();
        self.store.save(&object)?;
        self.run_to_status(&mut object)
    }

    /// Deliver an external callback to a waiting object. `data`, when
    /// present, replaces the object's payload before it runs forward.
    pub fn resume_callback(
        &self,
        key: &str,
        data: Option<Document>,
    ) -> EngineResult<ObjectStatus> {
        let mut object = self
            .store
            .find_by_callback(key)?
            .ok_or_else(|| EngineError::UnknownCallback(key.to_string()))?;
        if object.status != ObjectStatus::Waiting {
            return Err(EngineError::StaleResumption {
                id: object.id,
                status: object.status,
                expected: "waiting",
            });
        }
        info!(object = %object.id, "resuming waiting object from callback");
        if let Some(data) = data {
            object.data = data;
        }
        object.extra.callback_key = None;
        object.status = ObjectStatus::Running;
        object.touch();
        self.store.save(&object)?;
        self.run_to_status(&mut object)
    }

    /// Re-run a failed object from its checkpoint. The step that
    /// failed runs again.
    pub fn replay(&self, id: &ObjectId) -> EngineResult<ObjectStatus> {
        let mut object = self.store.load(id)?;
        if object.status != ObjectStatus::Error {
            return Err(EngineError::StaleResumption {
                id: *id,
                status: object.status,
                expected: "error",
            });
        }
        info!(object = %id, "replaying failed object");
        object.extra.failure = None;
        object.status = ObjectStatus::Running;
        object.touch();
        self.store.save(&object)?;
        self.run_to_status(&mut object)
    }

    /// Finish an object without running its remaining steps. Returns
    /// `false` if the object is already in a terminal state.
    pub fn stop(&self, id: &ObjectId, stopped_by: Option<ObjectId>) -> EngineResult<bool> {
        stop_object(self.store.as_ref(), id, stopped_by)
    }

    fn run_to_status(&self, object: &mut WorkflowObject) -> EngineResult<ObjectStatus> {
        match self.run(object) {
            Ok(status) => Ok(status),
            Err(EngineError::StepFailed { .. }) => Ok(ObjectStatus::Error),
            Err(error) => Err(error),
        }
    }

    fn run(&self, object: &mut WorkflowObject) -> EngineResult<ObjectStatus> {
        let pipeline = self.registry.get(&object.pipeline)?;
        let frames = object.checkpoint.frames.clone();
        let resume = if frames.is_empty() {
            None
        } else {
            Some(frames.as_slice())
        };
        let mut trail = Vec::new();
        let flow = self.run_steps(object, &pipeline.steps, &mut trail, resume)?;
        if flow == Flow::Continue {
            object.status = ObjectStatus::Completed;
            object.touch();
            self.store.save(object)?;
            info!(object = %object.id, pipeline = %object.pipeline, "object completed");
        }
        Ok(object.status)
    }

    /// Run `steps` in order, starting past the resume cursor when one
    /// is given. The cursor names the step that last came to rest;
    /// branch frames are descended without re-evaluating predicates.
    fn run_steps(
        &self,
        object: &mut WorkflowObject,
        steps: &[Step],
        trail: &mut Vec<Frame>,
        resume: Option<&[Frame]>,
    ) -> EngineResult<Flow> {
        let mut start = 0;
        if let Some(frames) = resume {
            let frame = frames.first().ok_or(EngineError::CorruptCheckpoint)?;
            let step = steps.get(frame.index).ok_or(EngineError::CorruptCheckpoint)?;
            if frames.len() > 1 {
                let arm = frame.arm.ok_or(EngineError::CorruptCheckpoint)?;
                let Step::Branch {
                    when_true,
                    when_false,
                    ..
                } = step
                else {
                    return Err(EngineError::CorruptCheckpoint);
                };
                let inner = match arm {
                    BranchArm::WhenTrue => when_true,
                    BranchArm::WhenFalse => when_false,
                };
                trail.push(*frame);
                let flow = self.run_steps(object, inner, trail, Some(&frames[1..]))?;
                trail.pop();
                if flow != Flow::Continue {
                    return Ok(flow);
                }
            } else {
                if frame.arm.is_some() || matches!(step, Step::Branch { .. }) {
                    return Err(EngineError::CorruptCheckpoint);
                }
            }
            start = frame.index + 1;
        }

        for index in start..steps.len() {
            match &steps[index] {
                Step::Action(action) => {
                    debug!(object = %object.id, step = action.name(), "running action");
                    match action.run(object) {
                        Ok(Advance::Continue) => {
                            object.checkpoint = Checkpoint::at(trail, index);
                            object.touch();
                            self.store.save(object)?;
                        }
                        Ok(Advance::StopProcessing) => {
                            object.status = ObjectStatus::Completed;
                            object.checkpoint = Checkpoint::at(trail, index);
                            object.touch();
                            self.store.save(object)?;
                            info!(
                                object = %object.id,
                                step = action.name(),
                                "object stopped early"
                            );
                            return Ok(Flow::Stopped);
                        }
                        Err(error) => {
                            return Err(self.fail_step(object, action.name(), error)?);
                        }
                    }
                }
                Step::Branch {
                    predicate,
                    when_true,
                    when_false,
                } => {
                    let taken = match predicate.eval(object) {
                        Ok(taken) => taken,
                        Err(error) => {
                            return Err(self.fail_step(object, predicate.name(), error)?);
                        }
                    };
                    debug!(
                        object = %object.id,
                        step = predicate.name(),
                        taken,
                        "evaluated branch"
                    );
                    let (arm, inner) = if taken {
                        (BranchArm::WhenTrue, when_true)
                    } else {
                        (BranchArm::WhenFalse, when_false)
                    };
                    trail.push(Frame {
                        index,
                        arm: Some(arm),
                    });
                    let flow = self.run_steps(object, inner, trail, None)?;
                    trail.pop();
                    if flow != Flow::Continue {
                        return Ok(flow);
                    }
                }
                Step::Halt { action, message } => {
                    object.status = ObjectStatus::Halted;
                    object.extra.halt_action = Some(action.clone());
                    object.extra.halt_message = Some(message.clone());
                    object.checkpoint = Checkpoint::at(trail, index);
                    object.touch();
                    self.store.save(object)?;
                    info!(object = %object.id, action = %action, "object halted for approval");
                    return Ok(Flow::Suspended);
                }
                Step::Wait { message } => {
                    object.status = ObjectStatus::Waiting;
                    if object.extra.callback_key.is_none() {
                        object.extra.callback_key = Some(Uuid::now_v7().to_string());
                    }
                    object.checkpoint = Checkpoint::at(trail, index);
                    object.touch();
                    self.store.save(object)?;
                    info!(object = %object.id, message = %message, "object waiting for callback");
                    return Ok(Flow::Suspended);
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Record a step failure on the object and persist it. The
    /// checkpoint stays at the last successful step so a replay
    /// re-runs the failed one.
    fn fail_step(
        &self,
        object: &mut WorkflowObject,
        step: &str,
        error: StepError,
    ) -> EngineResult<EngineError> {
        warn!(object = %object.id, step, %error, "step failed");
        object.status = ObjectStatus::Error;
        object.extra.failure = Some(FailureInfo {
            step: step.to_string(),
            message: error.to_string(),
        });
        object.touch();
        self.store.save(object)?;
        Ok(EngineError::StepFailed {
            step: step.to_string(),
            message: error.to_string(),
        })
    }
}

/// Finish an in-flight object outside normal execution, recording who
/// stopped it. Terminal objects are left alone.
pub fn stop_object(
    store: &dyn ObjectStore,
    id: &ObjectId,
    stopped_by: Option<ObjectId>,
) -> EngineResult<bool> {
    let mut object = store.load(id)?;
    if object.status.is_terminal() {
        return Ok(false);
    }
    object.status = ObjectStatus::Completed;
    object.extra.stopped_by = stopped_by;
    object.touch();
    store.save(&object)?;
    info!(object = %id, ?stopped_by, "object stopped");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{action, branch, halt, wait, when, Pipeline};
    use crate::store::InMemoryObjectStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn engine_with(pipelines: Vec<Pipeline>) -> Engine {
        let mut registry = PipelineRegistry::new();
        for pipeline in pipelines {
            registry.register(pipeline);
        }
        Engine::new(Arc::new(InMemoryObjectStore::new()), registry)
    }

    fn record_step(name: &str) -> Step {
        let name = name.to_string();
        let label = name.clone();
        action(name, move |obj: &mut WorkflowObject| {
            let trace = obj
                .data
                .entry("trace".to_string())
                .or_insert_with(|| json!([]));
            if let Some(items) = trace.as_array_mut() {
                items.push(json!(label));
            }
            Ok(Advance::Continue)
        })
    }

    fn trace(obj: &WorkflowObject) -> Vec<String> {
        obj.data["trace"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    // ---- Test 1: linear pipeline runs to completion ----

    #[test]
    fn linear_pipeline_completes() {
        let engine = engine_with(vec![Pipeline::new(
            "linear",
            vec![record_step("a"), record_step("b")],
        )]);
        let id = engine
            .start("linear", Document::new(), Source::arxiv())
            .unwrap();
        let obj = engine.load(&id).unwrap();
        assert_eq!(obj.status, ObjectStatus::Completed);
        assert_eq!(trace(&obj), vec!["a", "b"]);
    }

    #[test]
    fn unknown_pipeline_is_rejected_before_saving() {
        let engine = engine_with(vec![]);
        assert!(matches!(
            engine.start("missing", Document::new(), Source::arxiv()),
            Err(EngineError::UnknownPipeline(_))
        ));
    }

    // ---- Test 2: halt and approval resumption ----

    #[test]
    fn halt_parks_then_approval_runs_remainder() {
        let engine = engine_with(vec![Pipeline::new(
            "approval",
            vec![
                record_step("before"),
                halt("hep_approval", "curator decision needed"),
                record_step("after"),
            ],
        )]);
        let id = engine
            .start("approval", Document::new(), Source::arxiv())
            .unwrap();

        let halted = engine.load(&id).unwrap();
        assert_eq!(halted.status, ObjectStatus::Halted);
        assert_eq!(halted.extra.halt_action.as_deref(), Some("hep_approval"));
        assert_eq!(trace(&halted), vec!["before"]);

        let status = engine.resume(&id, Verdict::approve()).unwrap();
        assert_eq!(status, ObjectStatus::Completed);
        let done = engine.load(&id).unwrap();
        assert_eq!(done.extra.approved, Some(true));
        assert!(done.extra.halt_action.is_none());
        assert_eq!(trace(&done), vec!["before", "after"]);
    }

    #[test]
    fn rejection_is_visible_to_later_steps() {
        let engine = engine_with(vec![Pipeline::new(
            "approval",
            vec![
                halt("hep_approval", "curator decision needed"),
                action("record_verdict", |obj: &mut WorkflowObject| {
                    let approved = obj.extra.approved.unwrap_or(false);
                    obj.data.insert("accepted".into(), json!(approved));
                    Ok(Advance::Continue)
                }),
            ],
        )]);
        let id = engine
            .start("approval", Document::new(), Source::arxiv())
            .unwrap();
        engine.resume(&id, Verdict::reject("not relevant")).unwrap();
        let obj = engine.load(&id).unwrap();
        assert_eq!(obj.status, ObjectStatus::Completed);
        assert_eq!(obj.data["accepted"], json!(false));
        assert_eq!(obj.extra.approval_reason.as_deref(), Some("not relevant"));
    }

    #[test]
    fn resume_of_non_halted_object_is_stale() {
        let engine = engine_with(vec![Pipeline::new("linear", vec![record_step("a")])]);
        let id = engine
            .start("linear", Document::new(), Source::arxiv())
            .unwrap();
        assert!(matches!(
            engine.resume(&id, Verdict::approve()),
            Err(EngineError::StaleResumption {
                status: ObjectStatus::Completed,
                ..
            })
        ));
    }

    // ---- Test 3: wait and callback resumption ----

    #[test]
    fn wait_assigns_key_and_callback_resumes() {
        let engine = engine_with(vec![Pipeline::new(
            "callback",
            vec![wait("external enrichment"), record_step("after")],
        )]);
        let id = engine
            .start("callback", Document::new(), Source::arxiv())
            .unwrap();

        let waiting = engine.load(&id).unwrap();
        assert_eq!(waiting.status, ObjectStatus::Waiting);
        let key = waiting.extra.callback_key.clone().unwrap();

        let mut enriched = Document::new();
        enriched.insert("trace".into(), json!([]));
        enriched.insert("enriched".into(), json!(true));
        let status = engine.resume_callback(&key, Some(enriched)).unwrap();
        assert_eq!(status, ObjectStatus::Completed);

        let done = engine.load(&id).unwrap();
        assert_eq!(done.data["enriched"], json!(true));
        assert_eq!(trace(&done), vec!["after"]);
        assert!(done.extra.callback_key.is_none());
    }

    #[test]
    fn unknown_callback_key_is_rejected() {
        let engine = engine_with(vec![Pipeline::new("callback", vec![wait("hold")])]);
        engine
            .start("callback", Document::new(), Source::arxiv())
            .unwrap();
        assert!(matches!(
            engine.resume_callback("wrong-key", None),
            Err(EngineError::UnknownCallback(_))
        ));
    }

    // ---- Test 4: branches and resumption without re-evaluation ----

    #[test]
    fn branches_run_inline_in_order() {
        let engine = engine_with(vec![Pipeline::new(
            "branching",
            vec![
                record_step("start"),
                branch(
                    "has_flag",
                    |obj: &WorkflowObject| Ok(obj.data.contains_key("flag")),
                    vec![record_step("flagged")],
                    vec![record_step("plain"), record_step("plain2")],
                ),
                record_step("end"),
            ],
        )]);
        let id = engine
            .start("branching", Document::new(), Source::arxiv())
            .unwrap();
        assert_eq!(
            trace(&engine.load(&id).unwrap()),
            vec!["start", "plain", "plain2", "end"]
        );
    }

    #[test]
    fn resume_does_not_re_evaluate_predicates() {
        // The predicate answers true exactly once. If resumption
        // re-evaluated it, execution would jump to the false arm.
        let first = Arc::new(AtomicBool::new(true));
        let first_ref = first.clone();
        let engine = engine_with(vec![Pipeline::new(
            "sticky",
            vec![
                branch(
                    "first_time",
                    move |_: &WorkflowObject| Ok(first_ref.swap(false, Ordering::SeqCst)),
                    vec![
                        record_step("true_before"),
                        halt("hep_approval", "hold"),
                        record_step("true_after"),
                    ],
                    vec![record_step("false_arm")],
                ),
                record_step("end"),
            ],
        )]);
        let id = engine
            .start("sticky", Document::new(), Source::arxiv())
            .unwrap();
        assert_eq!(engine.status(&id).unwrap(), ObjectStatus::Halted);

        engine.resume(&id, Verdict::approve()).unwrap();
        assert_eq!(
            trace(&engine.load(&id).unwrap()),
            vec!["true_before", "true_after", "end"]
        );
    }

    #[test]
    fn when_skips_empty_false_arm() {
        let engine = engine_with(vec![Pipeline::new(
            "guarded",
            vec![
                when(
                    "never",
                    |_: &WorkflowObject| Ok(false),
                    vec![record_step("skipped")],
                ),
                record_step("end"),
            ],
        )]);
        let id = engine
            .start("guarded", Document::new(), Source::arxiv())
            .unwrap();
        assert_eq!(trace(&engine.load(&id).unwrap()), vec!["end"]);
    }

    // ---- Test 5: early stop ----

    #[test]
    fn stop_processing_skips_remaining_steps() {
        let engine = engine_with(vec![Pipeline::new(
            "early",
            vec![
                record_step("first"),
                action("bail", |_: &mut WorkflowObject| Ok(Advance::StopProcessing)),
                record_step("unreachable"),
            ],
        )]);
        let id = engine
            .start("early", Document::new(), Source::arxiv())
            .unwrap();
        let obj = engine.load(&id).unwrap();
        assert_eq!(obj.status, ObjectStatus::Completed);
        assert_eq!(trace(&obj), vec!["first"]);
    }

    // ---- Test 6: failure and replay ----

    #[test]
    fn step_failure_records_error_and_replay_recovers() {
        let broken = Arc::new(AtomicBool::new(true));
        let broken_ref = broken.clone();
        let engine = engine_with(vec![Pipeline::new(
            "flaky",
            vec![
                record_step("first"),
                action("fetch", move |_: &mut WorkflowObject| {
                    if broken_ref.load(Ordering::SeqCst) {
                        Err(StepError::new("upstream unavailable"))
                    } else {
                        Ok(Advance::Continue)
                    }
                }),
                record_step("last"),
            ],
        )]);
        let id = engine
            .start("flaky", Document::new(), Source::arxiv())
            .unwrap();

        let failed = engine.load(&id).unwrap();
        assert_eq!(failed.status, ObjectStatus::Error);
        let failure = failed.extra.failure.as_ref().unwrap();
        assert_eq!(failure.step, "fetch");
        assert!(failure.message.contains("upstream unavailable"));
        assert_eq!(trace(&failed), vec!["first"]);

        broken.store(false, Ordering::SeqCst);
        let status = engine.replay(&id).unwrap();
        assert_eq!(status, ObjectStatus::Completed);
        let done = engine.load(&id).unwrap();
        assert!(done.extra.failure.is_none());
        // "first" does not run again; the checkpoint survived the failure.
        assert_eq!(trace(&done), vec!["first", "last"]);
    }

    #[test]
    fn replay_of_non_failed_object_is_stale() {
        let engine = engine_with(vec![Pipeline::new("linear", vec![record_step("a")])]);
        let id = engine
            .start("linear", Document::new(), Source::arxiv())
            .unwrap();
        assert!(matches!(
            engine.replay(&id),
            Err(EngineError::StaleResumption { .. })
        ));
    }

    // ---- Test 7: stopping in-flight objects ----

    #[test]
    fn stop_finishes_suspended_object_once() {
        let engine = engine_with(vec![Pipeline::new(
            "held",
            vec![halt("hep_approval", "hold"), record_step("after")],
        )]);
        let id = engine
            .start("held", Document::new(), Source::arxiv())
            .unwrap();
        let stopper = ObjectId::new();

        assert!(engine.stop(&id, Some(stopper)).unwrap());
        let obj = engine.load(&id).unwrap();
        assert_eq!(obj.status, ObjectStatus::Completed);
        assert_eq!(obj.extra.stopped_by, Some(stopper));
        assert!(obj.data.get("trace").is_none());

        // Already terminal.
        assert!(!engine.stop(&id, None).unwrap());
        // The pending approval is gone with it.
        assert!(matches!(
            engine.resume(&id, Verdict::approve()),
            Err(EngineError::StaleResumption { .. })
        ));
    }
}
