//! Pipeline step definitions.
//!
//! A pipeline is a tree of steps: actions that mutate the object,
//! branches that pick a sub-list of steps from a predicate, and the
//! two suspension points. Steps are built once and shared, so the
//! behavioural traits live behind `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{EngineError, EngineResult, StepError};
use crate::object::WorkflowObject;

/// What an action tells the executor to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Proceed to the following step.
    Continue,
    /// Finish the object now, skipping all remaining steps.
    StopProcessing,
}

/// A step that mutates the workflow object.
pub trait Action: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, object: &mut WorkflowObject) -> Result<Advance, StepError>;
}

/// A step condition.
pub trait Predicate: Send + Sync {
    fn name(&self) -> &str;
    fn eval(&self, object: &WorkflowObject) -> Result<bool, StepError>;
}

struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> Action for FnAction<F>
where
    F: Fn(&mut WorkflowObject) -> Result<Advance, StepError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, object: &mut WorkflowObject) -> Result<Advance, StepError> {
        (self.f)(object)
    }
}

struct FnPredicate<F> {
    name: String,
    f: F,
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&WorkflowObject) -> Result<bool, StepError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, object: &WorkflowObject) -> Result<bool, StepError> {
        (self.f)(object)
    }
}

/// One node in the step tree.
#[derive(Clone)]
pub enum Step {
    Action(Arc<dyn Action>),
    Branch {
        predicate: Arc<dyn Predicate>,
        when_true: Vec<Step>,
        when_false: Vec<Step>,
    },
    /// Suspend for an operator decision.
    Halt { action: String, message: String },
    /// Suspend for an external callback.
    Wait { message: String },
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Action(a) => f.debug_tuple("Action").field(&a.name()).finish(),
            Step::Branch { predicate, .. } => {
                f.debug_tuple("Branch").field(&predicate.name()).finish()
            }
            Step::Halt { action, .. } => f.debug_tuple("Halt").field(action).finish(),
            Step::Wait { .. } => f.debug_tuple("Wait").finish(),
        }
    }
}

/// Build an action step from a closure.
pub fn action<F>(name: impl Into<String>, f: F) -> Step
where
    F: Fn(&mut WorkflowObject) -> Result<Advance, StepError> + Send + Sync + 'static,
{
    Step::Action(Arc::new(FnAction {
        name: name.into(),
        f,
    }))
}

/// Build a two-armed branch step from a closure predicate.
pub fn branch<F>(
    name: impl Into<String>,
    predicate: F,
    when_true: Vec<Step>,
    when_false: Vec<Step>,
) -> Step
where
    F: Fn(&WorkflowObject) -> Result<bool, StepError> + Send + Sync + 'static,
{
    Step::Branch {
        predicate: Arc::new(FnPredicate {
            name: name.into(),
            f: predicate,
        }),
        when_true,
        when_false,
    }
}

/// A branch with an empty false arm.
pub fn when<F>(name: impl Into<String>, predicate: F, steps: Vec<Step>) -> Step
where
    F: Fn(&WorkflowObject) -> Result<bool, StepError> + Send + Sync + 'static,
{
    branch(name, predicate, steps, Vec::new())
}

/// Build a halt step.
pub fn halt(action: impl Into<String>, message: impl Into<String>) -> Step {
    Step::Halt {
        action: action.into(),
        message: message.into(),
    }
}

/// Build a wait step.
pub fn wait(message: impl Into<String>) -> Step {
    Step::Wait {
        message: message.into(),
    }
}

/// A named, ordered list of steps.
#[derive(Clone, Debug)]
pub struct Pipeline {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// Pipelines an engine can run, looked up by name.
#[derive(Clone, Debug, Default)]
pub struct PipelineRegistry {
    pipelines: HashMap<String, Arc<Pipeline>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pipeline: Pipeline) {
        self.pipelines
            .insert(pipeline.name.clone(), Arc::new(pipeline));
    }

    pub fn get(&self, name: &str) -> EngineResult<Arc<Pipeline>> {
        self.pipelines
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownPipeline(name.to_string()))
    }
}
