//! Persisted resumption cursors.
//!
//! A checkpoint records *where in the step tree* execution last came
//! to rest: the step that completed or suspended, reached through the
//! branch arms taken on the way down. Resumption replays none of that
//! path; it descends the recorded arms without re-evaluating
//! predicates and continues with the step immediately after.

use serde::{Deserialize, Serialize};

/// Which arm of a branch was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchArm {
    WhenTrue,
    WhenFalse,
}

/// One level of the path into the step tree.
///
/// Outer frames carry the taken branch arm; the innermost frame has
/// `arm: None` and names the step to resume *after*.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Step index at this nesting level.
    pub index: usize,
    /// The branch arm descended into, for branch frames.
    pub arm: Option<BranchArm>,
}

/// The full resumption cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Path from the pipeline root to the resting step.
    pub frames: Vec<Frame>,
}

impl Checkpoint {
    /// A checkpoint at the very beginning of the pipeline.
    pub fn start() -> Self {
        Self::default()
    }

    /// Returns `true` if execution has not progressed past any step.
    pub fn is_start(&self) -> bool {
        self.frames.is_empty()
    }

    /// Build a checkpoint from the branch trail plus the resting step.
    pub fn at(trail: &[Frame], index: usize) -> Self {
        let mut frames = trail.to_vec();
        frames.push(Frame { index, arm: None });
        Self { frames }
    }
}
