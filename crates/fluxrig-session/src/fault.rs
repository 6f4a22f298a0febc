//! Fault injection for the reference engine.
//!
//! A [`FaultPlan`] is shared by every session a
//! [`StubFactory`](crate::stub::StubFactory) opens, so call numbers keep
//! counting across resets: "the first solve" means the first solve of
//! the whole run, not of each session.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fluxrig_types::FluxrigError;

/// Engine operations that can be made to misbehave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StubOperation {
    Open,
    LoadModel,
    BuildMesh,
    BlockContent,
    SetBlockContent,
    Solve,
    AnalyzeResults,
    Integral,
    Rotate,
}

/// What happens on a faulted call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    /// The engine rejects the call.
    Fail,
    /// The engine process disappears.
    Disconnect,
    /// The call blocks for the given time, then proceeds normally.
    Hang(Duration),
}

#[derive(Debug, Clone)]
struct Rule {
    op: StubOperation,
    /// 1-based call number, or `None` for every call.
    call: Option<u32>,
    fault: Fault,
}

/// Which calls fail, and how.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    rules: Vec<Rule>,
    calls: HashMap<StubOperation, u32>,
}

impl FaultPlan {
    /// A plan with no faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `call`-th invocation (1-based) of `op` fail.
    pub fn fail_on(self, op: StubOperation, call: u32) -> Self {
        self.with_rule(op, Some(call), Fault::Fail)
    }

    /// Make the `call`-th invocation of `op` drop the connection.
    pub fn disconnect_on(self, op: StubOperation, call: u32) -> Self {
        self.with_rule(op, Some(call), Fault::Disconnect)
    }

    /// Make the `call`-th invocation of `op` block for `delay`.
    pub fn hang_on(self, op: StubOperation, call: u32, delay: Duration) -> Self {
        self.with_rule(op, Some(call), Fault::Hang(delay))
    }

    /// Make every invocation of `op` fail.
    pub fn fail_always(self, op: StubOperation) -> Self {
        self.with_rule(op, None, Fault::Fail)
    }

    fn with_rule(mut self, op: StubOperation, call: Option<u32>, fault: Fault) -> Self {
        self.rules.push(Rule { op, call, fault });
        self
    }

    /// Count a call to `op` and return the fault scheduled for it.
    pub fn next(&mut self, op: StubOperation) -> Option<Fault> {
        let count = self.calls.entry(op).or_insert(0);
        *count += 1;
        let n = *count;
        self.rules
            .iter()
            .find(|r| r.op == op && r.call.map_or(true, |c| c == n))
            .map(|r| r.fault)
    }

    /// How many times `op` has been called so far.
    pub fn calls(&self, op: StubOperation) -> u32 {
        self.calls.get(&op).copied().unwrap_or(0)
    }
}

impl Fault {
    /// The error an engine would raise for this fault, if any.
    pub(crate) fn into_error(self, op: StubOperation, call: u32) -> Option<FluxrigError> {
        match self {
            Fault::Fail => Some(FluxrigError::Automation(format!(
                "injected failure in {op:?} call #{call}"
            ))),
            Fault::Disconnect => Some(FluxrigError::ConnectionLost(format!(
                "engine exited during {op:?} call #{call}"
            ))),
            Fault::Hang(_) => None,
        }
    }
}
