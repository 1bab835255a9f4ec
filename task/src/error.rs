/// The error kinds produced anywhere in the planning pipeline (see the
/// grounder, encoder and search drivers for where each variant originates).
#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    /// A PDDL construct falls outside the supported STRIPS-with-negative-preconditions
    /// and universally-quantified-conditional-effects fragment (numeric fluents, durative
    /// actions, disjunctive preconditions, quantified goals, nested quantifiers beyond a
    /// single `forall`/`when`, ...). Fatal: raised before grounding is attempted.
    #[error("unsupported PDDL feature: {0}")]
    UnsupportedFeature(String),

    /// An action schema could not be grounded into any operator: a parameter type has no
    /// matching object, or every assignment was eliminated by static-predicate filtering.
    /// Not fatal: the action is dropped from the task and the condition is logged.
    #[error("action could not be grounded: {0}")]
    UngroundableDomain(String),

    /// No plan exists: the goal is unreachable even in the delete-relaxation, or the SAT
    /// driver exhausted its horizon cap.
    #[error("problem is unsolvable: {0}")]
    Unsolvable(String),

    /// The external SAT solver process is missing, crashed, or returned malformed output.
    #[error("SAT solver failure: {0}")]
    SolverFailure(String),

    /// An operator violated the STRIPS disjointness invariants after construction, or an
    /// extracted plan failed end-to-end validation. Indicates a grounder or encoder bug.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
