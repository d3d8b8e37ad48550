use soroban_sdk::{contracterror, contracttype, Address, Bytes, BytesN, Symbol};

/// A service plan sold by the provider. Plans are never deleted, only
/// deactivated; outstanding credit and in-flight executions survive
/// deactivation.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Plan {
    /// Price charged per execution, in the plan's payment instrument.
    pub price: i128,
    /// Seconds after the requested timestamp during which execution is valid.
    pub window: u64,
    /// Ceiling on the gas budget a scheduled call may declare.
    pub gas_limit: u64,
    /// Payment instrument. `None` settles in the engine's value token
    /// (the native-asset sentinel).
    pub token: Option<Address>,
    pub active: bool,
}

/// Lifecycle state of a scheduled execution.
///
/// `Nonexistent` is the default for any id never written. `Overdue` is
/// derived, never stored: a `Scheduled` execution whose window has closed
/// reads as `Overdue` without a state-changing transaction. `Refunded` and
/// `Cancelled` are terminal and both restore value and credit, via different
/// triggers.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExecutionState {
    Nonexistent = 0,
    Scheduled = 1,
    ExecutionSuccessful = 2,
    ExecutionFailed = 3,
    Overdue = 4,
    Refunded = 5,
    Cancelled = 6,
}

/// One entry of a schedule or batch-schedule call.
#[derive(Clone)]
#[contracttype]
pub struct ScheduleRequest {
    pub plan_id: u32,
    /// Contract to invoke when the window opens.
    pub target: Address,
    /// Entry point on the target.
    pub function: Symbol,
    /// Opaque payload, forwarded as a single `Bytes` argument when non-empty.
    pub payload: Bytes,
    /// Declared gas budget; validated against the plan's `gas_limit`.
    pub gas: u64,
    /// Requested execution time, absolute seconds.
    pub timestamp: u64,
    /// Value-token amount escrowed and forwarded to the target on success.
    pub value: i128,
}

/// The canonical field tuple an execution id is derived from. Two requests
/// with equal seeds hash to the same id, which is how duplicate scheduling
/// is detected.
#[derive(Clone)]
#[contracttype]
pub struct ExecutionSeed {
    pub requestor: Address,
    pub plan_id: u32,
    pub target: Address,
    pub function: Symbol,
    pub payload: Bytes,
    pub gas: u64,
    pub timestamp: u64,
    pub value: i128,
}

/// A stored one-shot execution. Records are never removed, only
/// state-transitioned.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Execution {
    pub requestor: Address,
    pub plan_id: u32,
    pub target: Address,
    pub function: Symbol,
    pub payload: Bytes,
    pub gas: u64,
    pub timestamp: u64,
    pub value: i128,
    /// Modified only through the transitions in `executions`.
    pub state: ExecutionState,
}

/// Storage schema.
#[contracttype]
pub enum DataKey {
    /// Service provider admin address (instance).
    ServiceProvider,
    /// Receiver of plan-price payments (instance).
    Payee,
    /// Token standing in for native value: escrowed `value` amounts and
    /// `token: None` plans settle in it (instance).
    ValueToken,
    /// Pause flag (instance).
    Paused,
    /// Next plan id to allocate (instance).
    NextPlanId,
    /// Plan records (persistent).
    Plan(u32),
    /// Remaining prepaid executions per (requestor, plan) (persistent).
    Credit(Address, u32),
    /// Execution records by derived id (persistent).
    Execution(BytesN<32>),
    /// Execution ids per requestor, append-only (persistent).
    RequestorExecs(Address),
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotAuthorized = 1,
    AlreadyInitialized = 2,
    NotInitialized = 3,

    PlanNotFound = 4,
    InactivePlan = 5,
    PlanAlreadyInactive = 6,
    InvalidPrice = 7,
    InvalidWindow = 8,

    InvalidQuantity = 9,
    AmountMismatch = 10,
    BadToken = 11,
    AmountOverflow = 12,
    NoBalanceAvailable = 13,
    NoBalanceToRefund = 14,

    CannotScheduleInPast = 15,
    TooSoon = 16,
    AlreadyScheduled = 17,
    NotScheduled = 18,
    AlreadyExecuted = 19,
    NotOverdue = 20,
    ExecutionsTotalValueMismatch = 21,
    GasLimitExceeded = 22,

    OutOfRange = 23,
    ContractPaused = 24,
    ContractNotPaused = 25,
    InvalidValue = 26,
}

/// Events emitted for the audit trail.
#[contracttype]
#[derive(Clone)]
pub enum PlanEvent {
    Added,
    Removed,
}

#[contracttype]
#[derive(Clone)]
pub enum CreditEvent {
    Purchased,
    PlanRefunded,
}

#[contracttype]
#[derive(Clone)]
pub enum ExecutionEvent {
    Requested,
    Executed,
    Cancelled,
    Refunded,
}

#[contracttype]
#[derive(Clone)]
pub enum AdminEvent {
    PayeeChanged,
    Paused,
    Unpaused,
}
