//! The runtime cell holding the current deployment phase.
//!
//! The phase is the only ambient state the propagation core reads. It is
//! thread-scoped rather than a mutable global: the deployment runtime sets
//! it once per phase on the thread driving the program, and transformations
//! capture it at construction time (see [`crate::Output::apply`]), so the
//! captured value travels inside the shared computation regardless of which
//! thread later polls it.
//!
//! Absent any explicit phase the core behaves like a real run
//! ([`DeployPhase::Update`]).

use bedrock::DeployPhase;
use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static CURRENT_PHASE: Cell<DeployPhase> = const { Cell::new(DeployPhase::Update) };
}

/// The phase transformations constructed on this thread will observe.
pub fn current_phase() -> DeployPhase {
    CURRENT_PHASE.with(Cell::get)
}

/// Set the phase for this thread. The deployment runtime calls this once
/// per phase; tests usually prefer the scoped [`enter_phase`].
pub fn set_phase(phase: DeployPhase) {
    CURRENT_PHASE.with(|cell| cell.set(phase));
}

/// Set the phase for a scope, restoring the previous phase when the
/// returned guard drops.
pub fn enter_phase(phase: DeployPhase) -> PhaseGuard {
    let previous = current_phase();
    set_phase(phase);
    PhaseGuard {
        previous,
        _thread_bound: PhantomData,
    }
}

/// Restores the previous phase on drop. Bound to the thread it was created
/// on — the phase it restores lives in that thread's cell.
#[must_use = "the previous phase is restored when the guard drops"]
pub struct PhaseGuard {
    previous: DeployPhase,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        set_phase(self.previous);
    }
}
