//! Collaborator traits the embedding firmware must supply.
//!
//! A GPIO [`embedded_hal::digital::InputPin`], a monotonic clock, a software
//! task and an output transport (display, CAN frame, …) are the four things
//! a button needs from its environment. This crate expresses each as a
//! small trait so a [`crate::core::ButtonCore`] and the FSA families built
//! on it stay host-testable and framework-agnostic.

/// A monotonic millisecond clock.
///
/// Mirrors the half of `rtic_monotonics::fugit::Instant`/`Mono::now()` usage
/// in `buttons.rs::debounce_input` that this crate actually needs: a single
/// free-running counter, no wraparound handling required within the
/// lifetime of a debounce window.
pub trait MillisClock {
    /// Returns the current time in milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u64;
}

/// An opaque handle to a scheduled periodic callback.
///
/// Deliberately a plain `u32` rather than an associated type so
/// [`Scheduler`] stays object-safe and can be stored behind `&mut dyn
/// Scheduler` in FSA state without exploding every button type into a
/// generic parameter.
pub type TaskHandle = u32;

/// Creates, starts, stops and tears down a periodic software task.
///
/// Backs the "while-on" and "secondary mode tick" callbacks the original
/// implementation drives from a software-timer library; here the embedder
/// decides how the callback is actually pumped (RTIC software task, a
/// cooperative executor, a bare interrupt) and this crate only asks for
/// start/stop/delete around an opaque handle.
pub trait Scheduler {
    /// Registers a new periodic task at `period_ms` milliseconds, stopped.
    /// Returns a handle used by later calls.
    fn create(&mut self, period_ms: u64) -> TaskHandle;
    /// Starts (or resumes) the task identified by `handle`.
    fn start(&mut self, handle: TaskHandle);
    /// Stops the task identified by `handle` without destroying it.
    fn stop(&mut self, handle: TaskHandle);
    /// Tears down the task identified by `handle`. `handle` must not be
    /// reused afterwards.
    fn delete(&mut self, handle: TaskHandle);
}

/// Posts the packed output status word (see [`crate::status`]) to wherever
/// the embedding firmware wants it to go — a display, a CAN frame queue, a
/// shared atomic read by another task.
///
/// `post` overwrites: only the most recent status matters, there is no
/// queueing contract, matching spec behaviour for component C. It returns
/// whether the post succeeded (mirrors `notify_overwrite(handle, u32) ->
/// ok?`, §6) so [`crate::core::ButtonCore::notify`] can set the sticky
/// transport-fault flag per spec §7(iii) when the underlying transport
/// (queue full, receiver task gone) rejects the post.
pub trait NotifySink {
    /// Publishes the latest packed status word. Returns `false` on a
    /// transport failure; the caller is never blocked either way.
    fn post(&mut self, status: u32) -> bool;
}

/// Resumes or suspends a "while-on" helper task owned by the embedder.
///
/// Distinct from [`Scheduler`] because the while-on task is not a periodic
/// debounce tick: it is arbitrary application work the caller wants to run
/// only while the button reads as on.
pub trait TaskControl {
    /// Resumes the task.
    fn resume(&mut self);
    /// Suspends the task.
    fn suspend(&mut self);
}

/// A companion switch an [`crate::latch::external::ExternalUnlatch`] button
/// borrows to observe an external unlatch source.
///
/// Implemented by [`crate::base::DebouncedButton`] itself, so one button's
/// debounced output can drive another button's unlatch condition without an
/// owned reference or raw pointer.
pub trait CompanionSwitch {
    /// Returns the companion's current debounced on/off state.
    fn is_on(&self) -> bool;
}

/// In-memory test doubles for all four collaborator traits.
///
/// Only compiled for host-side unit tests (`cfg(feature = "std")`), mirrors
/// the `cfg_if`-gated `std`/`embassy` split `maxwase-button-driver` uses to
/// keep its own test module off-target.
#[cfg(feature = "std")]
pub mod test_support {
    use super::{MillisClock, NotifySink, Scheduler, TaskControl, TaskHandle};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::vec::Vec;

    /// A clock driven entirely by test code via [`FakeClock::advance`].
    ///
    /// Backed by `Rc<Cell<u64>>` so a handle can be cloned and kept by the
    /// test while another clone is handed to the button under test — both
    /// observe the same advancing time.
    #[derive(Debug, Default, Clone)]
    pub struct FakeClock {
        now_ms: Rc<Cell<u64>>,
    }

    impl FakeClock {
        /// Creates a clock starting at time zero.
        pub fn new() -> Self {
            Self::default()
        }

        /// Moves the clock forward by `delta_ms` milliseconds.
        pub fn advance(&self, delta_ms: u64) {
            self.now_ms.set(self.now_ms.get() + delta_ms);
        }
    }

    impl MillisClock for FakeClock {
        fn now_ms(&self) -> u64 {
            self.now_ms.get()
        }
    }

    /// A recording [`NotifySink`] that keeps only the latest posted word,
    /// plus a running count of how many posts occurred.
    #[derive(Debug, Default)]
    pub struct RecordingNotifySink {
        last: Option<u32>,
        post_count: usize,
        fail_next: bool,
    }

    impl RecordingNotifySink {
        /// Creates an empty sink.
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns the most recently posted status word, if any.
        pub fn last(&self) -> Option<u32> {
            self.last
        }

        /// Returns how many times [`NotifySink::post`] was called.
        pub fn post_count(&self) -> usize {
            self.post_count
        }

        /// Makes the next [`NotifySink::post`] call report failure, to
        /// exercise a consumer's transport-fault handling.
        pub fn fail_next_post(&mut self) {
            self.fail_next = true;
        }
    }

    impl NotifySink for RecordingNotifySink {
        fn post(&mut self, status: u32) -> bool {
            if self.fail_next {
                self.fail_next = false;
                return false;
            }
            self.last = Some(status);
            self.post_count += 1;
            true
        }
    }

    /// A no-op scheduler that tracks handle lifecycle and running state for
    /// assertions, without actually firing callbacks on a timer.
    #[derive(Debug, Default)]
    pub struct FakeScheduler {
        next_handle: TaskHandle,
        running: Vec<(TaskHandle, bool)>,
    }

    impl FakeScheduler {
        /// Creates a scheduler with no registered tasks.
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns whether `handle` is currently started.
        pub fn is_running(&self, handle: TaskHandle) -> bool {
            self.running
                .iter()
                .find(|(h, _)| *h == handle)
                .map(|(_, running)| *running)
                .unwrap_or(false)
        }
    }

    impl Scheduler for FakeScheduler {
        fn create(&mut self, _period_ms: u64) -> TaskHandle {
            let handle = self.next_handle;
            self.next_handle += 1;
            self.running.push((handle, false));
            handle
        }

        fn start(&mut self, handle: TaskHandle) {
            if let Some(entry) = self.running.iter_mut().find(|(h, _)| *h == handle) {
                entry.1 = true;
            }
        }

        fn stop(&mut self, handle: TaskHandle) {
            if let Some(entry) = self.running.iter_mut().find(|(h, _)| *h == handle) {
                entry.1 = false;
            }
        }

        fn delete(&mut self, handle: TaskHandle) {
            self.running.retain(|(h, _)| *h != handle);
        }
    }

    /// A test [`embedded_hal::digital::InputPin`] whose electrical level is
    /// flipped directly by test code via [`SharedPin::set_high`], backed by
    /// `Rc<Cell<bool>>` for the same share-a-handle reason as [`FakeClock`].
    #[derive(Debug, Default, Clone)]
    pub struct SharedPin {
        high: Rc<Cell<bool>>,
    }

    impl SharedPin {
        /// Creates a pin reading electrically low.
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets the electrical level read back by [`InputPin::is_high`].
        pub fn set_high(&self, high: bool) {
            self.high.set(high);
        }
    }

    impl embedded_hal::digital::ErrorType for SharedPin {
        type Error = ::core::convert::Infallible;
    }

    impl embedded_hal::digital::InputPin for SharedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.high.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.high.get())
        }
    }

    /// A [`TaskControl`] double that records the net resume/suspend state.
    #[derive(Debug, Default)]
    pub struct FakeTaskControl {
        running: bool,
        resume_count: usize,
        suspend_count: usize,
    }

    impl FakeTaskControl {
        /// Creates a task control starting in the suspended state.
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns whether the task is currently resumed.
        pub fn is_running(&self) -> bool {
            self.running
        }

        /// Returns how many times [`TaskControl::resume`] was called.
        pub fn resume_count(&self) -> usize {
            self.resume_count
        }

        /// Returns how many times [`TaskControl::suspend`] was called.
        pub fn suspend_count(&self) -> usize {
            self.suspend_count
        }
    }

    impl TaskControl for FakeTaskControl {
        fn resume(&mut self) {
            self.running = true;
            self.resume_count += 1;
        }

        fn suspend(&mut self) {
            self.running = false;
            self.suspend_count += 1;
        }
    }
}
