use std::cell::Cell;
use std::rc::Rc;

/// Scheduler state. Pending means a pass will run on the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Pending,
}

/// Coalesces camera changes into at most one pass per frame.
///
/// The state is shared with every [`CameraSubscription`] handed out, so the
/// input side can arm a pass without holding the label layer.
#[derive(Debug)]
pub struct PassScheduler {
    state: Rc<Cell<PassState>>,
}

impl PassScheduler {
    pub fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(PassState::Idle)),
        }
    }

    pub fn state(&self) -> PassState {
        self.state.get()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == PassState::Pending
    }

    /// Arm a pass for the next frame. Returns true if this call armed it,
    /// false if one was already pending.
    pub fn request(&self) -> bool {
        arm(&self.state)
    }

    /// A handle for the camera-change source.
    pub fn subscribe(&self) -> CameraSubscription {
        CameraSubscription {
            state: Rc::clone(&self.state),
        }
    }

    /// Frame callback. Runs `pass` once if a pass is pending, else does nothing.
    ///
    /// The state drops back to Idle before `pass` runs, so a camera change
    /// raised while the pass is running arms the next frame instead of being lost.
    pub fn run_frame<T>(&self, pass: impl FnOnce() -> T) -> Option<T> {
        if self.state.replace(PassState::Idle) == PassState::Idle {
            return None;
        }
        Some(pass())
    }
}

impl Default for PassScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera-change listener returned to the caller. Cloning it shares the same scheduler.
#[derive(Clone, Debug)]
pub struct CameraSubscription {
    state: Rc<Cell<PassState>>,
}

impl CameraSubscription {
    /// The camera moved; re-evaluate labels on the next frame.
    pub fn notify(&self) -> bool {
        arm(&self.state)
    }

    pub fn is_pending(&self) -> bool {
        self.state.get() == PassState::Pending
    }
}

fn arm(state: &Cell<PassState>) -> bool {
    match state.get() {
        PassState::Idle => {
            state.set(PassState::Pending);
            true
        }
        PassState::Pending => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn many_notifications_make_one_pass() {
        let sched = PassScheduler::new();
        let sub = sched.subscribe();

        assert!(sub.notify());
        assert!(!sub.notify());
        assert!(!sub.notify());
        assert_eq!(sched.state(), PassState::Pending);

        let mut runs = 0;
        sched.run_frame(|| runs += 1);
        sched.run_frame(|| runs += 1);
        assert_eq!(runs, 1);
        assert_eq!(sched.state(), PassState::Idle);
    }

    #[test]
    fn idle_frame_does_nothing() {
        let sched = PassScheduler::new();
        assert_eq!(sched.run_frame(|| 7), None);
    }

    #[test]
    fn pass_result_is_returned() {
        let sched = PassScheduler::new();
        sched.request();
        assert_eq!(sched.run_frame(|| 7), Some(7));
    }

    #[test]
    fn notify_during_pass_arms_next_frame() {
        let sched = PassScheduler::new();
        let sub = sched.subscribe();
        sub.notify();

        sched.run_frame(|| {
            assert!(!sub.is_pending());
            sub.notify();
        });
        assert!(sched.is_pending());
        assert_eq!(sched.run_frame(|| ()), Some(()));
        assert!(!sched.is_pending());
    }

    #[test]
    fn cloned_subscriptions_share_state() {
        let sched = PassScheduler::new();
        let a = sched.subscribe();
        let b = a.clone();
        a.notify();
        assert!(b.is_pending());
        assert!(!sched.request());
    }
}
