//! Animation frames
//!
//! A host-driven stand-in for `requestAnimationFrame`. Callbacks queue up
//! until the host runs a frame; a frame only runs callbacks that were
//! queued before it began, so anything requested from inside a callback
//! waits for the next frame.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type FrameCallback = Box<dyn FnOnce()>;

/// Frame callback queue (cheap to clone, clones share the queue)
#[derive(Clone, Default)]
pub struct FrameLoop {
    queue: Rc<RefCell<Vec<FrameCallback>>>,
    frames: Rc<Cell<u64>>,
}

impl fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLoop")
            .field("pending", &self.pending())
            .field("frames", &self.frames.get())
            .finish()
    }
}

thread_local! {
    static FRAME_LOOP: FrameLoop = FrameLoop::new();
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// The thread's default loop
    pub fn current() -> Self {
        FRAME_LOOP.with(FrameLoop::clone)
    }

    /// Queue a callback for the next frame
    pub fn request(&self, callback: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push(Box::new(callback));
    }

    /// Callbacks waiting for the next frame
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }

    /// Run one frame, returns the number of callbacks invoked
    pub fn run_frame(&self) -> usize {
        let callbacks = std::mem::take(&mut *self.queue.borrow_mut());
        self.frames.set(self.frames.get() + 1);

        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        if count > 0 {
            tracing::trace!("Frame {} ran {} callbacks", self.frames.get(), count);
        }
        count
    }

    /// Run frames until nothing is queued or `max_frames` is reached.
    ///
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.pending() > 0 {
            self.run_frame();
            frames += 1;
        }
        frames
    }
}

/// Queue a callback on the thread's default loop
pub fn request_animation_frame(callback: impl FnOnce() + 'static) {
    FrameLoop::current().request(callback);
}

/// Run one frame of the thread's default loop
pub fn run_frame() -> usize {
    FrameLoop::current().run_frame()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callbacks_wait_for_frame() {
        let frames = FrameLoop::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        frames.request(move || h.set(h.get() + 1));

        assert_eq!(hits.get(), 0);
        assert_eq!(frames.run_frame(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(frames.run_frame(), 0);
    }

    #[test]
    fn test_nested_request_runs_next_frame() {
        let frames = FrameLoop::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let inner_frames = frames.clone();
        let o = Rc::clone(&order);
        frames.request(move || {
            o.borrow_mut().push("outer");
            let o = Rc::clone(&o);
            inner_frames.request(move || o.borrow_mut().push("inner"));
        });

        frames.run_frame();
        assert_eq!(*order.borrow(), vec!["outer"]);
        frames.run_frame();
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
        assert_eq!(frames.frame_count(), 2);
    }

    #[test]
    fn test_run_until_idle_is_bounded() {
        fn forever(frames: FrameLoop) {
            let next = frames.clone();
            frames.request(move || forever(next));
        }
        let frames = FrameLoop::new();
        forever(frames.clone());
        assert_eq!(frames.run_until_idle(5), 5);
        assert_eq!(frames.pending(), 1);
    }

    #[test]
    fn test_default_loop_is_per_thread() {
        request_animation_frame(|| {});
        assert_eq!(FrameLoop::current().pending(), 1);
        std::thread::spawn(|| assert_eq!(FrameLoop::current().pending(), 0))
            .join()
            .unwrap();
        assert_eq!(run_frame(), 1);
    }
}
