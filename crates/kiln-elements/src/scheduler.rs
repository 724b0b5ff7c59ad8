//! Frame-coalescing schedulers
//!
//! A scheduler wraps one callback. Values scheduled during the same cycle
//! collapse into a single callback invocation on the next animation frame.
//! State is reset before the callback runs, so scheduling from inside the
//! callback starts a fresh cycle on the following frame.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::frame::FrameLoop;

struct SchedulerInner<T> {
    callback: Option<Box<dyn Fn(T)>>,
    frames: FrameLoop,
    pending: RefCell<Option<T>>,
}

impl<T> SchedulerInner<T> {
    fn fire(&self) {
        let value = self.pending.borrow_mut().take();
        if let Some(value) = value {
            self.invoke(value);
        }
    }

    fn invoke(&self, value: T) {
        if let Some(callback) = &self.callback {
            callback(value);
        }
    }
}

/// Last-value-wins scheduler
pub struct Scheduler<T> {
    inner: Rc<SchedulerInner<T>>,
}

impl<T: 'static> fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

/// A scheduler with no callback; firing does nothing
impl<T: 'static> Default for Scheduler<T> {
    fn default() -> Self {
        Self::build(None, FrameLoop::current())
    }
}

impl<T: 'static> Scheduler<T> {
    /// Scheduler on the thread's default frame loop
    pub fn new(callback: impl Fn(T) + 'static) -> Self {
        Self::with_frame_loop(FrameLoop::current(), callback)
    }

    pub fn with_frame_loop(frames: FrameLoop, callback: impl Fn(T) + 'static) -> Self {
        Self::build(Some(Box::new(callback)), frames)
    }

    fn build(callback: Option<Box<dyn Fn(T)>>, frames: FrameLoop) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                callback,
                frames,
                pending: RefCell::new(None),
            }),
        }
    }

    /// Record `value` as the latest and request a frame unless one is pending
    pub fn schedule(&self, value: T) {
        let previous = self.inner.pending.borrow_mut().replace(value);
        if previous.is_none() {
            let weak: Weak<SchedulerInner<T>> = Rc::downgrade(&self.inner);
            self.inner.frames.request(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.fire();
                }
            });
        }
    }

    /// Invoke the callback now, bypassing the frame
    pub fn call(&self, value: T) {
        self.inner.invoke(value);
    }

    /// Whether a value is waiting for the next frame
    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }
}

/// Input of an [`ArrayScheduler`]
#[derive(Debug, Clone, PartialEq)]
pub enum Batch<T> {
    /// Drop everything accumulated so far
    Reset,
    Item(T),
    Items(Vec<T>),
}

/// Output of an [`ArrayScheduler`]
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery<T> {
    /// A reset with nothing after it
    Reset,
    Items(Vec<T>),
}

#[derive(Debug)]
struct Accumulator<T> {
    reset: bool,
    items: Vec<T>,
}

impl<T> Default for Accumulator<T> {
    fn default() -> Self {
        Self { reset: false, items: Vec::new() }
    }
}

impl<T> Accumulator<T> {
    fn push(&mut self, batch: Batch<T>) {
        match batch {
            Batch::Reset => {
                self.items.clear();
                self.reset = true;
            }
            Batch::Item(item) => self.items.push(item),
            Batch::Items(items) => self.items.extend(items),
        }
    }

    fn take(&mut self) -> Delivery<T> {
        let Accumulator { reset, items } = std::mem::take(self);
        if reset && items.is_empty() {
            Delivery::Reset
        } else {
            Delivery::Items(items)
        }
    }
}

/// Accumulating scheduler: items scheduled in one cycle are delivered together
pub struct ArrayScheduler<T> {
    accumulator: Rc<RefCell<Accumulator<T>>>,
    callback: Rc<dyn Fn(Delivery<T>)>,
    trigger: Scheduler<()>,
}

impl<T> fmt::Debug for ArrayScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayScheduler")
            .field("pending", &self.trigger.is_pending())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> ArrayScheduler<T> {
    pub fn new(callback: impl Fn(Delivery<T>) + 'static) -> Self {
        Self::with_frame_loop(FrameLoop::current(), callback)
    }

    pub fn with_frame_loop(frames: FrameLoop, callback: impl Fn(Delivery<T>) + 'static) -> Self {
        let accumulator: Rc<RefCell<Accumulator<T>>> = Rc::default();
        let callback: Rc<dyn Fn(Delivery<T>)> = Rc::new(callback);

        let acc = Rc::downgrade(&accumulator);
        let cb = Rc::clone(&callback);
        let trigger = Scheduler::with_frame_loop(frames, move |()| {
            let Some(acc) = acc.upgrade() else {
                return;
            };
            let delivery = acc.borrow_mut().take();
            cb(delivery);
        });

        Self { accumulator, callback, trigger }
    }

    pub fn schedule(&self, batch: Batch<T>) {
        self.accumulator.borrow_mut().push(batch);
        self.trigger.schedule(());
    }

    /// Deliver one batch now, bypassing the accumulator
    pub fn call(&self, batch: Batch<T>) {
        let delivery = match batch {
            Batch::Reset => Delivery::Reset,
            Batch::Item(item) => Delivery::Items(vec![item]),
            Batch::Items(items) => Delivery::Items(items),
        };
        (self.callback)(delivery);
    }

    pub fn is_pending(&self) -> bool {
        self.trigger.is_pending()
    }
}

/// Coalesces "an observed attribute changed" notifications into one
/// flush per frame
pub struct AttributeScheduler {
    inner: Scheduler<()>,
}

impl fmt::Debug for AttributeScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeScheduler")
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl AttributeScheduler {
    pub fn new(flush: impl Fn() + 'static) -> Self {
        Self::with_frame_loop(FrameLoop::current(), flush)
    }

    pub fn with_frame_loop(frames: FrameLoop, flush: impl Fn() + 'static) -> Self {
        Self { inner: Scheduler::with_frame_loop(frames, move |()| flush()) }
    }

    pub fn schedule(&self) {
        self.inner.schedule(());
    }

    pub fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }
}
