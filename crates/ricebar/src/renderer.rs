//! A renderer that draws by logging.
//!
//! Every widget's `watch` marks it dirty. On each frame the renderer takes
//! a snapshot of the dirty widgets and logs the ones whose text changed.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use ricebar_core::event_loop::{EventLoop, TimerHandle};
use ricebar_runtime::Subscription;
use ricebar_widgets::Panel;
use tracing::{info, trace};
use web_time::Duration;

use crate::error::Result;

/// One widget whose rendering changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub widget: &'static str,
    pub text: String,
}

struct RendererInner {
    panel: Rc<Panel>,
    dirty: Rc<RefCell<BTreeSet<usize>>>,
    shown: RefCell<Vec<Option<String>>>,
    subscriptions: RefCell<Vec<Subscription>>,
    frames: Cell<u64>,
}

impl RendererInner {
    fn flush(&self) -> Vec<Frame> {
        let dirty = std::mem::take(&mut *self.dirty.borrow_mut());
        if dirty.is_empty() {
            return Vec::new();
        }
        self.frames.set(self.frames.get() + 1);
        let widgets = self.panel.widgets();
        let mut shown = self.shown.borrow_mut();
        let mut frames = Vec::new();
        for index in dirty {
            let Some(widget) = widgets.get(index) else {
                continue;
            };
            let text = widget.snapshot();
            if shown[index].as_deref() == Some(text.as_str()) {
                trace!(widget = widget.name(), "unchanged after notification");
                continue;
            }
            shown[index] = Some(text.clone());
            frames.push(Frame {
                widget: widget.name(),
                text,
            });
        }
        frames
    }
}

/// Logs widget changes once per frame.
pub struct HeadlessRenderer {
    inner: Rc<RendererInner>,
    timer: RefCell<Option<TimerHandle>>,
}

impl HeadlessRenderer {
    /// Watch every widget of `panel`. Everything starts dirty.
    #[must_use]
    pub fn new(panel: Rc<Panel>) -> Self {
        let widgets = panel.widgets();
        let count = widgets.len();
        let dirty = Rc::new(RefCell::new((0..count).collect::<BTreeSet<_>>()));
        let mut subscriptions = Vec::new();
        for (index, widget) in widgets.iter().enumerate() {
            let dirty = Rc::clone(&dirty);
            subscriptions.extend(widget.watch(Rc::new(move || {
                dirty.borrow_mut().insert(index);
            })));
        }
        drop(widgets);
        Self {
            inner: Rc::new(RendererInner {
                panel,
                dirty,
                shown: RefCell::new(vec![None; count]),
                subscriptions: RefCell::new(subscriptions),
                frames: Cell::new(0),
            }),
            timer: RefCell::new(None),
        }
    }

    /// Flush on the loop every `frame`.
    pub fn start(&self, ev: &EventLoop, frame: Duration) -> Result<()> {
        let weak: Weak<RendererInner> = Rc::downgrade(&self.inner);
        let timer = ev.interval(frame, move || {
            if let Some(inner) = weak.upgrade() {
                log_frames(&inner.flush());
            }
        })?;
        if let Some(previous) = self.timer.borrow_mut().replace(timer) {
            previous.cancel();
        }
        Ok(())
    }

    /// Snapshot the dirty widgets now and return those that changed.
    pub fn flush(&self) -> Vec<Frame> {
        self.inner.flush()
    }

    /// Flush and log.
    pub fn render(&self) {
        log_frames(&self.flush());
    }

    /// Frames that found at least one dirty widget.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }

    /// Stop the frame timer and every watch.
    pub fn stop(&self) {
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.cancel();
        }
        for mut sub in self.inner.subscriptions.borrow_mut().drain(..) {
            sub.unsubscribe();
        }
    }
}

impl Drop for HeadlessRenderer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn log_frames(frames: &[Frame]) {
    for frame in frames {
        info!(widget = frame.widget, value = %frame.text, "render");
    }
}
