use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces bursts of requests (scroll ticks) into at most one callback per
/// animation frame.
///
/// `request()` is cheap: it only schedules a `requestAnimationFrame` when none
/// is pending. The callback runs once per frame no matter how many requests
/// arrived in between.
pub struct FrameThrottle {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    scheduled: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameThrottle {
    pub fn new(on_frame: impl Fn() + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            scheduled: Cell::new(false),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let inner_cb = inner.clone();
        let cb = Closure::<dyn FnMut()>::new(move || {
            inner_cb.scheduled.set(false);
            inner_cb.raf_id.set(None);
            on_frame();
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    pub fn request(&self) {
        if self.inner.scheduled.get() {
            return;
        }
        let cb_ref = self.inner.callback.borrow();
        let (Some(cb), Some(window)) = (cb_ref.as_ref(), self.inner.window.as_ref()) else {
            return;
        };
        self.inner.scheduled.set(true);
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.inner.raf_id.set(Some(id)),
            Err(_) => self.inner.scheduled.set(false),
        }
    }
}

impl Drop for FrameThrottle {
    fn drop(&mut self) {
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        self.inner.scheduled.set(false);
        // Break the callback->inner reference cycle on teardown.
        self.inner.callback.borrow_mut().take();
    }
}
