//! GCD-backed executor.

use std::ffi::c_void;
use std::time::Duration;

use tracing::warn;

use crate::executor::{Executor, Task, Timer};

#[link(name = "System", kind = "dylib")]
extern "C" {
    fn dispatch_async_f(queue: *const c_void, context: *mut c_void, work: extern "C" fn(*mut c_void));
    fn dispatch_after_f(
        when: u64,
        queue: *const c_void,
        context: *mut c_void,
        work: extern "C" fn(*mut c_void),
    );
    fn dispatch_time(when: u64, delta: i64) -> u64;
    fn pthread_main_np() -> i32;

    // dispatch_get_main_queue() is a macro over this symbol
    #[link_name = "_dispatch_main_q"]
    static DISPATCH_MAIN_QUEUE: c_void;
}

const DISPATCH_TIME_NOW: u64 = 0;

extern "C" fn trampoline(context: *mut c_void) {
    let task: Box<Task> = unsafe { Box::from_raw(context as *mut Task) };
    task();
}

fn main_queue() -> *const c_void {
    unsafe { &DISPATCH_MAIN_QUEUE as *const c_void }
}

pub fn is_main_thread() -> bool {
    unsafe { pthread_main_np() == 1 }
}

/// Runs tasks on the main dispatch queue, which the AppKit run loop drains
#[derive(Debug, Default)]
pub struct GcdExecutor;

impl Executor for GcdExecutor {
    fn dispatch(&self, task: Task) {
        let raw = Box::into_raw(Box::new(task));
        unsafe { dispatch_async_f(main_queue(), raw as *mut c_void, trampoline) };
    }

    fn dispatch_after(&self, delay: Duration, task: Task) -> Timer {
        let (timer, guarded) = Timer::guard(task);
        let nanos = i64::try_from(delay.as_nanos()).unwrap_or(i64::MAX);
        let raw = Box::into_raw(Box::new(guarded));
        unsafe {
            let when = dispatch_time(DISPATCH_TIME_NOW, nanos);
            dispatch_after_f(when, main_queue(), raw as *mut c_void, trampoline);
        }
        timer
    }

    fn spawn_background(&self, task: Task) {
        if let Err(e) = std::thread::Builder::new()
            .name("mactools-worker".to_string())
            .spawn(task)
        {
            warn!(error = %e, "Failed to spawn worker thread");
        }
    }

    fn is_main_thread(&self) -> bool {
        is_main_thread()
    }
}
