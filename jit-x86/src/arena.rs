//! The shared executable-page arena every compilation writes freshly
//! emitted code into, plus the scoped lock guarding it.
//!
//! Only one compilation may hold the jit-text lock at a time; the original
//! runtime's `jit_text_lock`/`jit_text_unlock` pair was a manually-paired
//! call, which is exactly the kind of thing an RAII guard exists to replace
//! so the unlock still runs if the holder panics mid-emission.

use std::sync::{Mutex, MutexGuard};

use jit_core::EmitError;

use crate::buffer::CodeBuffer;

pub struct JitTextArena {
    buffer: Mutex<CodeBuffer>,
}

impl JitTextArena {
    pub fn new(size: usize) -> Result<Self, EmitError> {
        Ok(Self {
            buffer: Mutex::new(CodeBuffer::new(size)?),
        })
    }

    /// Acquires exclusive access to the arena's code buffer for the
    /// duration of one compilation.
    pub fn lock(&self) -> JitTextGuard<'_> {
        let guard = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        JitTextGuard { guard }
    }
}

pub struct JitTextGuard<'a> {
    guard: MutexGuard<'a, CodeBuffer>,
}

impl<'a> std::ops::Deref for JitTextGuard<'a> {
    type Target = CodeBuffer;
    fn deref(&self) -> &CodeBuffer {
        &self.guard
    }
}

impl<'a> std::ops::DerefMut for JitTextGuard<'a> {
    fn deref_mut(&mut self) -> &mut CodeBuffer {
        &mut self.guard
    }
}
