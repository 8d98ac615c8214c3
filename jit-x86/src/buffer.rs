//! Executable code buffer: an anonymous `mmap`'d region the encoder writes
//! into and the runtime later jumps into.
//!
//! Mirrors the teacher's own host code buffer almost verbatim in shape
//! (mmap on construction, `mprotect` to flip between writable and
//! executable, `munmap` on drop) but every fallible path here returns
//! [`EmitError`] instead of `io::Result`, since the emission pipeline wants
//! one error type end to end.

use std::io;

use log::debug;

use jit_core::EmitError;

pub struct CodeBuffer {
    ptr: *mut u8,
    size: usize,
    offset: usize,
    executable: bool,
}

unsafe impl Send for CodeBuffer {}

const DEFAULT_SIZE: usize = 64 * 1024;

impl CodeBuffer {
    pub fn new(size: usize) -> Result<Self, EmitError> {
        let size = round_up_to_page(size.max(1));
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(EmitError::ArenaExhausted {
                requested: size,
                remaining: 0,
            });
        }
        debug!("mapped {size} byte code buffer at {ptr:p}");
        Ok(Self {
            ptr: ptr as *mut u8,
            size,
            offset: 0,
            executable: false,
        })
    }

    pub fn with_default_size() -> Result<Self, EmitError> {
        Self::new(DEFAULT_SIZE)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.size
    }

    pub fn remaining(&self) -> usize {
        self.size - self.offset
    }

    pub fn base_ptr(&self) -> *const u8 {
        self.ptr
    }

    pub fn current_ptr(&self) -> *const u8 {
        unsafe { self.ptr.add(self.offset) }
    }

    pub fn ptr_at(&self, offset: usize) -> *const u8 {
        assert!(offset <= self.size);
        unsafe { self.ptr.add(offset) }
    }

    pub fn set_offset(&mut self, offset: usize) {
        assert!(offset <= self.size);
        self.offset = offset;
    }

    fn ensure_capacity(&self, n: usize) -> Result<(), EmitError> {
        if self.offset + n > self.size {
            return Err(EmitError::BufferOverflow {
                offset: self.offset,
                requested: n,
                capacity: self.size,
            });
        }
        Ok(())
    }

    pub fn emit_u8(&mut self, val: u8) -> Result<(), EmitError> {
        self.ensure_capacity(1)?;
        unsafe { *self.ptr.add(self.offset) = val };
        self.offset += 1;
        Ok(())
    }

    pub fn emit_bytes(&mut self, data: &[u8]) -> Result<(), EmitError> {
        self.ensure_capacity(data.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(self.offset), data.len());
        }
        self.offset += data.len();
        Ok(())
    }

    pub fn emit_u32(&mut self, val: u32) -> Result<(), EmitError> {
        self.emit_bytes(&val.to_le_bytes())
    }

    pub fn emit_i32(&mut self, val: i32) -> Result<(), EmitError> {
        self.emit_u32(val as u32)
    }

    /// Overwrites 4 bytes already written at `offset`, e.g. to backpatch a
    /// branch displacement. Does not move the write cursor.
    pub fn patch_u32(&mut self, offset: usize, val: u32) {
        assert!(offset + 4 <= self.size);
        unsafe {
            std::ptr::copy_nonoverlapping(val.to_le_bytes().as_ptr(), self.ptr.add(offset), 4);
        }
    }

    pub fn patch_u8(&mut self, offset: usize, val: u8) {
        assert!(offset < self.size);
        unsafe { *self.ptr.add(offset) = val };
    }

    pub fn read_u32(&self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.size);
        let mut bytes = [0u8; 4];
        unsafe {
            std::ptr::copy_nonoverlapping(self.ptr.add(offset), bytes.as_mut_ptr(), 4);
        }
        u32::from_le_bytes(bytes)
    }

    pub fn set_executable(&mut self) -> io::Result<()> {
        let rc = unsafe {
            libc::mprotect(
                self.ptr as *mut libc::c_void,
                self.size,
                libc::PROT_READ | libc::PROT_EXEC,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        debug!("code buffer at {:p} now executable ({} bytes emitted)", self.ptr, self.offset);
        self.executable = true;
        Ok(())
    }

    pub fn set_writable(&mut self) -> io::Result<()> {
        let rc = unsafe {
            libc::mprotect(
                self.ptr as *mut libc::c_void,
                self.size,
                libc::PROT_READ | libc::PROT_WRITE,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        self.executable = false;
        Ok(())
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.offset) }
    }
}

impl Drop for CodeBuffer {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr as *mut libc::c_void, self.size);
        }
    }
}

fn round_up_to_page(n: usize) -> usize {
    let page = page_size();
    (n + page - 1) & !(page - 1)
}

fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}
