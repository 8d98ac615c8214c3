/// Per-compilation debug toggles. Passed explicitly to whichever
/// emitter/stub function needs it rather than read from an environment
/// variable or global: this layer has no CLI or process-wide config of its
/// own.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    /// Emits the redzone guard magic (`0xDEADBEEF`) below the frame and a
    /// check that it's intact on the way out, catching stack-layout bugs
    /// in the caller.
    pub stack_debug: bool,
    /// Emits the final linear-scan equality check at the bottom of a
    /// generated itable binary search, aborting via the resolver's error
    /// path if the search landed on the wrong hash. Off in release stubs
    /// since the search is exhaustively tested once at build time.
    pub itable_debug_checks: bool,
}

impl EmitOptions {
    pub fn release() -> Self {
        Self::default()
    }

    pub fn debug() -> Self {
        Self {
            stack_debug: true,
            itable_debug_checks: true,
        }
    }
}
