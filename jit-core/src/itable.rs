/// One row of a class's interface-method dispatch table.
///
/// `hash` identifies the interface method being dispatched (the signature
/// hash compared at each `invokeinterface` call site); `slot_index` is the
/// concrete method's index into the implementing class's vtable. The
/// resolver stub (`jit_x86::stubs::emit_itable_resolver_stub`) receives a
/// slice of these sorted ascending by `hash` and binary-searches it at
/// class-load time to build a specialized stub — the search itself never
/// runs at call time, only the generated code does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItableEntry {
    pub hash: u32,
    pub slot_index: u32,
}

impl ItableEntry {
    pub fn new(hash: u32, slot_index: u32) -> Self {
        Self { hash, slot_index }
    }
}

/// Checks the precondition the resolver stub's caller must uphold: sorted
/// ascending by `hash`, at least two entries.
pub fn is_valid_itable(table: &[ItableEntry]) -> bool {
    table.len() >= 2 && table.windows(2).all(|w| w[0].hash < w[1].hash)
}
