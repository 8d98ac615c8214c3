//! Verifies the generated itable binary-search stub by independently
//! re-deriving the jump targets from the `jb`/`ja` displacements the
//! synthesizer emitted and checking each one lands on a leaf node whose
//! comparison immediate matches the expected table entry.

use jit_core::{ItableEntry, Reg};
use jit_x86::buffer::CodeBuffer;
use jit_x86::options::EmitOptions;
use jit_x86::stubs;

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

#[test]
fn itable_three_entries_binary_search_structure() {
    let mut buf = CodeBuffer::with_default_size().unwrap();
    let table = [ItableEntry::new(10, 0), ItableEntry::new(20, 1), ItableEntry::new(30, 2)];
    stubs::emit_itable_resolver_stub(&mut buf, &table, Reg::Ecx, EmitOptions::release(), 0).unwrap();

    let bytes = buf.as_slice();

    // Root node compares against the midpoint entry (index 1, hash 20).
    assert_eq!(bytes[0], 0x83);
    assert_eq!(bytes[1], 0xF8); // ModRM: mod=11 reg=7(cmp) rm=0(eax)
    assert_eq!(bytes[2] as i64, 20);

    assert_eq!(bytes[3], 0x0F);
    assert_eq!(bytes[4], 0x82); // jb -> left leaf (hash 10)
    let jb_disp = read_i32(bytes, 5);
    let left_entry = (3 + 6) as i64 + jb_disp as i64;

    assert_eq!(bytes[9], 0x0F);
    assert_eq!(bytes[10], 0x87); // ja -> right leaf (hash 30)
    let ja_disp = read_i32(bytes, 11);
    let right_entry = (9 + 6) as i64 + ja_disp as i64;

    // Each leaf does cmp; add slot_index*4, vtable_reg; jmp [vtable_reg].
    let left_entry = left_entry as usize;
    assert_eq!(bytes[left_entry], 0x83);
    assert_eq!(bytes[left_entry + 2] as i64, 10);
    assert_eq!(bytes[left_entry + 3], 0x83); // add imm8
    assert_eq!(bytes[left_entry + 5] as i64, 0); // slot_index 0 * word size

    let right_entry = right_entry as usize;
    assert_eq!(bytes[right_entry], 0x83);
    assert_eq!(bytes[right_entry + 2] as i64, 30);
    assert_eq!(bytes[right_entry + 3], 0x83);
    assert_eq!(bytes[right_entry + 5] as i64, 8); // slot_index 2 * word size
}

#[test]
fn itable_resolver_rejects_unsorted_or_short_tables() {
    // is_valid_itable is the precondition emit_itable_resolver_stub asserts;
    // exercise it directly since the stub itself would panic rather than
    // return an error for a malformed table.
    assert!(!jit_core::is_valid_itable(&[ItableEntry::new(5, 0)]));
    assert!(!jit_core::is_valid_itable(&[
        ItableEntry::new(20, 0),
        ItableEntry::new(10, 1),
    ]));
    assert!(jit_core::is_valid_itable(&[
        ItableEntry::new(10, 0),
        ItableEntry::new(20, 1),
    ]));
}
