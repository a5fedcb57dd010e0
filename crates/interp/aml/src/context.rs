//! Collaborator boundary and interpreter configuration.
//!
//! Everything the execution core needs from the surrounding interpreter
//! comes through [`WalkContext`]: dereferencing stack entries, the
//! store primitive, notification queueing, and the OS synchronization
//! layer. The core calls these synchronously and never blocks itself;
//! any actual waiting happens inside the context implementation.

use crate::ExecError;
use crate::object::{EventObject, MutexObject, NodeHandle, ObjectRef, Operand};

/// Width of AML integers for the running definition block.
///
/// Tables with `ComplianceRevision < 2` use 32-bit integers; later
/// revisions use 64-bit. The width decides wraparound masking and the
/// all-ones "true"/"timed out" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    /// 32-bit integers (ACPI 1.0 definition blocks).
    Dword,
    /// 64-bit integers (ACPI 2.0 and later).
    Qword,
}

impl IntegerWidth {
    /// The all-ones value at this width: logical true, and the
    /// `Acquire`/`Wait` timeout indicator.
    #[must_use]
    pub const fn ones(self) -> u64 {
        match self {
            Self::Dword => 0xFFFF_FFFF,
            Self::Qword => u64::MAX,
        }
    }

    /// Masks a value to this width. All arithmetic results pass
    /// through this, giving fixed-width unsigned wraparound.
    #[must_use]
    pub const fn mask(self, value: u64) -> u64 {
        match self {
            Self::Dword => value & 0xFFFF_FFFF,
            Self::Qword => value,
        }
    }

    /// Number of bytes in an integer at this width.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Dword => 4,
            Self::Qword => 8,
        }
    }

    /// Number of bits in an integer at this width.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Dword => 32,
            Self::Qword => 64,
        }
    }
}

/// Tunable constants of the execution core.
///
/// Both values are ACPI-revision dependent, so they are carried as
/// configuration rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecConfig {
    /// Integer width of the running definition block.
    pub integer_width: IntegerWidth,
    /// Ceiling, in bytes, on strings produced by implicit conversion
    /// and `ToString`. Exceeding it is [`ExecError::LimitExceeded`].
    pub max_string_conversion: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            integer_width: IntegerWidth::Qword,
            max_string_conversion: 200,
        }
    }
}

/// Outcome of an `Acquire` or `Wait` operation.
///
/// Timeout is a first-class outcome, not an error: the opcodes return
/// all-ones to the AML program when it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The mutex was acquired / the event was signaled in time.
    Completed,
    /// The timeout expired first.
    TimedOut,
}

/// The per-walk execution context supplied by the surrounding
/// interpreter.
///
/// One walk runs on one logical thread and calls into the core
/// non-reentrantly; independent walks may run concurrently, each with
/// its own context. Implementations own all blocking, namespace
/// access, and cross-walk serialization.
pub trait WalkContext {
    /// Fully dereferences a stack entry to a concrete object.
    ///
    /// Resolves named handles through the namespace, reads `Local`/
    /// `Arg` slots from the method frame, and chases references
    /// (including `Index`) until a value remains. Entries that are
    /// already plain values must come back as the same object, not a
    /// copy --- the resolver's no-coercion guarantee depends on it.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the entry cannot be resolved (dangling
    /// handle, empty `Local`, dereference of the debug object).
    fn resolve_to_value(&mut self, operand: &Operand) -> Result<ObjectRef, ExecError>;

    /// The store primitive: writes `value` to the location designated
    /// by `target`, applying the store-side conversion rules of the
    /// external interpreter.
    ///
    /// The value is borrowed; the implementation clones the handle if
    /// the destination retains it.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the target is not writable or the
    /// store-side conversion fails.
    fn store(&mut self, value: &ObjectRef, target: &Operand) -> Result<(), ExecError>;

    /// Queues a device notification.
    ///
    /// Delivery is deferred until the current method context unwinds;
    /// running handlers synchronously here would re-enter method
    /// execution mid-opcode.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::OutOfMemory`] if the notification cannot
    /// be queued.
    fn enqueue_notify(&mut self, node: NodeHandle, value: u64) -> Result<(), ExecError>;

    /// Acquires an AML mutex, waiting at most `timeout_ms`
    /// milliseconds (`0xFFFF` means wait forever).
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] only for genuine failures; expiry of the
    /// timeout is the [`SyncOutcome::TimedOut`] success case.
    fn acquire_mutex(&mut self, mutex: &MutexObject, timeout_ms: u16)
    -> Result<SyncOutcome, ExecError>;

    /// Waits for an AML event, with the same timeout contract as
    /// [`WalkContext::acquire_mutex`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] only for genuine failures.
    fn wait_event(&mut self, event: &EventObject, timeout_ms: u64)
    -> Result<SyncOutcome, ExecError>;
}
