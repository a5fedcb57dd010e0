//! `muon-aml` --- a standalone, `no_std` AML two-operand execution core.
//!
//! This crate implements the dual-operand slice of an AML (ACPI Machine
//! Language) interpreter: the opcode dispatch table for two-argument
//! opcodes, the operand resolution protocol that type-checks and
//! implicitly converts raw stack entries into the kinds each opcode
//! requires, the opcode semantics themselves (arithmetic, comparison,
//! divide, concatenation, index, notify, acquire/wait), and the result
//! distribution that writes result objects to targets and produces the
//! implicit return value.
//!
//! The surrounding interpreter --- bytecode walking, namespace management,
//! method invocation, the store primitive, and the OS synchronization
//! layer --- is reached through the [`WalkContext`] trait. The core holds
//! no global state and performs no blocking: a call into [`execute`]
//! either completes with an optional return object or fails with an
//! [`ExecError`], leaving the caller's state untouched.
//!
//! # Usage
//!
//! ```ignore
//! let mut operands = [
//!     Operand::Value(ObjectRef::new(Object::Integer(10))),
//!     Operand::Value(ObjectRef::new(Object::Integer(3))),
//!     Operand::Value(ObjectRef::new(Object::Reference(Reference::Local(0)))),
//! ];
//! let ret = execute(opcode::ADD, &mut operands, &mut ctx, &ExecConfig::default())?;
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod context;
pub mod convert;
pub mod dyadic;
pub mod object;
pub mod optable;
pub mod resolve;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export key types at crate root for convenience.
pub use context::{ExecConfig, IntegerWidth, SyncOutcome, WalkContext};
pub use dyadic::execute;
pub use object::{
    EventObject, MutexObject, NodeHandle, Object, ObjectRef, ObjectType, Operand, Reference,
    RegionFieldHandle, SyncHandle, TableHandle,
};
pub use optable::{ArgType, OpInfo, opcode};

use optable::ArgType as NeededType;

/// Errors surfaced by the execution core.
///
/// Every error returns synchronously to the dispatcher; the core never
/// logs, retries, or suppresses. Synchronization timeout is *not* an
/// error --- `Acquire`/`Wait` fold it into their boolean return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// An operand could not satisfy its required type, even after the
    /// mandated implicit conversions. Aborts the offending method, not
    /// the interpreter.
    OperandType {
        /// The opcode whose operand resolution failed.
        opcode: u16,
        /// Zero-based position of the offending operand on the stack.
        position: usize,
        /// The type the argument table required at that position.
        needed: NeededType,
        /// The type actually found after dereferencing.
        found: ObjectType,
    },
    /// Divide or Mod with a zero divisor. Fatal to the running method;
    /// the quotient is never silently zeroed.
    DivideByZero,
    /// An index was outside its package or buffer, or a string
    /// conversion exceeded the configured length ceiling.
    LimitExceeded,
    /// A collaborator failed to allocate an object.
    OutOfMemory,
    /// The opcode is not in the two-operand dispatch table. This is a
    /// dispatcher inconsistency, not malformed bytecode.
    BadOpcode(u16),
    /// The operand stack did not match the shape the dispatch table
    /// promised (wrong length, target slot holding a plain value).
    /// Always a caller bug.
    Internal,
}
