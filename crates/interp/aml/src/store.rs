//! Result distribution: targets first, then the implicit return.
//!
//! A handler produces zero, one, or two result objects. Each one is
//! handed to the external store primitive for the matching target (in
//! fixed AML argument order --- for `Divide`, remainder then quotient)
//! and then either returned to the dispatcher as the implicit return
//! value or dropped. Move semantics make the ownership rule structural:
//! a result cannot be both returned and released, and a result that is
//! neither stored nor returned is released when it goes out of scope.

use crate::ExecError;
use crate::context::WalkContext;
use crate::object::{ObjectRef, Operand};
use crate::optable::{OpInfo, SOURCE_OPERANDS};

/// Result objects produced by one opcode execution.
#[derive(Debug)]
pub enum ExecResults {
    /// No result object (`Notify`).
    None,
    /// A single result, stored to the target (if the opcode has one)
    /// and used as the implicit return.
    One(ObjectRef),
    /// Two results in target order. Only `Divide` produces this shape:
    /// `first` is the remainder, `second` the quotient; the quotient
    /// doubles as the implicit return.
    Two {
        /// Result for the first target.
        first: ObjectRef,
        /// Result for the second target; also the implicit return.
        second: ObjectRef,
    },
}

/// Stores each result to its target and returns the implicit return
/// value, if the opcode defines one.
///
/// `operands` is the full resolved operand slice; targets are the
/// entries past the two sources.
///
/// # Errors
///
/// Propagates store-primitive failures, and returns
/// [`ExecError::Internal`] if the result count does not match the
/// table shape.
pub(crate) fn distribute(
    op: &OpInfo,
    results: ExecResults,
    operands: &[Operand],
    ctx: &mut dyn WalkContext,
) -> Result<Option<ObjectRef>, ExecError> {
    let targets = operands
        .get(SOURCE_OPERANDS..)
        .ok_or(ExecError::Internal)?;
    if targets.len() != op.targets {
        return Err(ExecError::Internal);
    }

    match results {
        ExecResults::None => {
            if op.targets != 0 || op.returns {
                return Err(ExecError::Internal);
            }
            Ok(None)
        }
        ExecResults::One(result) => {
            if op.targets > 1 {
                return Err(ExecError::Internal);
            }
            if let Some(target) = targets.first() {
                ctx.store(&result, target)?;
            }
            if op.returns {
                Ok(Some(result))
            } else {
                // Not the return value and already stored: this handle
                // drops here, releasing the core's ownership.
                Ok(None)
            }
        }
        ExecResults::Two { first, second } => {
            if op.targets != 2 || !op.returns {
                return Err(ExecError::Internal);
            }
            ctx.store(&first, &targets[0])?;
            ctx.store(&second, &targets[1])?;
            Ok(Some(second))
        }
    }
}
