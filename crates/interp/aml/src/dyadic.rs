//! Execution semantics for the two-operand opcode family.
//!
//! [`execute`] is the single inbound entry point: it looks up the
//! dispatch-table entry, resolves the operand stack, runs the handler,
//! and distributes the results. Handlers receive fully resolved
//! operands, so their type expectations are invariants rather than
//! checks --- a violated expectation is [`ExecError::Internal`], never a
//! bytecode-level failure.

use alloc::string::String;
use alloc::vec::Vec;

use crate::ExecError;
use crate::context::{ExecConfig, SyncOutcome, WalkContext};
use crate::convert;
use crate::object::{Object, ObjectRef, ObjectType, Operand, Reference};
use crate::optable::{self, ArgType, OpInfo, opcode};
use crate::resolve;
use crate::store::{self, ExecResults};

/// Executes one two-operand opcode against a resolved-in-place operand
/// stack.
///
/// `operands` holds the two source entries followed by the opcode's
/// target entries, in AML argument order. On success the slice holds
/// the resolved operands and the returned handle (if any) is the
/// opcode's implicit return value, already stored to its targets.
///
/// # Errors
///
/// [`ExecError::BadOpcode`] if the opcode is not a two-operand opcode,
/// [`ExecError::Internal`] if the slice does not match the table shape,
/// and whatever the resolver, handler, or store primitive raise.
pub fn execute(
    opcode: u16,
    operands: &mut [Operand],
    ctx: &mut impl WalkContext,
    cfg: &ExecConfig,
) -> Result<Option<ObjectRef>, ExecError> {
    let op = optable::lookup(opcode).ok_or(ExecError::BadOpcode(opcode))?;
    if operands.len() != op.args.len() {
        return Err(ExecError::Internal);
    }

    resolve::resolve_operands(op, operands, ctx, cfg)?;
    let results = (op.handler)(op, ctx, cfg, operands)?;
    store::distribute(op, results, operands, ctx)
}

/// Returns the resolved object at operand position `i`.
fn value_operand(operands: &[Operand], i: usize) -> Result<&ObjectRef, ExecError> {
    operands
        .get(i)
        .and_then(Operand::value)
        .ok_or(ExecError::Internal)
}

/// Returns the resolved integer at operand position `i`.
fn integer_operand(operands: &[Operand], i: usize) -> Result<u64, ExecError> {
    value_operand(operands, i)?
        .borrow()
        .as_integer()
        .ok_or(ExecError::Internal)
}

/// The opcode handlers wired into the dispatch table.
pub(crate) mod handlers {
    use super::*;
    use crate::context::IntegerWidth;

    /// Shared binary-math dispatch: Add, Subtract, Multiply, shifts,
    /// bitwise ops, Mod. Fixed-width unsigned semantics with
    /// wraparound; only Mod can fail (zero divisor).
    pub(crate) fn binary_math(
        op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let width = cfg.integer_width;
        let a = width.mask(integer_operand(operands, 0)?);
        let b = width.mask(integer_operand(operands, 1)?);
        let value = do_math_op(op.opcode, a, b, width)?;
        Ok(ExecResults::One(ObjectRef::new(Object::Integer(value))))
    }

    fn do_math_op(opcode_value: u16, a: u64, b: u64, width: IntegerWidth) -> Result<u64, ExecError> {
        let bits = u64::from(width.bits());
        let raw = match opcode_value {
            opcode::ADD => a.wrapping_add(b),
            opcode::SUBTRACT => a.wrapping_sub(b),
            opcode::MULTIPLY => a.wrapping_mul(b),
            // Shifting by the full width or more yields zero, it is
            // not undefined and not a wrap of the shift count.
            opcode::SHIFT_LEFT => {
                if b >= bits {
                    0
                } else {
                    a << b
                }
            }
            opcode::SHIFT_RIGHT => {
                if b >= bits {
                    0
                } else {
                    a >> b
                }
            }
            opcode::BIT_AND => a & b,
            opcode::BIT_NAND => !(a & b),
            opcode::BIT_OR => a | b,
            opcode::BIT_NOR => !(a | b),
            opcode::BIT_XOR => a ^ b,
            opcode::MOD => {
                if b == 0 {
                    return Err(ExecError::DivideByZero);
                }
                a % b
            }
            other => return Err(ExecError::BadOpcode(other)),
        };
        Ok(width.mask(raw))
    }

    /// Divide: remainder to the first target, quotient to the second;
    /// the quotient is also the implicit return. A zero divisor is
    /// fatal to the method, never silently zeroed.
    pub(crate) fn divide(
        _op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let width = cfg.integer_width;
        let dividend = width.mask(integer_operand(operands, 0)?);
        let divisor = width.mask(integer_operand(operands, 1)?);
        if divisor == 0 {
            return Err(ExecError::DivideByZero);
        }

        Ok(ExecResults::Two {
            first: ObjectRef::new(Object::Integer(dividend % divisor)),
            second: ObjectRef::new(Object::Integer(dividend / divisor)),
        })
    }

    /// Concatenate: the second operand coerces to the *first*
    /// operand's kind, then the payloads concatenate raw. Integers
    /// cannot concatenate in place, so Integer+Integer yields a buffer
    /// of the two byte images.
    pub(crate) fn concatenate(
        _op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let width = cfg.integer_width;
        let lhs = value_operand(operands, 0)?;
        let rhs = value_operand(operands, 1)?;

        let result = match &*lhs.borrow() {
            Object::Integer(a) => {
                let b = convert::to_integer(&rhs.borrow(), width)?;
                let mut bytes = convert::integer_to_bytes(width.mask(*a), width);
                bytes.extend_from_slice(&convert::integer_to_bytes(b, width));
                Object::Buffer(bytes)
            }
            Object::String(a) => {
                let b = convert::to_string(&rhs.borrow(), width, cfg.max_string_conversion)?;
                let mut out = String::with_capacity(a.len() + b.len());
                out.push_str(a);
                out.push_str(&b);
                Object::String(out)
            }
            Object::Buffer(a) => {
                let b = convert::to_buffer(&rhs.borrow(), width)?;
                let mut bytes = Vec::with_capacity(a.len() + b.len());
                bytes.extend_from_slice(a);
                bytes.extend_from_slice(&b);
                Object::Buffer(bytes)
            }
            // The resolver guarantees ComputeData membership.
            _ => return Err(ExecError::Internal),
        };

        Ok(ExecResults::One(ObjectRef::new(result)))
    }

    /// ConcatenateResTemplate: splice two resource templates, keeping
    /// a single trailing end tag.
    pub(crate) fn concatenate_template(
        op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        _cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let lhs = value_operand(operands, 0)?;
        let rhs = value_operand(operands, 1)?;

        let result = {
            let (a, b) = (lhs.borrow(), rhs.borrow());
            let (Object::Buffer(a), Object::Buffer(b)) = (&*a, &*b) else {
                return Err(ExecError::Internal);
            };
            let a_end = template_end_tag(a)
                .ok_or_else(|| missing_end_tag(op, 0))?;
            let b_end = template_end_tag(b)
                .ok_or_else(|| missing_end_tag(op, 1))?;

            let mut bytes = Vec::with_capacity(a_end + b_end + 2);
            bytes.extend_from_slice(&a[..a_end]);
            bytes.extend_from_slice(&b[..b_end]);
            // Fresh end tag: small descriptor 0xF, length 1, and a
            // zero checksum byte meaning "treat as valid".
            bytes.extend_from_slice(&[0x79, 0x00]);
            Object::Buffer(bytes)
        };

        Ok(ExecResults::One(ObjectRef::new(result)))
    }

    /// A buffer that is not a well-formed resource template fails the
    /// operand, not the interpreter.
    fn missing_end_tag(op: &OpInfo, position: usize) -> ExecError {
        ExecError::OperandType {
            opcode: op.opcode,
            position,
            needed: ArgType::Buffer,
            found: ObjectType::Buffer,
        }
    }

    /// Walks resource descriptors and returns the offset of the end
    /// tag, or `None` if the template is malformed.
    fn template_end_tag(bytes: &[u8]) -> Option<usize> {
        let mut i = 0;
        while i < bytes.len() {
            let tag = bytes[i];
            if tag & 0x80 != 0 {
                // Large descriptor: 3-byte header plus a 16-bit length.
                let len = usize::from(*bytes.get(i + 1)?) | (usize::from(*bytes.get(i + 2)?) << 8);
                i += 3 + len;
            } else {
                // Small descriptor: item name in bits 6:3, 0xF is the
                // end tag.
                if (tag >> 3) & 0x0F == 0x0F {
                    return Some(i);
                }
                i += 1 + usize::from(tag & 0x07);
            }
        }
        None
    }

    /// Index: creates a reference to a package element, buffer byte,
    /// or string byte.
    pub(crate) fn index(
        _op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        _cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let source = value_operand(operands, 0)?;
        let index =
            usize::try_from(integer_operand(operands, 1)?).map_err(|_| ExecError::LimitExceeded)?;

        let len = match &*source.borrow() {
            Object::Package(elements) => elements.len(),
            Object::Buffer(bytes) => bytes.len(),
            Object::String(s) => s.len(),
            _ => return Err(ExecError::Internal),
        };
        if index >= len {
            return Err(ExecError::LimitExceeded);
        }

        Ok(ExecResults::One(ObjectRef::new(Object::Reference(
            Reference::Index {
                source: source.clone(),
                index,
            },
        ))))
    }

    /// ToString: buffer bytes up to the first NUL or the supplied
    /// length, as a new string.
    pub(crate) fn to_string(
        _op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let source = value_operand(operands, 0)?;
        let length = integer_operand(operands, 1)?;

        let result = {
            let obj = source.borrow();
            let Object::Buffer(bytes) = &*obj else {
                return Err(ExecError::Internal);
            };

            // All-ones means "no length cap" rather than a huge cap.
            let cap = if length == cfg.integer_width.ones() {
                bytes.len()
            } else {
                usize::try_from(length)
                    .unwrap_or(usize::MAX)
                    .min(bytes.len())
            };
            let taken = bytes[..cap]
                .iter()
                .take_while(|&&b| b != 0)
                .map(|&b| char::from(b))
                .collect::<String>();

            if taken.len() > cfg.max_string_conversion {
                return Err(ExecError::LimitExceeded);
            }
            Object::String(taken)
        };

        Ok(ExecResults::One(ObjectRef::new(result)))
    }

    /// Logical comparison (LEqual, LGreater, LLess) over integers,
    /// strings, or buffers; the second operand coerces to the first
    /// operand's kind before comparing.
    pub(crate) fn logical(
        op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let width = cfg.integer_width;
        let lhs = value_operand(operands, 0)?;
        let rhs = value_operand(operands, 1)?;

        let truth = match &*lhs.borrow() {
            Object::Integer(a) => {
                let b = convert::to_integer(&rhs.borrow(), width)?;
                compare_integers(op.opcode, width.mask(*a), b)?
            }
            Object::String(a) => {
                let b = convert::to_string(&rhs.borrow(), width, cfg.max_string_conversion)?;
                compare_bytes(op.opcode, a.as_bytes(), b.as_bytes())?
            }
            Object::Buffer(a) => {
                let b = convert::to_buffer(&rhs.borrow(), width)?;
                compare_bytes(op.opcode, a, &b)?
            }
            _ => return Err(ExecError::Internal),
        };

        Ok(ExecResults::One(boolean_result(truth, cfg)))
    }

    fn compare_integers(opcode_value: u16, a: u64, b: u64) -> Result<bool, ExecError> {
        match opcode_value {
            opcode::LEQUAL => Ok(a == b),
            opcode::LGREATER => Ok(a > b),
            opcode::LLESS => Ok(a < b),
            other => Err(ExecError::BadOpcode(other)),
        }
    }

    /// Lexicographic comparison with length tiebreak: an equal prefix
    /// makes the longer operand the greater one.
    fn compare_bytes(opcode_value: u16, a: &[u8], b: &[u8]) -> Result<bool, ExecError> {
        match opcode_value {
            opcode::LEQUAL => Ok(a == b),
            opcode::LGREATER => Ok(a > b),
            opcode::LLESS => Ok(a < b),
            other => Err(ExecError::BadOpcode(other)),
        }
    }

    /// Numeric logical ops (LAnd, LOr): both operands as booleans.
    pub(crate) fn logical_numeric(
        op: &OpInfo,
        _ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let width = cfg.integer_width;
        let a = width.mask(integer_operand(operands, 0)?) != 0;
        let b = width.mask(integer_operand(operands, 1)?) != 0;

        let truth = match op.opcode {
            opcode::LAND => a && b,
            opcode::LOR => a || b,
            other => return Err(ExecError::BadOpcode(other)),
        };
        Ok(ExecResults::One(boolean_result(truth, cfg)))
    }

    /// Notify: queue a notification for a named object, deferred past
    /// method unwind by the context's contract.
    pub(crate) fn notify(
        _op: &OpInfo,
        ctx: &mut dyn WalkContext,
        _cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let Some(Operand::Node(node)) = operands.first() else {
            return Err(ExecError::Internal);
        };
        let value = integer_operand(operands, 1)?;

        ctx.enqueue_notify(*node, value)?;
        Ok(ExecResults::None)
    }

    /// Acquire: take a mutex with a 16-bit millisecond timeout.
    /// Returns all-ones when the timeout expired, all-zeros otherwise;
    /// timeout is an outcome, not an error.
    pub(crate) fn acquire(
        _op: &OpInfo,
        ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let mutex = match &*value_operand(operands, 0)?.borrow() {
            Object::Mutex(mutex) => *mutex,
            _ => return Err(ExecError::Internal),
        };
        let timeout = integer_operand(operands, 1)? & 0xFFFF;
        let timeout = u16::try_from(timeout).map_err(|_| ExecError::Internal)?;

        let outcome = ctx.acquire_mutex(&mutex, timeout)?;
        Ok(ExecResults::One(boolean_result(
            outcome == SyncOutcome::TimedOut,
            cfg,
        )))
    }

    /// Wait: block on an event with a full-width timeout. Same return
    /// convention as Acquire.
    pub(crate) fn wait(
        _op: &OpInfo,
        ctx: &mut dyn WalkContext,
        cfg: &ExecConfig,
        operands: &[Operand],
    ) -> Result<ExecResults, ExecError> {
        let event = match &*value_operand(operands, 0)?.borrow() {
            Object::Event(event) => *event,
            _ => return Err(ExecError::Internal),
        };
        let timeout = integer_operand(operands, 1)?;

        let outcome = ctx.wait_event(&event, timeout)?;
        Ok(ExecResults::One(boolean_result(
            outcome == SyncOutcome::TimedOut,
            cfg,
        )))
    }

    /// Logical results are all-ones or all-zeros at the configured
    /// width; there is no separate boolean kind.
    fn boolean_result(truth: bool, cfg: &ExecConfig) -> ObjectRef {
        let value = if truth { cfg.integer_width.ones() } else { 0 };
        ObjectRef::new(Object::Integer(value))
    }
}
