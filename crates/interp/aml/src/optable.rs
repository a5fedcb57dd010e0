//! Two-operand opcode dispatch table and argument-type requirements.
//!
//! Each entry pairs an opcode with its shape (target count, implicit
//! return), the ordered list of semantic roles its operands must
//! satisfy, and the handler that implements it. The table is a static
//! constant: dispatch is a lookup, not a switch, so every handler is
//! unit-testable in isolation.

use crate::ExecError;
use crate::context::{ExecConfig, WalkContext};
use crate::object::Operand;
use crate::store::ExecResults;

/// Number of source operands every opcode in this table consumes.
pub const SOURCE_OPERANDS: usize = 2;

/// AML opcode values for the two-operand family.
///
/// Extended (`0x5B`-prefixed) opcodes are encoded as `0x5B00 | ext`.
pub mod opcode {
    /// `Add` --- integer addition.
    pub const ADD: u16 = 0x72;
    /// `Concatenate` --- data concatenation.
    pub const CONCATENATE: u16 = 0x73;
    /// `Subtract` --- integer subtraction.
    pub const SUBTRACT: u16 = 0x74;
    /// `Multiply` --- integer multiplication.
    pub const MULTIPLY: u16 = 0x77;
    /// `Divide` --- quotient and remainder.
    pub const DIVIDE: u16 = 0x78;
    /// `ShiftLeft`.
    pub const SHIFT_LEFT: u16 = 0x79;
    /// `ShiftRight`.
    pub const SHIFT_RIGHT: u16 = 0x7A;
    /// `And` --- bitwise AND.
    pub const BIT_AND: u16 = 0x7B;
    /// `NAnd` --- bitwise NAND.
    pub const BIT_NAND: u16 = 0x7C;
    /// `Or` --- bitwise OR.
    pub const BIT_OR: u16 = 0x7D;
    /// `NOr` --- bitwise NOR.
    pub const BIT_NOR: u16 = 0x7E;
    /// `XOr` --- bitwise XOR.
    pub const BIT_XOR: u16 = 0x7F;
    /// `ConcatenateResTemplate` --- resource template splicing.
    pub const CONCATENATE_TEMPLATE: u16 = 0x84;
    /// `Mod` --- integer remainder.
    pub const MOD: u16 = 0x85;
    /// `Notify` --- queue a device notification.
    pub const NOTIFY: u16 = 0x86;
    /// `Index` --- reference into a package, buffer, or string.
    pub const INDEX: u16 = 0x88;
    /// `LAnd` --- logical AND of two integers.
    pub const LAND: u16 = 0x90;
    /// `LOr` --- logical OR of two integers.
    pub const LOR: u16 = 0x91;
    /// `LEqual` --- equality comparison.
    pub const LEQUAL: u16 = 0x93;
    /// `LGreater` --- ordering comparison.
    pub const LGREATER: u16 = 0x94;
    /// `LLess` --- ordering comparison.
    pub const LLESS: u16 = 0x95;
    /// `ToString` --- buffer bytes to string.
    pub const TO_STRING: u16 = 0x9C;
    /// `Acquire` --- take a mutex with timeout (extended opcode).
    pub const ACQUIRE: u16 = 0x5B23;
    /// `Wait` --- wait on an event with timeout (extended opcode).
    pub const WAIT: u16 = 0x5B25;
}

/// Semantic role an operand position must satisfy.
///
/// Value roles are fully dereferenced and, where ACPI mandates it,
/// implicitly converted; membership roles only check the
/// resolved kind; reference roles pass the location through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// An integer; convertible from String (hex parse) and Buffer
    /// (byte reinterpretation).
    Integer,
    /// A buffer; convertible from Integer (byte image) and String
    /// (raw bytes).
    Buffer,
    /// A string; convertible from Integer and Buffer (hex rendering),
    /// bounded by the configured length ceiling.
    String,
    /// A buffer or string; the only accepted coercion is
    /// Integer-to-Buffer.
    BufferOrString,
    /// Any of Integer, String, Buffer. Membership check only.
    ComputeData,
    /// Any of Integer, String, Buffer, Package. Membership check only.
    DataObject,
    /// Any of String, Buffer, Package. Membership check only.
    ComplexObject,
    /// An operation region or field unit. Exact kind.
    RegionOrField,
    /// A mutex object. Exact kind.
    Mutex,
    /// An event object. Exact kind.
    Event,
    /// A package object. Exact kind.
    Package,
    /// A loaded definition block handle. Exact kind.
    DdbHandle,
    /// Anything; resolved to a value but never inspected.
    Any,
    /// A store destination: a named handle or a location reference.
    TargetRef,
    /// A store destination that must not be implicitly converted when
    /// written (ToString / ConcatenateResTemplate results).
    FixedTarget,
    /// Any value used as a store target. `Index` references pass
    /// through unresolved --- stores never implicitly dereference their
    /// target.
    StoreTarget,
    /// A named namespace object (the Notify target).
    NodeRef,
}

impl ArgType {
    /// Whether this role designates a store destination rather than a
    /// value to inspect.
    #[must_use]
    pub fn is_target(self) -> bool {
        matches!(self, Self::TargetRef | Self::FixedTarget)
    }
}

/// Handler signature shared by all two-operand opcodes.
///
/// Operands arrive fully resolved; the handler produces result objects
/// for the result store to distribute.
pub type Handler = fn(
    &OpInfo,
    &mut dyn WalkContext,
    &ExecConfig,
    &[Operand],
) -> Result<ExecResults, ExecError>;

/// One dispatch-table entry: opcode identity, shape, argument roles,
/// and handler.
pub struct OpInfo {
    /// The AML opcode value.
    pub opcode: u16,
    /// The ASL-level operator name, for diagnostics.
    pub name: &'static str,
    /// Required role per operand position: two sources, then targets.
    pub args: &'static [ArgType],
    /// Number of trailing target operands.
    pub targets: usize,
    /// Whether the opcode produces an implicit return value.
    pub returns: bool,
    pub(crate) handler: Handler,
}

const fn entry(
    opcode: u16,
    name: &'static str,
    args: &'static [ArgType],
    targets: usize,
    returns: bool,
    handler: Handler,
) -> OpInfo {
    OpInfo {
        opcode,
        name,
        args,
        targets,
        returns,
        handler,
    }
}

const MATH_ARGS: &[ArgType] = &[ArgType::Integer, ArgType::Integer, ArgType::TargetRef];
const LOGICAL_NUMERIC_ARGS: &[ArgType] = &[ArgType::Integer, ArgType::Integer];
const LOGICAL_ARGS: &[ArgType] = &[ArgType::ComputeData, ArgType::ComputeData];

use crate::dyadic::handlers;

/// The two-operand dispatch table.
static OPS: &[OpInfo] = &[
    entry(opcode::ADD, "Add", MATH_ARGS, 1, true, handlers::binary_math),
    entry(
        opcode::CONCATENATE,
        "Concatenate",
        &[ArgType::ComputeData, ArgType::ComputeData, ArgType::TargetRef],
        1,
        true,
        handlers::concatenate,
    ),
    entry(
        opcode::SUBTRACT,
        "Subtract",
        MATH_ARGS,
        1,
        true,
        handlers::binary_math,
    ),
    entry(
        opcode::MULTIPLY,
        "Multiply",
        MATH_ARGS,
        1,
        true,
        handlers::binary_math,
    ),
    entry(
        opcode::DIVIDE,
        "Divide",
        &[
            ArgType::Integer,
            ArgType::Integer,
            ArgType::TargetRef,
            ArgType::TargetRef,
        ],
        2,
        true,
        handlers::divide,
    ),
    entry(
        opcode::SHIFT_LEFT,
        "ShiftLeft",
        MATH_ARGS,
        1,
        true,
        handlers::binary_math,
    ),
    entry(
        opcode::SHIFT_RIGHT,
        "ShiftRight",
        MATH_ARGS,
        1,
        true,
        handlers::binary_math,
    ),
    entry(opcode::BIT_AND, "And", MATH_ARGS, 1, true, handlers::binary_math),
    entry(
        opcode::BIT_NAND,
        "NAnd",
        MATH_ARGS,
        1,
        true,
        handlers::binary_math,
    ),
    entry(opcode::BIT_OR, "Or", MATH_ARGS, 1, true, handlers::binary_math),
    entry(
        opcode::BIT_NOR,
        "NOr",
        MATH_ARGS,
        1,
        true,
        handlers::binary_math,
    ),
    entry(
        opcode::BIT_XOR,
        "XOr",
        MATH_ARGS,
        1,
        true,
        handlers::binary_math,
    ),
    entry(
        opcode::CONCATENATE_TEMPLATE,
        "ConcatenateResTemplate",
        &[ArgType::Buffer, ArgType::Buffer, ArgType::FixedTarget],
        1,
        true,
        handlers::concatenate_template,
    ),
    entry(opcode::MOD, "Mod", MATH_ARGS, 1, true, handlers::binary_math),
    entry(
        opcode::NOTIFY,
        "Notify",
        &[ArgType::NodeRef, ArgType::Integer],
        0,
        false,
        handlers::notify,
    ),
    entry(
        opcode::INDEX,
        "Index",
        &[ArgType::ComplexObject, ArgType::Integer, ArgType::TargetRef],
        1,
        true,
        handlers::index,
    ),
    entry(
        opcode::LAND,
        "LAnd",
        LOGICAL_NUMERIC_ARGS,
        0,
        true,
        handlers::logical_numeric,
    ),
    entry(
        opcode::LOR,
        "LOr",
        LOGICAL_NUMERIC_ARGS,
        0,
        true,
        handlers::logical_numeric,
    ),
    entry(
        opcode::LEQUAL,
        "LEqual",
        LOGICAL_ARGS,
        0,
        true,
        handlers::logical,
    ),
    entry(
        opcode::LGREATER,
        "LGreater",
        LOGICAL_ARGS,
        0,
        true,
        handlers::logical,
    ),
    entry(opcode::LLESS, "LLess", LOGICAL_ARGS, 0, true, handlers::logical),
    entry(
        opcode::TO_STRING,
        "ToString",
        &[ArgType::Buffer, ArgType::Integer, ArgType::FixedTarget],
        1,
        true,
        handlers::to_string,
    ),
    entry(
        opcode::ACQUIRE,
        "Acquire",
        &[ArgType::Mutex, ArgType::Integer],
        0,
        true,
        handlers::acquire,
    ),
    entry(
        opcode::WAIT,
        "Wait",
        &[ArgType::Event, ArgType::Integer],
        0,
        true,
        handlers::wait,
    ),
];

/// Looks up the dispatch-table entry for an opcode.
#[must_use]
pub fn lookup(opcode: u16) -> Option<&'static OpInfo> {
    OPS.iter().find(|op| op.opcode == opcode)
}
