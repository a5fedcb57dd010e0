//! Operand resolution: raw stack entries to the kinds opcodes require.
//!
//! For each operand position the dispatch table names a semantic role.
//! Target roles keep the *location* (a named handle or a reference) and
//! pass it through untouched; value roles fully dereference the entry
//! through the walk context and then check or implicitly convert the
//! result. Resolution is fail-fast: the first mismatch aborts with an
//! [`ExecError::OperandType`] carrying the opcode, position, required
//! role, and the kind actually found.
//!
//! An operand already of the exact required kind is passed through as
//! the same object --- no conversion path runs and no copy is made.

use crate::ExecError;
use crate::context::{ExecConfig, WalkContext};
use crate::convert;
use crate::object::{Object, ObjectRef, ObjectType, Operand, Reference};
use crate::optable::{ArgType, OpInfo};

/// Resolves every operand of `op` in place.
///
/// `operands` holds the two source entries followed by `op.targets`
/// target entries, in AML argument order.
///
/// # Errors
///
/// [`ExecError::OperandType`] on the first role mismatch,
/// [`ExecError::LimitExceeded`] if a string conversion overruns the
/// configured ceiling, and [`ExecError::Internal`] if the slice length
/// does not match the table shape (a dispatcher bug, not bytecode).
pub fn resolve_operands(
    op: &OpInfo,
    operands: &mut [Operand],
    ctx: &mut dyn WalkContext,
    cfg: &ExecConfig,
) -> Result<(), ExecError> {
    if operands.len() != op.args.len() {
        return Err(ExecError::Internal);
    }

    for (position, (&role, entry)) in op.args.iter().zip(operands.iter_mut()).enumerate() {
        resolve_one(op, position, role, entry, ctx, cfg)?;
    }
    Ok(())
}

fn resolve_one(
    op: &OpInfo,
    position: usize,
    role: ArgType,
    entry: &mut Operand,
    ctx: &mut dyn WalkContext,
    cfg: &ExecConfig,
) -> Result<(), ExecError> {
    match role {
        _ if role.is_target() => resolve_target(op, position, role, entry),
        ArgType::NodeRef => resolve_node_ref(op, position, role, entry),
        ArgType::StoreTarget => {
            // Stores never implicitly dereference their target: an
            // Index reference is the location to write, not a value to
            // chase through an extra indirection.
            if is_index_reference(entry) {
                return Ok(());
            }
            let value = ctx.resolve_to_value(entry)?;
            *entry = Operand::Value(value);
            Ok(())
        }
        ArgType::Any => {
            let value = ctx.resolve_to_value(entry)?;
            *entry = Operand::Value(value);
            Ok(())
        }
        _ => {
            let value = ctx.resolve_to_value(entry)?;
            let value = check_or_convert(op, position, role, value, cfg)?;
            *entry = Operand::Value(value);
            Ok(())
        }
    }
}

/// Validates a target entry: named handles and location references
/// pass through; a `Name` reference collapses to its node handle.
fn resolve_target(
    op: &OpInfo,
    position: usize,
    role: ArgType,
    entry: &mut Operand,
) -> Result<(), ExecError> {
    let Operand::Value(obj) = entry else {
        // Already a named handle; the store needs exactly this.
        return Ok(());
    };

    let direct_node = match &*obj.borrow() {
        // The closed Reference enum is the set of producers a target
        // may come from: Debug, Name, Index, RefOf, Arg, Local, Load.
        Object::Reference(Reference::Name(node)) => Some(*node),
        Object::Reference(_) => None,
        other => {
            return Err(type_error(op, position, role, other.object_type()));
        }
    };

    if let Some(node) = direct_node {
        *entry = Operand::Node(node);
    }
    Ok(())
}

/// Validates a Notify target: a named object, possibly behind a
/// `Name`/`RefOf` reference.
fn resolve_node_ref(
    op: &OpInfo,
    position: usize,
    role: ArgType,
    entry: &mut Operand,
) -> Result<(), ExecError> {
    let Operand::Value(obj) = entry else {
        return Ok(());
    };

    let node = match &*obj.borrow() {
        Object::Reference(Reference::Name(node) | Reference::RefOf(node)) => *node,
        other => {
            return Err(type_error(op, position, role, other.object_type()));
        }
    };

    *entry = Operand::Node(node);
    Ok(())
}

/// Type-checks a resolved value against its role, converting where
/// ACPI mandates an implicit conversion. Exact-kind matches
/// return the input object unchanged.
fn check_or_convert(
    op: &OpInfo,
    position: usize,
    role: ArgType,
    value: ObjectRef,
    cfg: &ExecConfig,
) -> Result<ObjectRef, ExecError> {
    let found = value.object_type();
    let width = cfg.integer_width;

    let converted = match role {
        ArgType::Integer => match found {
            ObjectType::Integer => None,
            ObjectType::String | ObjectType::Buffer => {
                Some(Object::Integer(convert::to_integer(&value.borrow(), width)?))
            }
            _ => return Err(type_error(op, position, role, found)),
        },
        ArgType::Buffer => match found {
            ObjectType::Buffer => None,
            ObjectType::Integer | ObjectType::String => {
                Some(Object::Buffer(convert::to_buffer(&value.borrow(), width)?))
            }
            _ => return Err(type_error(op, position, role, found)),
        },
        ArgType::String => match found {
            ObjectType::String => None,
            ObjectType::Integer | ObjectType::Buffer => Some(Object::String(convert::to_string(
                &value.borrow(),
                width,
                cfg.max_string_conversion,
            )?)),
            _ => return Err(type_error(op, position, role, found)),
        },
        ArgType::BufferOrString => match found {
            ObjectType::Buffer | ObjectType::String => None,
            // Integer-to-Buffer is the only coercion for this role.
            ObjectType::Integer => {
                Some(Object::Buffer(convert::to_buffer(&value.borrow(), width)?))
            }
            _ => return Err(type_error(op, position, role, found)),
        },
        // Membership roles: closed-set check, never a conversion.
        ArgType::ComputeData => {
            check_membership(op, position, role, found, &COMPUTE_DATA)?;
            None
        }
        ArgType::DataObject => {
            check_membership(op, position, role, found, &DATA_OBJECT)?;
            None
        }
        ArgType::ComplexObject => {
            check_membership(op, position, role, found, &COMPLEX_OBJECT)?;
            None
        }
        ArgType::RegionOrField => {
            check_membership(op, position, role, found, &[ObjectType::RegionField])?;
            None
        }
        ArgType::Mutex => {
            check_membership(op, position, role, found, &[ObjectType::Mutex])?;
            None
        }
        ArgType::Event => {
            check_membership(op, position, role, found, &[ObjectType::Event])?;
            None
        }
        ArgType::Package => {
            check_membership(op, position, role, found, &[ObjectType::Package])?;
            None
        }
        ArgType::DdbHandle => {
            check_membership(op, position, role, found, &[ObjectType::DdbHandle])?;
            None
        }
        // Handled by resolve_one before reaching here.
        ArgType::Any | ArgType::TargetRef | ArgType::FixedTarget | ArgType::StoreTarget
        | ArgType::NodeRef => None,
    };

    Ok(match converted {
        Some(object) => ObjectRef::new(object),
        None => value,
    })
}

const COMPUTE_DATA: [ObjectType; 3] = [ObjectType::Integer, ObjectType::String, ObjectType::Buffer];
const DATA_OBJECT: [ObjectType; 4] = [
    ObjectType::Integer,
    ObjectType::String,
    ObjectType::Buffer,
    ObjectType::Package,
];
const COMPLEX_OBJECT: [ObjectType; 3] =
    [ObjectType::String, ObjectType::Buffer, ObjectType::Package];

fn check_membership(
    op: &OpInfo,
    position: usize,
    role: ArgType,
    found: ObjectType,
    allowed: &[ObjectType],
) -> Result<(), ExecError> {
    if allowed.contains(&found) {
        Ok(())
    } else {
        Err(type_error(op, position, role, found))
    }
}

fn is_index_reference(entry: &Operand) -> bool {
    match entry {
        Operand::Value(obj) => {
            matches!(&*obj.borrow(), Object::Reference(Reference::Index { .. }))
        }
        Operand::Node(_) => false,
    }
}

fn type_error(op: &OpInfo, position: usize, needed: ArgType, found: ObjectType) -> ExecError {
    ExecError::OperandType {
        opcode: op.opcode,
        position,
        needed,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{MutexObject, RegionFieldHandle, SyncHandle, TableHandle};
    use crate::optable::{self, opcode};
    use crate::testutil::MockWalk;
    use alloc::string::ToString;
    use alloc::vec;

    fn value(object: Object) -> Operand {
        Operand::Value(ObjectRef::new(object))
    }

    /// Resolves a single entry against a role, the way the wider
    /// interpreter uses the roles no table row in this crate names.
    fn resolve_role(
        role: ArgType,
        entry: &mut Operand,
        ctx: &mut MockWalk,
    ) -> Result<(), ExecError> {
        let op = optable::lookup(opcode::ADD).unwrap();
        resolve_one(op, 0, role, entry, ctx, &ExecConfig::default())
    }

    fn resolve(
        opcode: u16,
        operands: &mut [Operand],
        ctx: &mut MockWalk,
    ) -> Result<(), ExecError> {
        let op = optable::lookup(opcode).unwrap();
        resolve_operands(op, operands, ctx, &ExecConfig::default())
    }

    #[test]
    fn exact_kinds_pass_through_unconverted() {
        let mut ctx = MockWalk::new();
        let a = ObjectRef::new(Object::Integer(1));
        let b = ObjectRef::new(Object::Integer(2));
        let mut operands = [
            Operand::Value(a.clone()),
            Operand::Value(b.clone()),
            value(Object::Reference(Reference::Local(0))),
        ];

        resolve(opcode::ADD, &mut operands, &mut ctx).unwrap();

        // Same objects, not converted copies.
        assert!(operands[0].value().unwrap().same_object(&a));
        assert!(operands[1].value().unwrap().same_object(&b));
    }

    #[test]
    fn string_operand_converts_for_integer_role() {
        let mut ctx = MockWalk::new();
        let mut operands = [
            value(Object::String("1A".to_string())),
            value(Object::Integer(1)),
            value(Object::Reference(Reference::Local(0))),
        ];

        resolve(opcode::ADD, &mut operands, &mut ctx).unwrap();

        let resolved = operands[0].value().unwrap();
        assert_eq!(resolved.borrow().as_integer(), Some(0x1A));
    }

    #[test]
    fn buffer_role_serializes_integer() {
        let mut ctx = MockWalk::new();
        let mut operands = [
            value(Object::Integer(0x4142)),
            value(Object::Integer(10)),
            value(Object::Reference(Reference::Local(0))),
        ];

        resolve(opcode::TO_STRING, &mut operands, &mut ctx).unwrap();
        match &*operands[0].value().unwrap().borrow() {
            Object::Buffer(bytes) => assert_eq!(bytes[..2], [0x42, 0x41]),
            other => panic!("expected buffer, got {other:?}"),
        }
    }

    #[test]
    fn mismatch_reports_opcode_position_and_types() {
        let mut ctx = MockWalk::new();
        let mut operands = [
            value(Object::Integer(1)),
            value(Object::Package(vec![])),
            value(Object::Reference(Reference::Local(0))),
        ];

        let err = resolve(opcode::ADD, &mut operands, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            ExecError::OperandType {
                opcode: opcode::ADD,
                position: 1,
                needed: ArgType::Integer,
                found: ObjectType::Package,
            }
        );
    }

    #[test]
    fn name_reference_target_collapses_to_node() {
        let mut ctx = MockWalk::new();
        let node = ctx.add_node(7, Object::Integer(0));
        let mut operands = [
            value(Object::Integer(1)),
            value(Object::Integer(2)),
            value(Object::Reference(Reference::Name(node))),
        ];

        resolve(opcode::ADD, &mut operands, &mut ctx).unwrap();
        assert!(matches!(operands[2], Operand::Node(n) if n == node));
    }

    #[test]
    fn non_reference_target_is_rejected() {
        let mut ctx = MockWalk::new();
        let mut operands = [
            value(Object::Integer(1)),
            value(Object::Integer(2)),
            value(Object::Integer(3)),
        ];

        let err = resolve(opcode::ADD, &mut operands, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            ExecError::OperandType {
                opcode: opcode::ADD,
                position: 2,
                needed: ArgType::TargetRef,
                found: ObjectType::Integer,
            }
        );
    }

    #[test]
    fn local_reference_target_passes_through() {
        let mut ctx = MockWalk::new();
        let target = ObjectRef::new(Object::Reference(Reference::Local(5)));
        let mut operands = [
            value(Object::Integer(1)),
            value(Object::Integer(2)),
            Operand::Value(target.clone()),
        ];

        resolve(opcode::ADD, &mut operands, &mut ctx).unwrap();
        assert!(operands[2].value().unwrap().same_object(&target));
    }

    #[test]
    fn store_target_keeps_index_reference_unresolved() {
        let pkg = ObjectRef::new(Object::Package(vec![ObjectRef::new(Object::Integer(5))]));
        let index_ref = ObjectRef::new(Object::Reference(Reference::Index {
            source: pkg,
            index: 0,
        }));
        let mut ctx = MockWalk::new();
        let mut entry = Operand::Value(index_ref.clone());

        // Resolve a single store-target entry the way the wider
        // interpreter's Store path would.
        let op = optable::lookup(opcode::ADD).unwrap();
        resolve_one(
            op,
            0,
            ArgType::StoreTarget,
            &mut entry,
            &mut ctx,
            &ExecConfig::default(),
        )
        .unwrap();

        assert!(entry.value().unwrap().same_object(&index_ref));
    }

    #[test]
    fn store_target_resolves_plain_values() {
        let mut ctx = MockWalk::new();
        ctx.locals[0] = Some(ObjectRef::new(Object::Integer(9)));
        let mut entry = Operand::Value(ObjectRef::new(Object::Reference(Reference::Local(0))));

        let op = optable::lookup(opcode::ADD).unwrap();
        resolve_one(
            op,
            0,
            ArgType::StoreTarget,
            &mut entry,
            &mut ctx,
            &ExecConfig::default(),
        )
        .unwrap();

        assert_eq!(entry.value().unwrap().borrow().as_integer(), Some(9));
    }

    #[test]
    fn node_operands_resolve_through_the_namespace() {
        let mut ctx = MockWalk::new();
        let node = ctx.add_node(1, Object::Integer(40));
        let mut operands = [
            Operand::Node(node),
            value(Object::Integer(2)),
            value(Object::Reference(Reference::Local(0))),
        ];

        resolve(opcode::ADD, &mut operands, &mut ctx).unwrap();
        assert_eq!(operands[0].value().unwrap().borrow().as_integer(), Some(40));
    }

    #[test]
    fn mutex_role_is_exact() {
        let mut ctx = MockWalk::new();
        let mut operands = [value(Object::Integer(1)), value(Object::Integer(0))];

        let err = resolve(opcode::ACQUIRE, &mut operands, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ExecError::OperandType {
                needed: ArgType::Mutex,
                found: ObjectType::Integer,
                ..
            }
        ));
    }

    #[test]
    fn complex_object_role_rejects_integers() {
        let mut ctx = MockWalk::new();
        let mut operands = [
            value(Object::Integer(1)),
            value(Object::Integer(0)),
            value(Object::Reference(Reference::Local(0))),
        ];

        let err = resolve(opcode::INDEX, &mut operands, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ExecError::OperandType {
                position: 0,
                needed: ArgType::ComplexObject,
                found: ObjectType::Integer,
                ..
            }
        ));
    }

    #[test]
    fn short_stack_is_an_internal_error() {
        let mut ctx = MockWalk::new();
        let mut operands = [value(Object::Integer(1)), value(Object::Integer(2))];

        let err = resolve(opcode::ADD, &mut operands, &mut ctx).unwrap_err();
        assert_eq!(err, ExecError::Internal);
    }

    #[test]
    fn buffer_or_string_role_accepts_both_unconverted() {
        let mut ctx = MockWalk::new();
        for obj in [
            ObjectRef::new(Object::String("DEV".to_string())),
            ObjectRef::new(Object::Buffer(vec![1, 2])),
        ] {
            let mut entry = Operand::Value(obj.clone());
            resolve_role(ArgType::BufferOrString, &mut entry, &mut ctx).unwrap();
            assert!(entry.value().unwrap().same_object(&obj));
        }
    }

    #[test]
    fn buffer_or_string_role_serializes_only_integers() {
        let mut ctx = MockWalk::new();
        let mut entry = Operand::Value(ObjectRef::new(Object::Integer(0x0201)));
        resolve_role(ArgType::BufferOrString, &mut entry, &mut ctx).unwrap();
        match &*entry.value().unwrap().borrow() {
            Object::Buffer(bytes) => {
                assert_eq!(bytes.len(), 8);
                assert_eq!(bytes[..2], [0x01, 0x02]);
            }
            other => panic!("expected buffer, got {other:?}"),
        }

        // No coercion path exists for the other kinds.
        let mut entry = Operand::Value(ObjectRef::new(Object::Package(vec![])));
        let err = resolve_role(ArgType::BufferOrString, &mut entry, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            ExecError::OperandType {
                opcode: opcode::ADD,
                position: 0,
                needed: ArgType::BufferOrString,
                found: ObjectType::Package,
            }
        );
    }

    #[test]
    fn data_object_role_admits_packages() {
        let mut ctx = MockWalk::new();
        let pkg = ObjectRef::new(Object::Package(vec![]));
        let mut entry = Operand::Value(pkg.clone());
        resolve_role(ArgType::DataObject, &mut entry, &mut ctx).unwrap();
        assert!(entry.value().unwrap().same_object(&pkg));

        let mut entry = Operand::Value(ObjectRef::new(Object::Mutex(MutexObject {
            handle: SyncHandle(0),
            sync_level: 0,
        })));
        let err = resolve_role(ArgType::DataObject, &mut entry, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ExecError::OperandType {
                needed: ArgType::DataObject,
                found: ObjectType::Mutex,
                ..
            }
        ));
    }

    #[test]
    fn single_kind_roles_check_membership_only() {
        let mut ctx = MockWalk::new();
        let members = [
            (
                ArgType::RegionOrField,
                Object::RegionField(RegionFieldHandle(1)),
            ),
            (ArgType::Package, Object::Package(vec![])),
            (ArgType::DdbHandle, Object::DdbHandle(TableHandle(2))),
        ];

        for (role, object) in members {
            let obj = ObjectRef::new(object);
            let mut entry = Operand::Value(obj.clone());
            resolve_role(role, &mut entry, &mut ctx).unwrap();
            // Membership only: the same object, never a conversion.
            assert!(entry.value().unwrap().same_object(&obj));

            let mut entry = Operand::Value(ObjectRef::new(Object::Integer(1)));
            let err = resolve_role(role, &mut entry, &mut ctx).unwrap_err();
            assert_eq!(
                err,
                ExecError::OperandType {
                    opcode: opcode::ADD,
                    position: 0,
                    needed: role,
                    found: ObjectType::Integer,
                }
            );
        }
    }

    #[test]
    fn any_role_resolves_without_inspection() {
        let mut ctx = MockWalk::new();
        // A mutex satisfies Any; it only has to resolve.
        let mutex = ObjectRef::new(Object::Mutex(MutexObject {
            handle: SyncHandle(9),
            sync_level: 0,
        }));
        let mut entry = Operand::Value(mutex.clone());
        resolve_role(ArgType::Any, &mut entry, &mut ctx).unwrap();
        assert!(entry.value().unwrap().same_object(&mutex));
    }

    #[test]
    fn failure_position_is_the_first_mismatch() {
        let mut ctx = MockWalk::new();
        // Both operands are bad; only position 0 is reported.
        let mut operands = [
            value(Object::Package(vec![])),
            value(Object::Package(vec![])),
            value(Object::Reference(Reference::Local(0))),
        ];

        let err = resolve(opcode::ADD, &mut operands, &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::OperandType { position: 0, .. }));
    }
}
