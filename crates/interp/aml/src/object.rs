//! Operand and object model for the execution core.
//!
//! AML is dynamically typed: every value carries its kind at runtime.
//! [`Object`] is the closed sum of kinds this core manipulates, so a
//! kind/payload mismatch is unrepresentable and every consumption site
//! can match exhaustively.
//!
//! Objects live behind [`ObjectRef`], a non-atomic reference-counted
//! cell. One logical thread executes per AML walk, so `Rc`/`RefCell`
//! suffice; serialization of globally shared objects across walks is
//! the external system's responsibility.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell, RefMut};

/// Handle to a node in the external ACPI namespace.
///
/// The namespace itself is owned by the surrounding interpreter; this
/// core only carries handles through (a store needs the location, not
/// the value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(pub u32);

/// Handle to a loaded definition block (DDBHandle, produced by `Load`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHandle(pub u32);

/// Handle to an operation region or field unit in the external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionFieldHandle(pub u32);

/// Handle to an OS-level synchronization primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncHandle(pub u32);

/// An AML mutex object.
///
/// The actual lock, its owner tracking, and any blocking wait live in
/// the OS layer behind [`SyncHandle`]; this core only passes the object
/// to [`WalkContext::acquire_mutex`](crate::WalkContext::acquire_mutex).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutexObject {
    /// OS-level lock backing this mutex.
    pub handle: SyncHandle,
    /// AML sync level (0-15), enforced by the external layer.
    pub sync_level: u8,
}

/// An AML event object. Semantics mirror [`MutexObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventObject {
    /// OS-level event backing this object.
    pub handle: SyncHandle,
}

/// A reference designating a storage location rather than a value.
///
/// One variant per producing opcode. The operand resolver accepts
/// exactly this set in target positions, so the validity check is the
/// exhaustiveness of this enum.
#[derive(Debug, Clone)]
pub enum Reference {
    /// The debug object (`Debug`); stores to it are print statements.
    Debug,
    /// A name reference not yet attached to its node. The resolver
    /// collapses this to a direct [`Operand::Node`] handle.
    Name(NodeHandle),
    /// `RefOf` over a named object.
    RefOf(NodeHandle),
    /// A method argument slot (`Arg0`-`Arg6`).
    Arg(u8),
    /// A method local slot (`Local0`-`Local7`).
    Local(u8),
    /// An `Index` reference into a package element, buffer byte, or
    /// string byte.
    Index {
        /// The package, buffer, or string being indexed.
        source: ObjectRef,
        /// Element or byte position; validated in range at creation.
        index: usize,
    },
    /// A loaded table (`Load` result used as a reference).
    Table(TableHandle),
}

impl Reference {
    /// Dereferences an `Index` reference without external help.
    ///
    /// Package elements are returned as-is (shared); buffer and string
    /// bytes are synthesized as fresh integers. Returns `None` for the
    /// variants that need the namespace or method frame to resolve ---
    /// a convenience for `resolve_to_value` implementations, which own
    /// those cases.
    #[must_use]
    pub fn dereference(&self) -> Option<ObjectRef> {
        let Self::Index { source, index } = self else {
            return None;
        };
        match &*source.borrow() {
            Object::Package(elements) => elements.get(*index).cloned(),
            Object::Buffer(bytes) => bytes
                .get(*index)
                .map(|&b| ObjectRef::new(Object::Integer(u64::from(b)))),
            Object::String(s) => s
                .as_bytes()
                .get(*index)
                .map(|&b| ObjectRef::new(Object::Integer(u64::from(b)))),
            _ => None,
        }
    }
}

/// The kind tag of an [`Object`], used in type checks and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// Fixed-width unsigned integer.
    Integer,
    /// ASCII string.
    String,
    /// Raw byte buffer.
    Buffer,
    /// Ordered collection of objects.
    Package,
    /// Synchronization mutex.
    Mutex,
    /// Synchronization event.
    Event,
    /// Operation region or field unit.
    RegionField,
    /// Loaded definition block handle.
    DdbHandle,
    /// Storage-location reference.
    Reference,
}

/// A dynamically typed AML object.
#[derive(Debug, Clone)]
pub enum Object {
    /// An integer, always stored at full width; the configured
    /// interpreter width masks it at operation boundaries.
    Integer(u64),
    /// An ASCII string.
    String(String),
    /// A byte buffer.
    Buffer(Vec<u8>),
    /// A package of objects. Elements are shared so `Index` references
    /// observe later stores.
    Package(Vec<ObjectRef>),
    /// A mutex, backed by the external synchronization layer.
    Mutex(MutexObject),
    /// An event, backed by the external synchronization layer.
    Event(EventObject),
    /// An operation region or field unit, held by handle.
    RegionField(RegionFieldHandle),
    /// A loaded definition block handle.
    DdbHandle(TableHandle),
    /// A reference to a storage location.
    Reference(Reference),
}

impl Object {
    /// Returns the kind tag for this object.
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Integer(_) => ObjectType::Integer,
            Self::String(_) => ObjectType::String,
            Self::Buffer(_) => ObjectType::Buffer,
            Self::Package(_) => ObjectType::Package,
            Self::Mutex(_) => ObjectType::Mutex,
            Self::Event(_) => ObjectType::Event,
            Self::RegionField(_) => ObjectType::RegionField,
            Self::DdbHandle(_) => ObjectType::DdbHandle,
            Self::Reference(_) => ObjectType::Reference,
        }
    }

    /// Returns the integer payload, if this is an integer.
    #[must_use]
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// A shared, interior-mutable AML object.
///
/// Reference counting realizes the exactly-once release rule: the last
/// owner to drop its handle frees the object, and the type system rules
/// out a second release. Mutation goes through [`ObjectRef::borrow_mut`]
/// and is only performed by the defined conversion and store paths.
#[derive(Debug, Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Allocates a new shared object.
    #[must_use]
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// Borrows the object immutably.
    ///
    /// # Panics
    ///
    /// Panics if the object is mutably borrowed, which cannot happen
    /// under the single-walk, non-reentrant execution model.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Borrows the object mutably. Same panic conditions as
    /// [`ObjectRef::borrow`].
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    /// Returns the kind tag without holding a borrow.
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.borrow().object_type()
    }

    /// Whether two handles designate the same underlying object.
    #[must_use]
    pub fn same_object(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this object, including this one.
    ///
    /// Exposed for allocate/release balance checks in embedder tests.
    #[must_use]
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

/// A raw entry on the evaluation stack, before operand resolution.
#[derive(Debug, Clone)]
pub enum Operand {
    /// An owned (reference-counted) object, freshly produced by a
    /// previous opcode, a conversion, or a constant in the bytecode.
    Value(ObjectRef),
    /// A borrowed handle to a named object; the namespace retains
    /// ownership.
    Node(NodeHandle),
}

impl Operand {
    /// Returns the object handle if this operand holds a value.
    #[must_use]
    pub fn value(&self) -> Option<&ObjectRef> {
        match self {
            Self::Value(obj) => Some(obj),
            Self::Node(_) => None,
        }
    }
}
