//! Test double for the walk context.
//!
//! `MockWalk` backs the externalized primitives with plain maps and
//! logs: a namespace of handle-to-object entries, method frame slots,
//! and recorded store/notify/sync calls for assertions.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::ExecError;
use crate::context::{SyncOutcome, WalkContext};
use crate::object::{
    EventObject, MutexObject, NodeHandle, Object, ObjectRef, Operand, Reference, SyncHandle,
};

pub(crate) struct MockWalk {
    /// Namespace: node handle value to attached object.
    pub nodes: BTreeMap<u32, ObjectRef>,
    /// Method locals (`Local0`-`Local7`).
    pub locals: [Option<ObjectRef>; 8],
    /// Method arguments (`Arg0`-`Arg6`).
    pub args: [Option<ObjectRef>; 7],
    /// Every store call, in order: the value and the target it went to.
    pub stores: Vec<(ObjectRef, Operand)>,
    /// Every queued notification, in order.
    pub notifies: Vec<(NodeHandle, u64)>,
    /// Outcome the next acquire call reports.
    pub acquire_outcome: SyncOutcome,
    /// Outcome the next wait call reports.
    pub wait_outcome: SyncOutcome,
    /// Recorded acquire calls: sync handle and timeout.
    pub acquire_calls: Vec<(SyncHandle, u16)>,
    /// Recorded wait calls: sync handle and timeout.
    pub wait_calls: Vec<(SyncHandle, u64)>,
}

impl MockWalk {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            locals: [const { None }; 8],
            args: [const { None }; 7],
            stores: Vec::new(),
            notifies: Vec::new(),
            acquire_outcome: SyncOutcome::Completed,
            wait_outcome: SyncOutcome::Completed,
            acquire_calls: Vec::new(),
            wait_calls: Vec::new(),
        }
    }

    /// Attaches an object to a fresh namespace node.
    pub fn add_node(&mut self, id: u32, object: Object) -> NodeHandle {
        self.nodes.insert(id, ObjectRef::new(object));
        NodeHandle(id)
    }

    fn node_value(&self, node: NodeHandle) -> Result<ObjectRef, ExecError> {
        self.nodes.get(&node.0).cloned().ok_or(ExecError::Internal)
    }

    fn slot_value(slots: &[Option<ObjectRef>], index: u8) -> Result<ObjectRef, ExecError> {
        slots
            .get(usize::from(index))
            .and_then(Option::as_ref)
            .cloned()
            .ok_or(ExecError::Internal)
    }
}

impl WalkContext for MockWalk {
    fn resolve_to_value(&mut self, operand: &Operand) -> Result<ObjectRef, ExecError> {
        let obj = match operand {
            Operand::Node(node) => return self.node_value(*node),
            Operand::Value(obj) => obj,
        };

        // References chase to the value they designate; a plain value
        // resolves to the same object, not a copy.
        let reference = match &*obj.borrow() {
            Object::Reference(reference) => reference.clone(),
            _ => return Ok(obj.clone()),
        };
        match reference {
            Reference::Name(node) | Reference::RefOf(node) => self.node_value(node),
            Reference::Arg(slot) => Self::slot_value(&self.args, slot),
            Reference::Local(slot) => Self::slot_value(&self.locals, slot),
            Reference::Index { .. } => reference.dereference().ok_or(ExecError::Internal),
            Reference::Debug | Reference::Table(_) => Err(ExecError::Internal),
        }
    }

    fn store(&mut self, value: &ObjectRef, target: &Operand) -> Result<(), ExecError> {
        self.stores.push((value.clone(), target.clone()));
        Ok(())
    }

    fn enqueue_notify(&mut self, node: NodeHandle, value: u64) -> Result<(), ExecError> {
        self.notifies.push((node, value));
        Ok(())
    }

    fn acquire_mutex(
        &mut self,
        mutex: &MutexObject,
        timeout_ms: u16,
    ) -> Result<SyncOutcome, ExecError> {
        self.acquire_calls.push((mutex.handle, timeout_ms));
        Ok(self.acquire_outcome)
    }

    fn wait_event(&mut self, event: &EventObject, timeout_ms: u64) -> Result<SyncOutcome, ExecError> {
        self.wait_calls.push((event.handle, timeout_ms));
        Ok(self.wait_outcome)
    }
}
