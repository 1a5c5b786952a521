//! Mark-sweep collection over the context heap
//!
//! Roots are the intrinsic objects, the pending exception and every object
//! registered with [`Context::add_root`]. Proxy private values and reserved
//! slots are traced by the collector; anything else a handler keeps alive
//! must be reported from [`ProxyHandler::trace`](crate::ProxyHandler::trace).

use std::rc::Rc;

use tracing::debug;

use crate::context::Context;
use crate::handler::ProxyHandler;
use crate::object::{ObjectId, ObjectKind, Property};
use crate::value::Value;

/// Collects edges during marking
#[derive(Debug, Default)]
pub struct Tracer {
    worklist: Vec<ObjectId>,
    edges: usize,
}

impl Tracer {
    /// Create an empty tracer
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a value edge; non-objects are ignored
    pub fn trace_value(&mut self, value: Value) {
        if let Some(obj) = value.as_object() {
            self.trace_object(obj);
        }
    }

    /// Report an object edge
    pub fn trace_object(&mut self, obj: ObjectId) {
        self.edges += 1;
        self.worklist.push(obj);
    }

    /// Edges reported so far
    pub fn edges(&self) -> usize {
        self.edges
    }

    fn pop(&mut self) -> Option<ObjectId> {
        self.worklist.pop()
    }
}

/// GC statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    /// Number of collections
    pub collections: u64,
    /// Objects reclaimed in the last collection
    pub last_reclaimed: usize,
    /// Objects reclaimed over the context's lifetime
    pub total_reclaimed: usize,
    /// Objects marked in the last collection
    pub last_marked: usize,
}

impl Context {
    /// Keep `obj` alive across collections. Roots are counted.
    pub fn add_root(&mut self, obj: ObjectId) {
        *self.roots.entry(obj).or_insert(0) += 1;
    }

    /// Drop one root registration; `false` if `obj` was not rooted
    pub fn remove_root(&mut self, obj: ObjectId) -> bool {
        match self.roots.get_mut(&obj) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.roots.remove(&obj);
                true
            }
            None => false,
        }
    }

    /// Whether `obj` is still allocated
    pub fn is_alive(&self, obj: ObjectId) -> bool {
        self.heap.get(obj).is_some()
    }

    /// Number of live objects
    pub fn live_objects(&self) -> usize {
        self.heap.live()
    }

    /// Collection statistics
    pub fn gc_stats(&self) -> GcStats {
        self.gc
    }

    /// Collect if `gc_threshold` allocations happened since the last
    /// collection. Returns the number of reclaimed objects.
    pub fn maybe_gc(&mut self) -> usize {
        let threshold = self.options.gc_threshold;
        if threshold > 0 && self.heap.allocated_since_gc >= threshold {
            self.collect_garbage()
        } else {
            0
        }
    }

    /// Run a full collection. Unreachable proxies are finalized before any
    /// unreachable object is freed. Returns the number of reclaimed objects.
    pub fn collect_garbage(&mut self) -> usize {
        for cell in self.heap.cells_mut() {
            cell.marked = false;
        }

        let mut tracer = Tracer::new();
        tracer.trace_object(self.object_prototype());
        tracer.trace_object(self.function_prototype());
        tracer.trace_object(self.global());
        if let Some(exception) = self.pending_exception() {
            tracer.trace_value(exception);
        }
        for &root in self.roots.keys() {
            tracer.trace_object(root);
        }

        let marked = self.mark(&mut tracer);

        let dead: Vec<ObjectId> = self
            .heap
            .ids()
            .into_iter()
            .filter(|&obj| self.heap.get(obj).is_some_and(|cell| !cell.marked))
            .collect();

        for &obj in &dead {
            if let Some(handler) = self.proxy_handler(obj) {
                handler.finalize(self, obj);
            }
        }
        let mut reclaimed = 0;
        for obj in dead {
            if self.heap.free(obj).is_some() {
                reclaimed += 1;
            }
        }

        self.heap.allocated_since_gc = 0;
        self.gc.collections += 1;
        self.gc.last_marked = marked;
        self.gc.last_reclaimed = reclaimed;
        self.gc.total_reclaimed += reclaimed;
        debug!(
            marked,
            reclaimed,
            live = self.heap.live(),
            edges = tracer.edges(),
            "gc cycle"
        );
        reclaimed
    }

    fn mark(&mut self, tracer: &mut Tracer) -> usize {
        let mut marked = 0;
        while let Some(obj) = tracer.pop() {
            let Some(cell) = self.heap.get_mut(obj) else {
                continue;
            };
            if cell.marked {
                continue;
            }
            cell.marked = true;
            marked += 1;

            if let Some(proto) = cell.prototype {
                tracer.trace_object(proto);
            }
            for prop in cell.properties.values() {
                match *prop {
                    Property::Data { value, .. } => tracer.trace_value(value),
                    Property::Accessor { getter, setter, .. } => {
                        getter.into_iter().chain(setter).for_each(|o| tracer.trace_object(o));
                    }
                }
            }
            let handler: Option<Rc<dyn ProxyHandler>> = match &cell.kind {
                ObjectKind::Boxed(value) => {
                    tracer.trace_value(*value);
                    None
                }
                ObjectKind::Proxy(data) => {
                    tracer.trace_value(data.private);
                    data.reserved.iter().for_each(|&v| tracer.trace_value(v));
                    Some(data.handler.clone())
                }
                ObjectKind::Ordinary | ObjectKind::Function { .. } | ObjectKind::Error { .. } => {
                    None
                }
            };
            if let Some(handler) = handler {
                handler.trace(tracer, obj);
            }
        }
        marked
    }
}
