//! # jsproxy host
//!
//! A small object engine that proxy handlers dispatch into: NaN-boxed
//! values, an object heap addressed by handles, ordinary property
//! semantics, proxy objects, and a pending-exception channel.
//!
//! ## Design Principles
//!
//! - **Handles, not pointers**: objects are [`ObjectId`]s into the
//!   context heap, so every value that crosses a C boundary is plain data
//! - **Two failure channels**: [`JsResult`] says whether an operation
//!   failed, the [`Context`] says what was thrown
//! - **Single-threaded**: a context and everything it hands out stays on
//!   the thread that created it
//!
//! # Example
//!
//! ```
//! use jsproxy_host::{Context, ProxyOptions, Value, Wrapper};
//! use std::rc::Rc;
//!
//! let mut cx = Context::new();
//! let target = cx.new_object();
//! let proxy = cx.new_proxy(Rc::new(Wrapper), Value::object(target), None, ProxyOptions::new());
//!
//! cx.set_property(proxy, "answer", Value::int32(42)).unwrap();
//! assert_eq!(cx.get_property(target, "answer").unwrap(), Value::int32(42));
//! ```
//!
//! # Thread Safety
//!
//! [`Context`] is `!Send` and `!Sync`:
//!
//! ```compile_fail
//! use jsproxy_host::Context;
//! use std::thread;
//!
//! let cx = Context::new();
//! thread::spawn(move || {
//!     drop(cx); // Error: Context is !Send
//! });
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod atom;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod gc;
pub mod handler;
pub mod id;
pub mod job_queue;
pub mod object;
pub mod op_result;
mod ops;
pub mod principals;
pub mod value;

pub use atom::{Atom, SymbolId};
pub use config::ContextOptions;
pub use context::Context;
pub use descriptor::{PropertyAttributes, PropertyDescriptor};
pub use error::{ErrorKind, JsError, JsResult, Throw};
pub use gc::{GcStats, Tracer};
pub use handler::{BaseProxyHandler, NATIVE_CODE_SOURCE, OrdinaryPrototype, ProxyHandler, Wrapper};
pub use id::{IdVector, PropertyKey};
pub use job_queue::JobQueue;
pub use object::{ObjectId, ProxyOptions};
pub use op_result::{FailureCode, ObjectOpResult};
pub use ops::same_value;
pub use principals::{CloneWriter, Principals};
pub use value::Value;
