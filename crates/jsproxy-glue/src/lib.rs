//! # jsproxy glue
//!
//! Proxy handlers whose behavior comes from foreign trap tables, and the
//! flat C surface around them.
//!
//! A [`ProxyTraps`] table holds one nullable function pointer per proxy
//! operation. [`TrapProxyHandler`] calls the pointer when it is filled and
//! its base handler when it is null:
//!
//! - [`ForwardingProxyHandler`]: null traps succeed without effect
//! - [`WrapperProxyHandler`]: null traps forward to the wrapped target
//!
//! Optional results cross the boundary flattened, see [`maybe`].
//!
//! # Example
//!
//! ```
//! use jsproxy_glue::{ProxyTraps, WrapperProxyHandler};
//! use jsproxy_host::{Context, ProxyOptions, Value};
//! use std::rc::Rc;
//!
//! let mut cx = Context::new();
//! let target = cx.new_object();
//! // SAFETY: the table has no filled slots
//! let handler = unsafe { WrapperProxyHandler::wrapper(ProxyTraps::default()) };
//! let proxy = cx.new_proxy(Rc::new(handler), Value::object(target), None, ProxyOptions::new());
//!
//! cx.set_property(proxy, "x", Value::int32(1)).unwrap();
//! assert_eq!(cx.get_property(target, "x").unwrap(), Value::int32(1));
//! ```
//!
//! # Thread Safety
//!
//! Handlers hold raw pointers and are `!Send` and `!Sync`, like the
//! context they are installed on.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod adapter;
pub mod ffi;
pub mod id_vector;
pub mod job_queue;
pub mod maybe;
pub mod principals;
pub mod traps;

pub use adapter::{ForwardingProxyHandler, TrapProxyHandler, WrapperProxyHandler};
pub use ffi::HandlerRef;
pub use job_queue::{ForeignJobQueue, JobQueueTraps};
pub use maybe::{FfiMaybe, read_maybe, write_maybe};
pub use principals::{ForeignPrincipals, PrincipalsCallbacks};
pub use traps::ProxyTraps;
