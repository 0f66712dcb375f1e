//! Host bridge for the Clownfish object runtime.
//!
//! Lets Rust code hold foreign objects safely, convert values across the
//! boundary, and see foreign exceptions as ordinary `Result` errors.
//!
//! ## Layout
//!
//! ```text
//! obj_ref   - ObjRef: Wrap / Share / Release of reference-count claims
//! registry  - HostObject, WrapFn, exact-class wrap dispatch
//! classes   - host wrappers for the built-in classes
//! value     - Value, the closed set of host-side shapes
//! convert   - host_to_foreign / foreign_to_host, IntoValue / FromValue
//! trap      - run_trapped / throw_foreign and the runtime's raise/trap hooks
//! ```
//!
//! ## Example
//!
//! ```
//! use clownfish::{Value, foreign_to_host, run_trapped, to_foreign};
//!
//! clownfish::init();
//!
//! let obj = to_foreign(vec!["a", "b"], None, false).unwrap();
//! assert_eq!(
//!     foreign_to_host(obj.as_ref()),
//!     Value::Seq(vec![Value::from("a"), Value::from("b")])
//! );
//!
//! let err = run_trapped::<()>(|| clownfish::throw_foreign("boom")).unwrap_err();
//! assert_eq!(err.message(), "boom");
//! ```

use std::sync::Once;

pub mod classes;
mod convert;
pub mod error;
mod obj_ref;
pub mod registry;
mod trap;
pub mod value;

/// The underlying runtime, for binding code that needs raw handles.
pub use clownfish_core as runtime;

pub use convert::{FromValue, IntoValue, foreign_to_host, from_foreign, host_to_foreign, to_foreign};
pub use error::{BridgeError, BridgeResult, ConversionError, LookupError, RangeError, TrappedError};
pub use obj_ref::ObjRef;
pub use registry::{HostObject, WrapFn, dispatch, register_wrap_fn};
pub use trap::{run_trapped, throw_err, throw_foreign};
pub use value::Value;

static INIT: Once = Once::new();

/// Bootstrap the bridge.
///
/// Installs the raise/trap hooks, brings up the runtime's class hierarchy,
/// and registers wrap functions for every built-in class. Every other entry
/// point calls this first, so explicit calls are only needed to control when
/// the work happens. Side effects occur once per process.
pub fn init() {
    INIT.call_once(|| {
        if !clownfish_core::err::install_hooks(trap::hooks()) {
            clownfish_core::err::warn_mess("clownfish raise/trap hooks were already installed");
        }
        clownfish_core::bootstrap();
        classes::register_builtins();
        log::debug!("clownfish bridge initialized");
    });
}

pub mod prelude {
    pub use crate::classes::*;
    pub use crate::{
        BridgeError, BridgeResult, FromValue, HostObject, IntoValue, ObjRef, Value,
        foreign_to_host, from_foreign, host_to_foreign, run_trapped, throw_foreign, to_foreign,
    };
}
