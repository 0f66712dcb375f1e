//! Wrap Dispatch: class-keyed constructors for host wrappers.
//!
//! Every foreign class that can cross into host code registers one
//! [`WrapFn`]. [`dispatch`] reads the class off an object and calls the
//! function registered for exactly that class. There is no fallback to a
//! parent class: an object whose class has no registration is a binding
//! defect, and dispatch panics with a [`LookupError`] message.
//!
//! # Thread Safety
//!
//! Registrations may happen at any time, from any thread, concurrently with
//! lookups. The table is a [`SnapshotRegistry`], so each registration
//! publishes a complete new map and lookups always see a complete map.
//!
//! # Example
//!
//! ```
//! use clownfish::host_object;
//! use clownfish::registry::{self, HostObject};
//! use clownfish::runtime::{Class, class, make_obj};
//! use std::sync::OnceLock;
//!
//! struct Point;
//!
//! fn point_class() -> &'static Class {
//!     static CLASS: OnceLock<&'static Class> = OnceLock::new();
//!     CLASS.get_or_init(|| Class::define::<Point>("Geo::Point", &class::OBJ).unwrap())
//! }
//!
//! host_object! {
//!     /// Host wrapper for `Geo::Point`.
//!     pub struct PointRef => point_class();
//! }
//!
//! PointRef::register();
//!
//! let obj = unsafe { clownfish::ObjRef::from_ptr(make_obj(point_class(), Point)) };
//! let host = registry::dispatch(obj);
//! assert!(host.downcast_ref::<PointRef>().is_some());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::LazyLock;

use clownfish_core::{Class, ClassId};
use clownfish_registry::SnapshotRegistry;

use crate::error::LookupError;
use crate::obj_ref::ObjRef;

/// A host wrapper around one foreign object.
///
/// Implemented by every type a [`WrapFn`] produces. The [`host_object!`]
/// macro generates implementations.
///
/// [`host_object!`]: crate::host_object
pub trait HostObject: Any + Send + Sync + fmt::Debug {
    /// The claim this wrapper holds.
    fn obj_ref(&self) -> &ObjRef;

    fn into_obj_ref(self: Box<Self>) -> ObjRef;

    fn as_any(&self) -> &dyn Any;

    /// Class of the wrapped object.
    fn class(&self) -> &'static Class {
        self.obj_ref().class()
    }
}

impl dyn HostObject {
    pub fn is<T: HostObject>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: HostObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Recover the concrete wrapper type, or give the box back unchanged.
    pub fn downcast<T: HostObject>(self: Box<Self>) -> Result<Box<T>, Box<dyn HostObject>> {
        if self.is::<T>() {
            let raw = Box::into_raw(self) as *mut T;
            // SAFETY: the concrete type was just checked.
            Ok(unsafe { Box::from_raw(raw) })
        } else {
            Err(self)
        }
    }

    /// A new wrapper holding its own claim on the same object.
    pub fn share(&self) -> Box<dyn HostObject> {
        dispatch(self.obj_ref().clone())
    }
}

/// Constructor for the host wrapper of one class.
///
/// Receives an owned claim on a non-null object whose class is exactly the
/// registered class.
pub type WrapFn = fn(ObjRef) -> Box<dyn HostObject>;

static WRAP_FNS: LazyLock<SnapshotRegistry<ClassId, (&'static Class, WrapFn)>> =
    LazyLock::new(SnapshotRegistry::new);

/// Register `wrap` as the constructor for objects of exactly `class`.
///
/// A later registration for the same class replaces the earlier one. Returns
/// `true` if `class` had no registration before.
pub fn register_wrap_fn(class: &'static Class, wrap: WrapFn) -> bool {
    let added = WRAP_FNS.insert(class.id(), (class, wrap)).is_none();
    log::debug!(
        "{} wrap function for {}",
        if added { "registered" } else { "replaced" },
        class.name()
    );
    added
}

/// Register several wrap functions under one publication.
///
/// Returns the number of classes that had no registration before.
pub fn register_wrap_fns<I>(entries: I) -> usize
where
    I: IntoIterator<Item = (&'static Class, WrapFn)>,
{
    let added = WRAP_FNS.insert_all(
        entries
            .into_iter()
            .map(|(class, wrap)| (class.id(), (class, wrap))),
    );
    log::debug!("registered {added} new wrap functions");
    added
}

/// The wrap function registered for exactly `class`.
pub fn lookup(class: &Class) -> Option<WrapFn> {
    WRAP_FNS.get(&class.id()).map(|(_, wrap)| wrap)
}

/// Every class with a registered wrap function, in unspecified order.
pub fn registered_classes() -> Vec<&'static Class> {
    WRAP_FNS.snapshot().values().map(|(class, _)| *class).collect()
}

/// Build the host wrapper for `obj`.
///
/// # Panics
///
/// Panics with a [`LookupError`] message if no wrap function is registered
/// for the exact class of `obj`.
pub fn dispatch(obj: ObjRef) -> Box<dyn HostObject> {
    crate::init();
    let class = obj.class();
    match lookup(class) {
        Some(wrap) => wrap(obj),
        None => {
            let err = LookupError {
                class: class.name().to_owned(),
            };
            log::error!("{err}");
            drop(obj);
            panic!("{err}")
        }
    }
}

/// Declare a host wrapper type for one foreign class.
///
/// Generates a tuple struct around an [`ObjRef`](crate::ObjRef), its
/// [`HostObject`] implementation, a `TryFrom<ObjRef>` conversion that checks
/// the class chain, and `wrap_fn`/`register` helpers for the wrap registry.
/// The class expression must evaluate to a `&'static Class`.
#[macro_export]
macro_rules! host_object {
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $class:expr;) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name($crate::ObjRef);

        impl $name {
            /// The foreign class this wrapper is registered for.
            pub fn foreign_class() -> &'static $crate::runtime::Class {
                $class
            }

            /// Wrap function for the dispatch registry.
            pub fn wrap_fn(obj: $crate::ObjRef) -> ::std::boxed::Box<dyn $crate::registry::HostObject> {
                ::std::boxed::Box::new(Self(obj))
            }

            /// Register [`Self::wrap_fn`] for [`Self::foreign_class`].
            pub fn register() -> bool {
                $crate::registry::register_wrap_fn(Self::foreign_class(), Self::wrap_fn)
            }

            pub fn obj(&self) -> &$crate::ObjRef {
                &self.0
            }

            pub fn into_obj_ref(self) -> $crate::ObjRef {
                self.0
            }
        }

        impl $crate::registry::HostObject for $name {
            fn obj_ref(&self) -> &$crate::ObjRef {
                &self.0
            }

            fn into_obj_ref(self: ::std::boxed::Box<Self>) -> $crate::ObjRef {
                self.0
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl ::std::convert::TryFrom<$crate::ObjRef> for $name {
            type Error = $crate::ConversionError;

            fn try_from(obj: $crate::ObjRef) -> ::std::result::Result<Self, Self::Error> {
                let required = Self::foreign_class();
                if obj.is_a(required) {
                    Ok(Self(obj))
                } else {
                    Err($crate::ConversionError::ClassMismatch {
                        found: obj.class().name().to_owned(),
                        required: required.name().to_owned(),
                    })
                }
            }
        }

        impl ::std::convert::From<$name> for $crate::Value {
            fn from(wrapper: $name) -> Self {
                $crate::Value::Object(::std::boxed::Box::new(wrapper))
            }
        }
    };
}
