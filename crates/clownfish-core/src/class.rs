//! Class descriptors and the class-name registry.
//!
//! A [`Class`] identifies one foreign type. Identity is the descriptor's
//! address, never its name: two descriptors with the same name would be two
//! different classes, which is why [`Class::define`] refuses to create a
//! second descriptor for a name that is already taken.
//!
//! Classes form a single-inheritance tree rooted at [`OBJ`]. Built-in classes
//! are statics; extension classes are created at runtime and live for the rest
//! of the process.
//!
//! # Example
//!
//! ```
//! use clownfish_core::class::{self, Class};
//!
//! struct Point { x: i64, y: i64 }
//!
//! let point = Class::define::<Point>("Geo::Point", &class::OBJ).unwrap();
//! assert!(point.is_subclass_of(&class::OBJ));
//! assert!(!class::OBJ.is_subclass_of(point));
//! assert!(std::ptr::eq(Class::fetch("Geo::Point").unwrap(), point));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use bitflags::bitflags;
use clownfish_registry::SnapshotRegistry;
use thiserror::Error;

use crate::builtins::{
    blob::BlobIvars, boolean::BooleanIvars, bytebuf::ByteBufIvars, float::FloatIvars,
    hash::HashIvars, integer::IntegerIvars, string::StringIvars, vector::VectorIvars,
};
use crate::err::ErrIvars;
use crate::obj::alloc_size_of;

bitflags! {
    /// Class behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassFlags: u8 {
        /// Instances are never destroyed; refcount operations are no-ops.
        const IMMORTAL = 1 << 0;
        /// The class cannot be subclassed.
        const FINAL = 1 << 1;
    }
}

/// Errors raised while defining classes or aliases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassError {
    /// The parent class does not allow subclasses.
    #[error("class {class} cannot inherit from final class {parent}")]
    FinalParent { class: String, parent: String },

    /// The name is already bound to an incompatible class.
    #[error("class name {name} is already taken by an incompatible class")]
    Conflict { name: String },

    /// The alias is already bound to another class.
    #[error("alias {alias} is already bound to class {existing}")]
    AliasTaken { alias: String, existing: String },
}

/// Identity of a class descriptor.
///
/// Derived from the descriptor's address, so it is only meaningful within the
/// current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

/// Descriptor of one foreign type.
pub struct Class {
    name: Cow<'static, str>,
    parent: Option<&'static Class>,
    flags: ClassFlags,
    obj_alloc_size: usize,
}

impl Class {
    const fn builtin(
        name: &'static str,
        parent: Option<&'static Class>,
        flags: ClassFlags,
        obj_alloc_size: usize,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            parent,
            flags,
            obj_alloc_size,
        }
    }

    /// Fully qualified class name, e.g. `Clownfish::String`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, `None` only for [`OBJ`].
    pub fn parent(&self) -> Option<&'static Class> {
        self.parent
    }

    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    /// Size in bytes of one object of this class, header included.
    pub fn obj_alloc_size(&self) -> usize {
        self.obj_alloc_size
    }

    pub fn id(&self) -> ClassId {
        ClassId(self as *const Class as usize)
    }

    /// Whether `self` is `other` or a descendant of it.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.parent;
        }
        false
    }

    /// Ancestors of this class, starting with the class itself.
    pub fn ancestors(&'static self) -> impl Iterator<Item = &'static Class> {
        std::iter::successors(Some(self), |class| class.parent)
    }

    /// Look up a class by name or alias.
    pub fn fetch(name: &str) -> Option<&'static Class> {
        CLASSES.get(name)
    }

    /// Define an extension class whose instances carry ivars of type `T`.
    ///
    /// Defining a name that already exists with the same parent and layout
    /// returns the existing descriptor.
    pub fn define<T: 'static>(
        name: &str,
        parent: &'static Class,
    ) -> Result<&'static Class, ClassError> {
        Self::define_with_flags::<T>(name, parent, ClassFlags::empty())
    }

    /// [`Class::define`] with explicit flags.
    pub fn define_with_flags<T: 'static>(
        name: &str,
        parent: &'static Class,
        flags: ClassFlags,
    ) -> Result<&'static Class, ClassError> {
        if parent.flags.contains(ClassFlags::FINAL) {
            return Err(ClassError::FinalParent {
                class: name.to_owned(),
                parent: parent.name().to_owned(),
            });
        }
        let obj_alloc_size = alloc_size_of::<T>();
        let class = CLASSES.get_or_insert_with(name.to_owned(), || {
            log::debug!("defining class {name} (parent {})", parent.name());
            let class: &'static Class = Box::leak(Box::new(Class {
                name: Cow::Owned(name.to_owned()),
                parent: Some(parent),
                flags,
                obj_alloc_size,
            }));
            class
        });
        let compatible = class.parent.is_some_and(|p| std::ptr::eq(p, parent))
            && class.flags == flags
            && class.obj_alloc_size == obj_alloc_size;
        if compatible {
            Ok(class)
        } else {
            Err(ClassError::Conflict {
                name: name.to_owned(),
            })
        }
    }

    /// Bind an additional name to this class.
    pub fn add_alias(&'static self, alias: &str) -> Result<(), ClassError> {
        if CLASSES.register(alias.to_owned(), self) {
            return Ok(());
        }
        match CLASSES.get(alias) {
            Some(existing) if std::ptr::eq(existing, self) => Ok(()),
            existing => Err(ClassError::AliasTaken {
                alias: alias.to_owned(),
                existing: existing.map(|c| c.name().to_owned()).unwrap_or_default(),
            }),
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.map(Class::name))
            .field("flags", &self.flags)
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Built-in classes
// ============================================================================

/// Universal base class.
pub static OBJ: Class = Class::builtin(
    "Clownfish::Obj",
    None,
    ClassFlags::empty(),
    alloc_size_of::<()>(),
);

pub static STRING: Class = Class::builtin(
    "Clownfish::String",
    Some(&OBJ),
    ClassFlags::empty(),
    alloc_size_of::<StringIvars>(),
);

pub static BLOB: Class = Class::builtin(
    "Clownfish::Blob",
    Some(&OBJ),
    ClassFlags::empty(),
    alloc_size_of::<BlobIvars>(),
);

pub static BYTEBUF: Class = Class::builtin(
    "Clownfish::ByteBuf",
    Some(&OBJ),
    ClassFlags::empty(),
    alloc_size_of::<ByteBufIvars>(),
);

pub static INTEGER: Class = Class::builtin(
    "Clownfish::Integer",
    Some(&OBJ),
    ClassFlags::FINAL,
    alloc_size_of::<IntegerIvars>(),
);

pub static FLOAT: Class = Class::builtin(
    "Clownfish::Float",
    Some(&OBJ),
    ClassFlags::FINAL,
    alloc_size_of::<FloatIvars>(),
);

pub static BOOLEAN: Class = Class::builtin(
    "Clownfish::Boolean",
    Some(&OBJ),
    ClassFlags::IMMORTAL.union(ClassFlags::FINAL),
    alloc_size_of::<BooleanIvars>(),
);

pub static VECTOR: Class = Class::builtin(
    "Clownfish::Vector",
    Some(&OBJ),
    ClassFlags::empty(),
    alloc_size_of::<VectorIvars>(),
);

pub static HASH: Class = Class::builtin(
    "Clownfish::Hash",
    Some(&OBJ),
    ClassFlags::empty(),
    alloc_size_of::<HashIvars>(),
);

pub static ERR: Class = Class::builtin(
    "Clownfish::Err",
    Some(&OBJ),
    ClassFlags::empty(),
    alloc_size_of::<ErrIvars>(),
);

/// Every built-in class, base first.
pub fn builtins() -> [&'static Class; 10] {
    [
        &OBJ, &STRING, &BLOB, &BYTEBUF, &INTEGER, &FLOAT, &BOOLEAN, &VECTOR, &HASH, &ERR,
    ]
}

static CLASSES: LazyLock<SnapshotRegistry<String, &'static Class>> = LazyLock::new(|| {
    let registry = SnapshotRegistry::new();
    registry.insert_all(builtins().map(|class| (class.name().to_owned(), class)));
    registry
});

/// Number of names currently bound in the class registry, aliases included.
pub fn registered_count() -> usize {
    CLASSES.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_descend_from_obj() {
        for class in builtins() {
            assert!(class.is_subclass_of(&OBJ), "{class}");
        }
        assert!(OBJ.parent().is_none());
    }

    #[test]
    fn identity_is_by_address() {
        assert_eq!(STRING, STRING);
        assert_ne!(STRING, BLOB);
        assert_ne!(STRING.id(), BLOB.id());
    }

    #[test]
    fn fetch_finds_builtins() {
        let string = Class::fetch("Clownfish::String").unwrap();
        assert!(std::ptr::eq(string, &STRING));
        assert!(Class::fetch("Clownfish::Nope").is_none());
    }

    #[test]
    fn define_is_idempotent() {
        struct Ivars(#[allow(dead_code)] u64);
        let first = Class::define::<Ivars>("Test::Twice", &OBJ).unwrap();
        let second = Class::define::<Ivars>("Test::Twice", &OBJ).unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn define_rejects_conflicting_parent() {
        Class::define::<()>("Test::Conflicted", &OBJ).unwrap();
        let err = Class::define::<()>("Test::Conflicted", &HASH).unwrap_err();
        assert!(matches!(err, ClassError::Conflict { .. }));
    }

    #[test]
    fn define_rejects_final_parent() {
        let err = Class::define::<()>("Test::BigInteger", &INTEGER).unwrap_err();
        assert_eq!(
            err,
            ClassError::FinalParent {
                class: "Test::BigInteger".into(),
                parent: "Clownfish::Integer".into(),
            }
        );
    }

    #[test]
    fn subclass_chain() {
        let parent = Class::define::<()>("Test::Parent", &OBJ).unwrap();
        let child = Class::define::<()>("Test::Child", parent).unwrap();
        assert!(child.is_subclass_of(parent));
        assert!(child.is_subclass_of(&OBJ));
        assert!(!parent.is_subclass_of(child));
        let names: Vec<_> = child.ancestors().map(Class::name).collect();
        assert_eq!(names, ["Test::Child", "Test::Parent", "Clownfish::Obj"]);
    }

    #[test]
    fn aliases() {
        let class = Class::define::<()>("Test::Aliased", &OBJ).unwrap();
        class.add_alias("Test::AliasedOld").unwrap();
        class.add_alias("Test::AliasedOld").unwrap();
        assert!(std::ptr::eq(Class::fetch("Test::AliasedOld").unwrap(), class));

        let err = STRING.add_alias("Test::AliasedOld").unwrap_err();
        assert!(matches!(err, ClassError::AliasTaken { .. }));
    }
}
