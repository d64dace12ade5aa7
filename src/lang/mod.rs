//! The language model: classes, methods, and the loaded program.

pub mod hierarchy;
mod petgraph;
pub mod references;

pub use hierarchy::ClassHierarchy;

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::{
    ir::{MethodIr, ResultMap},
    types::method_descriptor::MethodDescriptor,
};

use references::{ClassRef, MethodRef, Subsignature};

bitflags! {
    /// The access flags of a class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClassAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `final`; no subclasses allowed.
        const FINAL = 0x0010;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared `abstract`; must not be instantiated.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an `enum` class.
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// The access flags of a method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `private`; accessible only within the defining class.
        const PRIVATE = 0x0002;
        /// Declared `protected`; may be accessed within subclasses.
        const PROTECTED = 0x0004;
        /// Declared `static`.
        const STATIC = 0x0008;
        /// Declared `final`; must not be overridden.
        const FINAL = 0x0010;
        /// Declared `abstract`; no implementation is provided.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
    }
}

/// A class or interface of the analyzed program.
#[derive(Debug)]
pub struct Class {
    /// The binary name of the class.
    pub binary_name: String,
    /// The access flags of the class.
    pub access_flags: ClassAccessFlags,
    /// The superclass of the class, absent for the root class and for
    /// interfaces.
    pub super_class: Option<ClassRef>,
    /// The interfaces directly implemented (for classes) or extended (for
    /// interfaces).
    pub interfaces: Vec<ClassRef>,
    /// The methods declared by the class.
    pub methods: Vec<Method>,
}

impl Class {
    /// Creates a [`ClassRef`] referring to the class.
    #[must_use]
    pub fn make_ref(&self) -> ClassRef {
        ClassRef {
            binary_name: self.binary_name.clone(),
        }
    }

    /// Gets a declared method of the class by its subsignature.
    ///
    /// Inherited methods are not considered; resolution across the hierarchy
    /// is the business of [`dispatch`](crate::analysis::call_graph::dispatch).
    #[must_use]
    pub fn declared_method(&self, subsignature: &Subsignature) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == subsignature.name && m.descriptor == subsignature.descriptor)
    }

    /// Checks if the class is an interface.
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    /// Checks if the class is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::ABSTRACT)
    }
}

/// A method of the analyzed program.
#[derive(Debug)]
pub struct Method {
    /// The access flags of the method.
    pub access_flags: MethodAccessFlags,
    /// The name of the method.
    pub name: String,
    /// The descriptor of the method.
    pub descriptor: MethodDescriptor,
    /// The class declaring the method.
    pub owner: ClassRef,
    /// The body of the method, absent for abstract and native methods.
    pub body: Option<MethodIr>,
}

impl Method {
    /// Creates a [`MethodRef`] referring to the method.
    #[must_use]
    pub fn make_ref(&self) -> MethodRef {
        MethodRef {
            owner: self.owner.clone(),
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
        }
    }

    /// The subsignature of the method.
    #[must_use]
    pub fn subsignature(&self) -> Subsignature {
        Subsignature {
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
        }
    }

    /// Checks if the method is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }

    /// Checks if the method is static.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }
}

/// The set of loaded classes together with the designated entry methods.
///
/// The program is read-only after construction; analyses publish their
/// program-level results into [`Program::results`].
#[derive(Debug)]
pub struct Program {
    classes: BTreeMap<String, Class>,
    entries: Vec<MethodRef>,
    results: ResultMap,
}

impl Program {
    /// Creates a program from loaded classes and entry methods.
    #[must_use]
    pub fn new(classes: impl IntoIterator<Item = Class>, entries: Vec<MethodRef>) -> Self {
        let classes = classes
            .into_iter()
            .map(|c| (c.binary_name.clone(), c))
            .collect();
        Self {
            classes,
            entries,
            results: ResultMap::new(),
        }
    }

    /// Looks up a class by reference.
    #[must_use]
    pub fn class(&self, class_ref: &ClassRef) -> Option<&Class> {
        self.classes.get(&class_ref.binary_name)
    }

    /// Returns an iterator over the loaded classes.
    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    /// Looks up a method by reference, in its declaring class only.
    #[must_use]
    pub fn method(&self, method_ref: &MethodRef) -> Option<&Method> {
        self.class(&method_ref.owner)?
            .declared_method(&method_ref.subsignature())
    }

    /// The entry methods anchoring reachability.
    #[must_use]
    pub fn entries(&self) -> &[MethodRef] {
        &self.entries
    }

    /// The program-level analysis results, keyed by analysis id.
    #[must_use]
    pub fn results(&self) -> &ResultMap {
        &self.results
    }
}
