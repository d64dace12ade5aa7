//! References to program elements.

use crate::types::{field_type::FieldType, method_descriptor::MethodDescriptor};

/// A reference to a [`Class`](crate::lang::Class).
#[derive(Debug, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{binary_name}")]
pub struct ClassRef {
    /// The binary name of the class.
    pub binary_name: String,
}

impl ClassRef {
    /// Creates a new [`ClassRef`] from a binary name.
    pub fn new<S: Into<String>>(binary_name: S) -> Self {
        ClassRef {
            binary_name: binary_name.into(),
        }
    }
}

/// A reference to a field.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, derive_more::Display)]
#[display("{owner}.{name}")]
pub struct FieldRef {
    /// A reference to the class that declares the field.
    pub owner: ClassRef,
    /// The name of the field.
    pub name: String,
    /// The type of the field.
    pub field_type: FieldType,
}

/// A reference to a [`Method`](crate::lang::Method).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, derive_more::Display)]
#[display("{owner}::{name}")]
pub struct MethodRef {
    /// The reference to the class declaring the method.
    pub owner: ClassRef,
    /// The name of the method.
    pub name: String,
    /// The descriptor of the method.
    pub descriptor: MethodDescriptor,
}

impl MethodRef {
    /// The subsignature of the referenced method.
    #[must_use]
    pub fn subsignature(&self) -> Subsignature {
        Subsignature {
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
        }
    }
}

/// A method identity within a class: the name plus the parameter and return
/// types, excluding the declaring class.
///
/// Two methods in a subclass relation override each other iff their
/// subsignatures are equal.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, derive_more::Display)]
#[display("{name}{descriptor}")]
pub struct Subsignature {
    /// The name of the method.
    pub name: String,
    /// The descriptor of the method.
    pub descriptor: MethodDescriptor,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn subsignature_excludes_owner() {
        let descriptor: MethodDescriptor = "(I)I".parse().unwrap();
        let base = MethodRef {
            owner: ClassRef::new("A"),
            name: "m".into(),
            descriptor: descriptor.clone(),
        };
        let derived = MethodRef {
            owner: ClassRef::new("B"),
            name: "m".into(),
            descriptor,
        };
        assert_ne!(base, derived);
        assert_eq!(base.subsignature(), derived.subsignature());
    }
}
