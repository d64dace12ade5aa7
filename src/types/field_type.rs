//! Field and variable types.
use std::{fmt::Display, str::FromStr};

use crate::lang::references::ClassRef;

use super::method_descriptor::InvalidDescriptor;

/// A primitive type.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum PrimitiveType {
    /// The `boolean` type.
    Boolean,
    /// The `char` type.
    Char,
    /// The `float` type.
    Float,
    /// The `double` type.
    Double,
    /// The `byte` type.
    Byte,
    /// The `short` type.
    Short,
    /// The `int` type.
    Int,
    /// The `long` type.
    Long,
}

impl PrimitiveType {
    fn descriptor_str(self) -> &'static str {
        match self {
            Self::Boolean => "Z",
            Self::Char => "C",
            Self::Float => "F",
            Self::Double => "D",
            Self::Byte => "B",
            Self::Short => "S",
            Self::Int => "I",
            Self::Long => "J",
        }
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Char => write!(f, "char"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Byte => write!(f, "byte"),
            Self::Short => write!(f, "short"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
        }
    }
}

impl TryFrom<char> for PrimitiveType {
    type Error = InvalidDescriptor;

    fn try_from(descriptor: char) -> Result<Self, Self::Error> {
        match descriptor {
            'Z' => Ok(Self::Boolean),
            'C' => Ok(Self::Char),
            'F' => Ok(Self::Float),
            'D' => Ok(Self::Double),
            'B' => Ok(Self::Byte),
            'S' => Ok(Self::Short),
            'I' => Ok(Self::Int),
            'J' => Ok(Self::Long),
            _ => Err(InvalidDescriptor),
        }
    }
}

/// The type of a field, a formal parameter, or a local variable.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub enum FieldType {
    /// A primitive type.
    Base(PrimitiveType),
    /// A reference type (except arrays).
    Object(ClassRef),
    /// An array type.
    Array(Box<FieldType>),
}

impl FieldType {
    /// Wraps the type into an array type.
    #[must_use]
    pub fn into_array_type(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// Checks whether a variable of this type can hold a 32-bit integer.
    ///
    /// Only such variables participate in constant propagation; `long`,
    /// `float`, `double`, and reference-typed variables are ignored by the
    /// transfer functions.
    #[must_use]
    pub const fn is_int_like(&self) -> bool {
        use PrimitiveType::{Boolean, Byte, Char, Int, Short};
        matches!(self, Self::Base(Boolean | Byte | Char | Short | Int))
    }

    /// Returns the descriptor of the type.
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::Base(it) => it.descriptor_str().to_owned(),
            Self::Object(class) => format!("L{};", class.binary_name),
            Self::Array(inner) => format!("[{}", inner.descriptor()),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base(it) => it.fmt(f),
            Self::Object(it) => it.fmt(f),
            Self::Array(it) => write!(f, "{it}[]"),
        }
    }
}

impl From<PrimitiveType> for FieldType {
    fn from(value: PrimitiveType) -> Self {
        Self::Base(value)
    }
}

impl FromStr for FieldType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        match descriptor.chars().next() {
            Some('[') => FieldType::from_str(&descriptor[1..]).map(Self::into_array_type),
            Some('L') => {
                let class_name = descriptor[1..].strip_suffix(';').ok_or(InvalidDescriptor)?;
                Ok(Self::Object(ClassRef::new(class_name)))
            }
            Some(c) if descriptor.len() == 1 => PrimitiveType::try_from(c).map(Into::into),
            _ => Err(InvalidDescriptor),
        }
    }
}
