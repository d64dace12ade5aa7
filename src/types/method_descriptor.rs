//! Method descriptors.

use itertools::Itertools;
use std::str::FromStr;

use super::field_type::FieldType;

/// The descriptor of a method.
/// Consists of the parameter types and the return type.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, derive_more::Display)]
#[display(
    "({}){return_type}",
    parameters.iter().map(FieldType::descriptor).join("")
)]
pub struct MethodDescriptor {
    /// The types of the parameters.
    pub parameters: Vec<FieldType>,
    /// The return type.
    pub return_type: ReturnType,
}

/// Denotes the return type of a method.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, derive_more::Display, derive_more::From,
)]
pub enum ReturnType {
    /// The method returns a specific type.
    Some(FieldType),
    /// The return type of the method is `void`.
    #[display("void")]
    Void,
}

impl ReturnType {
    /// Returns the descriptor of the return type.
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::Some(it) => it.descriptor(),
            Self::Void => "V".to_owned(),
        }
    }
}

/// An error indicating that a descriptor string is invalid.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Invalid descriptor")]
pub struct InvalidDescriptor;

const PARAM_START: char = '(';
const PARAM_END: char = ')';
const ARRAY_MARKER: char = '[';
const OBJECT_MARKER: char = 'L';
const OBJECT_END: char = ';';

impl FromStr for MethodDescriptor {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let remaining = descriptor
            .strip_prefix(PARAM_START)
            .ok_or(InvalidDescriptor)?;
        let (parameters, remaining) = parse_params(remaining)?;
        let return_type = ReturnType::from_str(remaining)?;
        Ok(Self {
            parameters,
            return_type,
        })
    }
}

impl FromStr for ReturnType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        if descriptor == "V" {
            Ok(ReturnType::Void)
        } else {
            FieldType::from_str(descriptor).map(ReturnType::Some)
        }
    }
}

fn parse_params(mut remaining: &str) -> Result<(Vec<FieldType>, &str), InvalidDescriptor> {
    let mut parameters = Vec::new();
    loop {
        if let Some(remaining) = remaining.strip_prefix(PARAM_END) {
            return Ok((parameters, remaining));
        }
        let dimension = remaining.chars().take_while(|&c| c == ARRAY_MARKER).count();
        let after_dim = &remaining[dimension..];
        let (base_type, after_param) = parse_next_param(after_dim)?;
        let param_type = (0..dimension).fold(base_type, |acc, _| acc.into_array_type());
        parameters.push(param_type);
        remaining = after_param;
    }
}

fn parse_next_param(input: &str) -> Result<(FieldType, &str), InvalidDescriptor> {
    let (first_char, remaining) = input
        .chars()
        .next()
        .map(|c| (c, &input[c.len_utf8()..]))
        .ok_or(InvalidDescriptor)?;

    if first_char == OBJECT_MARKER {
        let (class_name, rest) = remaining.split_once(OBJECT_END).ok_or(InvalidDescriptor)?;
        let class_ref = crate::lang::references::ClassRef::new(class_name);
        Ok((FieldType::Object(class_ref), rest))
    } else {
        let param_type = super::PrimitiveType::try_from(first_char).map(Into::into)?;
        Ok((param_type, remaining))
    }
}
