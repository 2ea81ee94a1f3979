//! Implicit conversion rules.
//!
//! `int`, `float` and `bool` convert freely into each other. `char` and
//! `string` never convert, and never take part in inference.

use crate::{ast::types::DataType, errors::errors::ErrorImpl};

/// Expected-type wording for arithmetic, comparison and sign operands.
pub const EXPECTED_NUMERIC: &str = "int or float";
/// Expected-type wording for logical operands and conditions.
pub const EXPECTED_BOOL: &str = "bool";
/// Expected-type wording for vector indices and shift targets.
pub const EXPECTED_INT: &str = "int";

pub fn can_coerce(from: DataType, to: DataType) -> bool {
    from == to || (from.is_numeric() && to.is_numeric())
}

/// Rejects `char` and `string` where a value has to be converted to `expected`.
pub fn require_numeric(value: DataType, expected: &str) -> Result<(), ErrorImpl> {
    match value {
        DataType::Char => Err(ErrorImpl::CharToX {
            target: expected.to_string(),
        }),
        DataType::String => Err(ErrorImpl::StringToX {
            target: expected.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Result type of combining two operands.
///
/// Equal types give that type; otherwise the wider of the two wins, with
/// `bool < int < float`.
pub fn infer(left: DataType, right: DataType, expected: &str) -> Result<DataType, ErrorImpl> {
    require_numeric(left, expected)?;
    require_numeric(right, expected)?;

    Ok(match (left, right) {
        (left, right) if left == right => left,
        (DataType::Float, _) | (_, DataType::Float) => DataType::Float,
        (DataType::Int, _) | (_, DataType::Int) => DataType::Int,
        _ => DataType::Bool,
    })
}

/// Checks storing a `value` typed expression into a `target` typed location.
pub fn check_assignment(target: DataType, value: DataType) -> Result<(), ErrorImpl> {
    match (target, value) {
        (target, value) if target == value => Ok(()),
        (DataType::String, value) => Err(ErrorImpl::StringToX {
            target: value.to_string(),
        }),
        (DataType::Char, value) => Err(ErrorImpl::CharToX {
            target: value.to_string(),
        }),
        (_, value @ (DataType::Char | DataType::String)) => Err(ErrorImpl::WrongType {
            received: value.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Storage size in bytes; `capacity` only matters for strings.
pub fn size_of(data_type: DataType, capacity: u32) -> u32 {
    match data_type {
        DataType::Char | DataType::Bool => 1,
        DataType::Int => 4,
        DataType::Float => 8,
        DataType::String => capacity,
    }
}
