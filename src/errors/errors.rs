use thiserror::Error;

use crate::{highlight, line_and_column, Span};

/// A diagnostic: what went wrong and where.
///
/// Two-position diagnostics (redeclarations, misused identifiers, bad
/// arguments) keep the earlier position in `first_occurrence`.
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    occurrence: Span,
    first_occurrence: Option<Span>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, occurrence: Span) -> Self {
        Error {
            internal_error: error_impl,
            occurrence,
            first_occurrence: None,
        }
    }

    pub fn with_first_occurrence(error_impl: ErrorImpl, first: Span, occurrence: Span) -> Self {
        Error {
            internal_error: error_impl,
            occurrence,
            first_occurrence: Some(first),
        }
    }

    pub fn get_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_occurrence(&self) -> &Span {
        &self.occurrence
    }

    pub fn get_first_occurrence(&self) -> Option<&Span> {
        self.first_occurrence.as_ref()
    }

    /// Process exit status for this diagnostic.
    pub fn code(&self) -> i32 {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. } => 1,
            ErrorImpl::Undeclared { .. } => 10,
            ErrorImpl::Declared { .. } => 11,
            ErrorImpl::VariableMisuse { .. } => 20,
            ErrorImpl::VectorMisuse { .. } => 21,
            ErrorImpl::FunctionMisuse { .. } => 22,
            ErrorImpl::WrongType { .. } => 30,
            ErrorImpl::StringToX { .. } => 31,
            ErrorImpl::CharToX { .. } => 32,
            ErrorImpl::StringMax { .. } => 33,
            ErrorImpl::StringVector { .. } => 34,
            ErrorImpl::MissingArgs { .. } => 40,
            ErrorImpl::ExcessArgs { .. } => 41,
            ErrorImpl::WrongTypeArgs { .. } => 42,
            ErrorImpl::FunctionString { .. } => 43,
            ErrorImpl::WrongParInput { .. } => 50,
            ErrorImpl::WrongParOutput { .. } => 51,
            ErrorImpl::WrongParReturn { .. } => 52,
            ErrorImpl::WrongParShift { .. } => 53,
            ErrorImpl::VectorTooLarge { .. } | ErrorImpl::InternalError { .. } => 2,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::Undeclared { .. } => "ERR_UNDECLARED",
            ErrorImpl::Declared { .. } => "ERR_DECLARED",
            ErrorImpl::VariableMisuse { .. } => "ERR_VARIABLE",
            ErrorImpl::VectorMisuse { .. } => "ERR_VECTOR",
            ErrorImpl::FunctionMisuse { .. } => "ERR_FUNCTION",
            ErrorImpl::WrongType { .. } => "ERR_WRONG_TYPE",
            ErrorImpl::StringToX { .. } => "ERR_STRING_TO_X",
            ErrorImpl::CharToX { .. } => "ERR_CHAR_TO_X",
            ErrorImpl::StringMax { .. } => "ERR_STRING_MAX",
            ErrorImpl::StringVector { .. } => "ERR_STRING_VECTOR",
            ErrorImpl::MissingArgs { .. } => "ERR_MISSING_ARGS",
            ErrorImpl::ExcessArgs { .. } => "ERR_EXCESS_ARGS",
            ErrorImpl::WrongTypeArgs { .. } => "ERR_WRONG_TYPE_ARGS",
            ErrorImpl::FunctionString { .. } => "ERR_FUNCTION_STRING",
            ErrorImpl::WrongParInput { .. } => "ERR_WRONG_PAR_INPUT",
            ErrorImpl::WrongParOutput { .. } => "ERR_WRONG_PAR_OUTPUT",
            ErrorImpl::WrongParReturn { .. } => "ERR_WRONG_PAR_RETURN",
            ErrorImpl::WrongParShift { .. } => "ERR_WRONG_PAR_SHIFT",
            ErrorImpl::VectorTooLarge { .. } => "VectorTooLarge",
            ErrorImpl::InternalError { .. } => "InternalError",
        }
    }

    /// Renders the full diagnostic against the source it was produced from.
    ///
    /// Syntax errors read `Parsing errors: Parsing error at line L column C. No repair sequences found.`
    /// and carry their detail only in [`ErrorImpl`]; everything else prints
    /// its header followed by one or two highlighted occurrences.
    pub fn render(&self, source: &str) -> String {
        let (line, column) = line_and_column(source, self.occurrence.start.0);

        if self.code() == 1 {
            return format!(
                "Parsing errors: Parsing error at line {} column {}. No repair sequences found.",
                line, column
            );
        }

        match &self.first_occurrence {
            Some(first) => {
                let (first_line, first_column) = line_and_column(source, first.start.0);
                format!(
                    "{}\nFirst occurrence at line {}, column {}:\n{}\nAnd again at line {}, column {}:\n{}",
                    self.internal_error,
                    first_line,
                    first_column,
                    highlight(source, first),
                    line,
                    column,
                    highlight(source, &self.occurrence)
                )
            }
            None => format!(
                "{}\nOccurrence at line {}, column {}:\n{}",
                self.internal_error,
                line,
                column,
                highlight(source, &self.occurrence)
            ),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("Unrecognised token \"{token}\".")]
    UnrecognisedToken { token: String },
    #[error("Unexpected token \"{token}\".")]
    UnexpectedToken { token: String },
    #[error("Unexpected token \"{token}\", {message}.")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("Invalid number \"{token}\", is it above the integer limit?")]
    NumberParseError { token: String },
    #[error("Usage of undeclared identifier: \"{identifier}\"")]
    Undeclared { identifier: String },
    #[error("Same-scope identifier redeclaration: \"{identifier}\"")]
    Declared { identifier: String },
    #[error("Variable identifier used as {used_as}: \"{identifier}\"")]
    VariableMisuse { identifier: String, used_as: String },
    #[error("Vector identifier used as {used_as}: \"{identifier}\"")]
    VectorMisuse { identifier: String, used_as: String },
    #[error("Function identifier used as {used_as}: \"{identifier}\"")]
    FunctionMisuse { identifier: String, used_as: String },
    #[error("Incompatible type in attribution.\nExpected int, float or bool but received a \"{received}\".")]
    WrongType { received: String },
    #[error("Invalid type conversion from \"string\" to \"{target}\"")]
    StringToX { target: String },
    #[error("Invalid type conversion from \"char\" to \"{target}\"")]
    CharToX { target: String },
    #[error("Invalid attribution of type \"string\" value, size exceeds that of variable declaration.\nVariable declaration size is {capacity} and string size is {length}.")]
    StringMax { capacity: u32, length: u32 },
    #[error("Invalid usage of \"string\" type for vector declaration: \"{identifier}\"")]
    StringVector { identifier: String },
    #[error("Missing arguments in call to function \"{function}\"; expected {expected}, found {received};")]
    MissingArgs { function: String, expected: usize, received: usize },
    #[error("Excess arguments in call to function \"{function}\"; expected {expected}, found {received};")]
    ExcessArgs { function: String, expected: usize, received: usize },
    #[error("Invalid type for argument {index} in call to function \"{function}\"; expected \"{expected}\", found \"{received}\";")]
    WrongTypeArgs { function: String, index: usize, expected: String, received: String },
    #[error("Invalid usage of \"string\" type for function {role}: \"{identifier}\"")]
    FunctionString { identifier: String, role: String },
    #[error("Invalid argument for \"input\" command; expected variable of type \"int\" or \"float\", found \"{received}\";")]
    WrongParInput { received: String },
    #[error("Invalid argument for \"output\" command; expected variable or literal of type \"int\" or \"float\", found \"{received}\";")]
    WrongParOutput { received: String },
    #[error("Invalid argument for \"return\" command; expected value compatible with \"{expected}\", found \"{received}\";")]
    WrongParReturn { expected: String, received: String },
    #[error("Invalid number parameter on shift command; expected number lower or equal to 16, found \"{received}\";")]
    WrongParShift { received: i64 },
    #[error("Vector \"{identifier}\" of {length} elements does not fit in memory")]
    VectorTooLarge { identifier: String, length: u32 },
    #[error("internal error: {message}")]
    InternalError { message: String },
}
