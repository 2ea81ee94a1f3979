//! Command-line and environment configuration.
//!
//! The compiler is a single batch run: read a program, emit one artifact.
//! [`CompilerConfig`] gathers which artifact to emit and the knobs that
//! shape it.

use std::{env, path::PathBuf};

use thiserror::Error;

/// Environment variable consulted when `--emit` is not given.
pub const EMIT_ENV: &str = "ILOCC_EMIT";

/// Base address the stack and frame pointers start from.
pub const DEFAULT_STACK_BASE: i64 = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value for option {option}")]
    MissingValue { option: String },
    #[error("invalid value {value:?} for option {option}")]
    InvalidValue { option: String, value: String },
    #[error("unknown option {option}")]
    UnknownOption { option: String },
    #[error("more than one input file given: {extra}")]
    ExtraInput { extra: String },
}

/// Which artifact a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitTarget {
    /// The AST graph as edges plus labels
    Ast,
    /// Semantic analysis only; silent on success
    Check,
    /// The ILOC listing
    Iloc,
}

impl EmitTarget {
    fn parse(option: &str, value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            "ast" => Ok(EmitTarget::Ast),
            "check" => Ok(EmitTarget::Check),
            "iloc" => Ok(EmitTarget::Iloc),
            _ => Err(invalid(option, value)),
        }
    }
}

/// How call arguments hang off a `call` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallArgumentLayout {
    /// Every argument is a direct child, left to right.
    #[default]
    Children,
    /// The first argument is the child; the rest follow it as a chain.
    Chained,
}

/// How consecutive function headers are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionLink {
    /// From the last command of the previous body (or its header when empty).
    #[default]
    ChainTail,
    /// Header to header.
    Header,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphLayout {
    pub call_arguments: CallArgumentLayout,
    pub function_link: FunctionLink,
}

/// Value loaded into `rbss` by the preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaticSegmentBase {
    /// The number of emitted instructions, so globals start right after the code.
    #[default]
    CodeLength,
    Fixed(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenConfig {
    pub stack_base: i64,
    pub static_segment: StaticSegmentBase,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            stack_base: DEFAULT_STACK_BASE,
            static_segment: StaticSegmentBase::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub emit: EmitTarget,
    pub graph: GraphLayout,
    pub codegen: CodegenConfig,
    /// Source file; `None` reads standard input.
    pub input: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            emit: EmitTarget::Iloc,
            graph: GraphLayout::default(),
            codegen: CodegenConfig::default(),
            input: None,
        }
    }
}

impl CompilerConfig {
    /// Builds a configuration from process arguments (without the program name).
    ///
    /// # Arguments
    ///
    /// * `args` - The remaining command-line arguments
    /// * `emit_override` - Value of [`EMIT_ENV`], used when `--emit` is absent
    pub fn from_args<I>(args: I, emit_override: Option<String>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = CompilerConfig::default();
        let mut emit = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--emit" => {
                    let value = next_value(&mut args, &arg)?;
                    emit = Some(EmitTarget::parse(&arg, &value)?);
                }
                "--ast" => emit = Some(EmitTarget::Ast),
                "--check" => emit = Some(EmitTarget::Check),
                "--iloc" => emit = Some(EmitTarget::Iloc),
                "--call-args" => {
                    let value = next_value(&mut args, &arg)?;
                    config.graph.call_arguments = match value.as_str() {
                        "children" => CallArgumentLayout::Children,
                        "chained" => CallArgumentLayout::Chained,
                        _ => return Err(invalid(&arg, &value)),
                    };
                }
                "--fn-link" => {
                    let value = next_value(&mut args, &arg)?;
                    config.graph.function_link = match value.as_str() {
                        "tail" => FunctionLink::ChainTail,
                        "header" => FunctionLink::Header,
                        _ => return Err(invalid(&arg, &value)),
                    };
                }
                "--stack-base" => {
                    let value = next_value(&mut args, &arg)?;
                    config.codegen.stack_base = value.parse().map_err(|_| invalid(&arg, &value))?;
                }
                "--rbss" => {
                    let value = next_value(&mut args, &arg)?;
                    let base = value.parse().map_err(|_| invalid(&arg, &value))?;
                    config.codegen.static_segment = StaticSegmentBase::Fixed(base);
                }
                option if option.starts_with("--") => {
                    return Err(ConfigError::UnknownOption { option: option.to_string() });
                }
                path => {
                    if config.input.is_some() {
                        return Err(ConfigError::ExtraInput { extra: path.to_string() });
                    }
                    config.input = Some(PathBuf::from(path));
                }
            }
        }

        config.emit = match (emit, emit_override) {
            (Some(emit), _) => emit,
            (None, Some(raw)) if !raw.trim().is_empty() => EmitTarget::parse(EMIT_ENV, &raw)?,
            _ => EmitTarget::Iloc,
        };

        Ok(config)
    }

    /// Reads the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        CompilerConfig::from_args(env::args().skip(1), env::var(EMIT_ENV).ok())
    }
}

fn next_value<I: Iterator<Item = String>>(args: &mut I, option: &str) -> Result<String, ConfigError> {
    args.next().ok_or_else(|| ConfigError::MissingValue {
        option: option.to_string(),
    })
}

fn invalid(option: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::from_args(args(&[]), None).unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.emit, EmitTarget::Iloc);
        assert_eq!(config.codegen.stack_base, 1024);
    }

    #[test]
    fn test_all_options() {
        let config = CompilerConfig::from_args(
            args(&[
                "--emit", "ast", "--call-args", "chained", "--fn-link", "header", "--stack-base", "2048",
                "--rbss", "500", "prog.txt",
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.emit, EmitTarget::Ast);
        assert_eq!(config.graph.call_arguments, CallArgumentLayout::Chained);
        assert_eq!(config.graph.function_link, FunctionLink::Header);
        assert_eq!(config.codegen.stack_base, 2048);
        assert_eq!(config.codegen.static_segment, StaticSegmentBase::Fixed(500));
        assert_eq!(config.input, Some(PathBuf::from("prog.txt")));
    }

    #[test]
    fn test_environment_supplies_emit() {
        let config = CompilerConfig::from_args(args(&[]), Some("check".to_string())).unwrap();
        assert_eq!(config.emit, EmitTarget::Check);

        let config = CompilerConfig::from_args(args(&["--ast"]), Some("check".to_string())).unwrap();
        assert_eq!(config.emit, EmitTarget::Ast);
    }

    #[test]
    fn test_invalid_options() {
        assert_eq!(
            CompilerConfig::from_args(args(&["--emit"]), None),
            Err(ConfigError::MissingValue { option: "--emit".to_string() })
        );
        assert!(matches!(
            CompilerConfig::from_args(args(&["--rbss", "many"]), None),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            CompilerConfig::from_args(args(&["--verbose"]), None),
            Err(ConfigError::UnknownOption { .. })
        ));
        assert!(matches!(
            CompilerConfig::from_args(args(&["a.txt", "b.txt"]), None),
            Err(ConfigError::ExtraInput { .. })
        ));
    }
}
