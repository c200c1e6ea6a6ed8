//! Fibpipe Kernel: Stage Catalog
//!
//! Integer stages addressable by text (`name` or `name:arg`), so pipelines
//! can be assembled from command-line flags and config files.

use num_bigint::{BigInt, Sign};
use num_traits::Zero;
use thiserror::Error;

use crate::arithmetic::parse_integer;
use crate::error::KernelError;
use crate::pipeline::{TryPipeline, TryStage};

/// Faults a catalog stage can raise while transforming a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFault {
    #[error("square root of negative value {0}")]
    NegativeRoot(BigInt),
}

pub type IntegerPipeline = TryPipeline<BigInt, StageFault>;

const NULLARY: &[&str] = &[
    "increment", "decrement", "double", "triple", "square", "negate", "sqrt",
];
const UNARY: &[&str] = &["add", "sub", "mul", "div", "mod"];

fn total<F>(f: F) -> TryStage<BigInt, StageFault>
where
    F: Fn(BigInt) -> BigInt + Send + Sync + 'static,
{
    Box::new(move |x: BigInt| -> Result<BigInt, StageFault> { Ok(f(x)) })
}

fn floor_sqrt(x: BigInt) -> Result<BigInt, StageFault> {
    if x.sign() == Sign::Minus {
        return Err(StageFault::NegativeRoot(x));
    }
    Ok(BigInt::from(x.magnitude().sqrt()))
}

/// Parse one stage spec into its normalized name and a runnable stage.
///
/// The name is `name` or `name:arg` with the argument in canonical decimal
/// form, so `"sub: +4"` and `"sub:4"` name the same stage.
pub fn parse_stage(spec: &str) -> Result<(String, TryStage<BigInt, StageFault>), KernelError> {
    let trimmed = spec.trim();
    let (name, arg) = match trimmed.split_once(':') {
        Some((name, arg)) => (name.trim(), Some(arg)),
        None => (trimmed, None),
    };

    let invalid = |reason: &str| KernelError::InvalidStageArgument {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    match arg {
        None if NULLARY.contains(&name) => {}
        Some(_) if UNARY.contains(&name) => {}
        None if UNARY.contains(&name) => return Err(invalid("requires an integer argument")),
        Some(_) if NULLARY.contains(&name) => return Err(invalid("takes no argument")),
        _ => return Err(KernelError::UnknownStage(spec.to_string())),
    }

    let operand = match arg {
        Some(text) => parse_integer(text).map_err(|_| invalid("argument is not an integer"))?,
        None => BigInt::zero(),
    };
    let normalized = match arg {
        Some(_) => format!("{}:{}", name, operand),
        None => name.to_string(),
    };

    let stage: TryStage<BigInt, StageFault> = match name {
        "increment" => total(|x| x + 1u32),
        "decrement" => total(|x| x - 1u32),
        "double" => total(|x| x * 2u32),
        "triple" => total(|x| x * 3u32),
        "square" => total(|x| &x * &x),
        "negate" => total(|x| -x),
        "sqrt" => Box::new(floor_sqrt),
        "add" => total(move |x| x + &operand),
        "sub" => total(move |x| x - &operand),
        "mul" => total(move |x| x * &operand),
        "div" => {
            if operand.is_zero() {
                return Err(invalid("division by zero"));
            }
            total(move |x| x / &operand)
        }
        "mod" => {
            if operand.sign() != Sign::Plus {
                return Err(invalid("modulus must be positive"));
            }
            total(move |x| {
                let r = x % &operand;
                if r.sign() == Sign::Minus {
                    r + &operand
                } else {
                    r
                }
            })
        }
        _ => return Err(KernelError::UnknownStage(spec.to_string())),
    };
    Ok((normalized, stage))
}

/// Build a pipeline from stage specs, in order. An empty list is the identity.
pub fn build_pipeline<S: AsRef<str>>(specs: &[S]) -> Result<IntegerPipeline, KernelError> {
    let mut builder = TryPipeline::builder();
    for spec in specs {
        let (name, stage) = parse_stage(spec.as_ref())?;
        builder = builder.boxed(name, stage);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(specs: &[&str], input: i64) -> BigInt {
        build_pipeline(specs).unwrap().apply(BigInt::from(input)).unwrap()
    }

    #[test]
    fn test_increment_double_triple() {
        assert_eq!(run(&["increment", "double", "triple"], 3), BigInt::from(24));
    }

    #[test]
    fn test_empty_is_identity() {
        assert_eq!(run(&[], 5), BigInt::from(5));
    }

    #[test]
    fn test_nullary_stages() {
        assert_eq!(run(&["decrement"], 0), BigInt::from(-1));
        assert_eq!(run(&["square"], -12), BigInt::from(144));
        assert_eq!(run(&["negate"], 9), BigInt::from(-9));
        assert_eq!(run(&["sqrt"], 99), BigInt::from(9));
        assert_eq!(run(&["sqrt"], 100), BigInt::from(10));
    }

    #[test]
    fn test_argument_stages() {
        assert_eq!(run(&["add:10", "mul:-2"], 1), BigInt::from(-22));
        assert_eq!(run(&["sub: 4"], 1), BigInt::from(-3));
        assert_eq!(run(&["div:2"], -7), BigInt::from(-3));
        assert_eq!(run(&["mod:5"], -7), BigInt::from(3));
        assert_eq!(run(&["mod:5"], 12), BigInt::from(2));
    }

    #[test]
    fn test_order_matters() {
        assert_eq!(run(&["increment", "double"], 4), BigInt::from(10));
        assert_eq!(run(&["double", "increment"], 4), BigInt::from(9));
    }

    #[test]
    fn test_negative_root_fails_and_stops() {
        let pipeline = build_pipeline(&["negate", "sqrt", "increment"]).unwrap();
        let err = pipeline.apply(BigInt::from(4)).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.name, "sqrt");
        assert_eq!(err.source, StageFault::NegativeRoot(BigInt::from(-4)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            build_pipeline(&["explode"]),
            Err(KernelError::UnknownStage(s)) if s == "explode"
        ));
        assert!(matches!(
            build_pipeline(&["add"]),
            Err(KernelError::InvalidStageArgument { .. })
        ));
        assert!(matches!(
            build_pipeline(&["double:2"]),
            Err(KernelError::InvalidStageArgument { .. })
        ));
        assert!(matches!(
            build_pipeline(&["mul:two"]),
            Err(KernelError::InvalidStageArgument { .. })
        ));
        assert!(matches!(
            build_pipeline(&["div:0"]),
            Err(KernelError::InvalidStageArgument { reason, .. }) if reason == "division by zero"
        ));
        assert!(matches!(
            build_pipeline(&["mod:-3"]),
            Err(KernelError::InvalidStageArgument { .. })
        ));
    }

    #[test]
    fn test_stage_names_are_normalized() {
        let pipeline = build_pipeline(&[" increment ", "add:2", "sub: +4", " mul : -07"]).unwrap();
        assert_eq!(
            pipeline.names().collect::<Vec<_>>(),
            vec!["increment", "add:2", "sub:4", "mul:-7"]
        );
    }

    #[test]
    fn test_equivalent_specs_parse_to_same_name() {
        let (spaced, _) = parse_stage("sub: 4").unwrap();
        let (tight, _) = parse_stage("sub:4").unwrap();
        assert_eq!(spaced, tight);
    }
}
