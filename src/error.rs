// src/error.rs

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bad size of input data: expected {expected} bytes, got {actual}")]
    BadInputSize { expected: usize, actual: usize },
    #[error("index {index} out of range (bound {bound})")]
    IndexOutOfRange { index: usize, bound: usize },
    #[error("invalid tree height {height}, expected {min}..={max}")]
    InvalidHeight { height: usize, min: usize, max: usize },
    #[error("unsupported arity {arity}, expected {expected}")]
    UnsupportedArity { arity: usize, expected: usize },
    #[error("unsupported branch width {0}")]
    UnsupportedWidth(usize),
    #[error("exponent {0} is not invertible modulo p - 1")]
    ExponentNotInvertible(u64),
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Shape errors raised while building a gadget abort the synthesis.
impl From<Error> for SynthesisError {
    fn from(e: Error) -> Self {
        match e {
            Error::Synthesis(e) => e,
            _ => SynthesisError::Unsatisfiable,
        }
    }
}
