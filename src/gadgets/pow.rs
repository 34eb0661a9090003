//! Fixed-exponent power gadget.
//!
//! The exponent is known at synthesis time, so the square-and-multiply chain
//! is unrolled MSB-first: every squaring and every multiplication is one row.

use ark_ff::{BitIteratorBE, Field, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Square,
    Mul,
}

#[derive(Clone, Debug)]
pub struct PowGadget {
    exponent: Vec<u64>,
    /// Steps after the leading one bit; empty for exponents 0 and 1.
    steps: Vec<Step>,
    zero: bool,
}

impl PowGadget {
    pub fn new(exponent: u64) -> Self {
        Self::from_limbs(&[exponent])
    }

    /// Exponent given as little-endian u64 limbs.
    pub fn from_limbs(limbs: &[u64]) -> Self {
        let mut bits = BitIteratorBE::without_leading_zeros(limbs);
        let zero = bits.next().is_none();
        let steps = bits
            .flat_map(|b| {
                if b {
                    vec![Step::Square, Step::Mul]
                } else {
                    vec![Step::Square]
                }
            })
            .collect();
        Self {
            exponent: limbs.to_vec(),
            steps,
            zero,
        }
    }

    pub fn num_constraints(&self) -> usize {
        self.steps.len()
    }

    fn apply<F: PrimeField>(acc: &FpVar<F>, x: &FpVar<F>, step: Step) -> Result<FpVar<F>, SynthesisError> {
        match step {
            Step::Square => acc.square(),
            Step::Mul => Ok(acc * x),
        }
    }

    /// `x^y` as a new variable.
    pub fn pow<F: PrimeField>(&self, x: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
        if self.zero {
            return Ok(FpVar::one());
        }
        let mut acc = x.clone();
        for step in &self.steps {
            acc = Self::apply(&acc, x, *step)?;
        }
        Ok(acc)
    }

    /// Enforce `x^y = out`, folding the last step into the equality so that
    /// the row count stays `num_constraints()`.
    pub fn enforce<F: PrimeField>(&self, x: &FpVar<F>, out: &FpVar<F>) -> Result<(), SynthesisError> {
        let Some((last, init)) = self.steps.split_last() else {
            return if self.zero {
                out.enforce_equal(&FpVar::one())
            } else {
                out.enforce_equal(x)
            };
        };
        let mut acc = x.clone();
        for step in init {
            acc = Self::apply(&acc, x, *step)?;
        }
        match last {
            Step::Square => acc.square_equals(out),
            Step::Mul => acc.mul_equals(x, out),
        }
    }

    pub fn native<F: Field>(&self, x: &F) -> F {
        x.pow(&self.exponent)
    }
}

/// `y = x^(1/d)` as a witness with `y^d = x` enforced; `d_inv` is the inverse
/// exponent modulo `p - 1`.
pub fn root_var<F: PrimeField>(
    x: &FpVar<F>,
    d: u64,
    d_inv: &[u64],
) -> Result<FpVar<F>, SynthesisError> {
    if let FpVar::Constant(c) = x {
        return Ok(FpVar::Constant(c.pow(d_inv)));
    }
    let y = FpVar::new_witness(x.cs(), || Ok(x.value()?.pow(d_inv)))?;
    PowGadget::new(d).enforce(&y, x)?;
    Ok(y)
}
