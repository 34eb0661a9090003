//! XOR / addition glue used to fold ABR middle nodes into the tree.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use crate::r1cs::cs_of;

/// `out = x XOR y` over field-encoded bits: `x(1-x) = 0`, `y(1-y) = 0`,
/// `(x + x) * y = x + y - out`.
pub fn xor_gadget<F: PrimeField>(x: &FpVar<F>, y: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    let cs = cs_of(&[x, y]);
    if cs.is_none() {
        return Ok(FpVar::constant(xor_value(x.value()?, y.value()?)));
    }
    let one = FpVar::<F>::one();
    let zero = FpVar::<F>::zero();
    x.mul_equals(&(&one - x), &zero)?;
    y.mul_equals(&(&one - y), &zero)?;
    let out = FpVar::new_witness(cs, || Ok(xor_value(x.value()?, y.value()?)))?;
    enforce_xor(x, y, &out)?;
    Ok(out)
}

fn xor_value<F: PrimeField>(a: F, b: F) -> F {
    a + b - (a + a) * b
}

/// The XOR row `(x + x) * y = x + y - out`.
fn enforce_xor<F: PrimeField>(
    x: &FpVar<F>,
    y: &FpVar<F>,
    out: &FpVar<F>,
) -> Result<(), SynthesisError> {
    (x + x).mul_equals(y, &(x + y - out))
}

/// Bitwise XOR of two boolean digests. Operand booleanity comes with
/// `Boolean`, so each bit pays the XOR row plus the booleanity of `out`.
pub fn long_xor<F: PrimeField>(
    x: &[Boolean<F>],
    y: &[Boolean<F>],
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    if x.len() != y.len() {
        return Err(SynthesisError::Unsatisfiable);
    }
    x.iter()
        .zip(y)
        .map(|(a, b)| {
            let cs = cs_of(&[a, b]);
            if cs.is_none() {
                return Ok(a ^ b);
            }
            let out = Boolean::new_witness(cs, || Ok(a.value()? ^ b.value()?))?;
            enforce_xor(&FpVar::from(a.clone()), &FpVar::from(b.clone()), &FpVar::from(out.clone()))?;
            Ok(out)
        })
        .collect()
}

/// `out = x + y` with `out` allocated as a witness (1 constraint).
pub fn add_gadget<F: PrimeField>(x: &FpVar<F>, y: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    let cs = cs_of(&[x, y]);
    if cs.is_none() {
        return Ok(x + y);
    }
    let out = FpVar::new_witness(cs, || Ok(x.value()? + y.value()?))?;
    (x + y).enforce_equal(&out)?;
    Ok(out)
}

/// Word-wise `add_gadget` over two field digests.
pub fn long_add<F: PrimeField>(
    x: &[FpVar<F>],
    y: &[FpVar<F>],
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    if x.len() != y.len() {
        return Err(SynthesisError::Unsatisfiable);
    }
    x.iter().zip(y).map(|(a, b)| add_gadget(a, b)).collect()
}
