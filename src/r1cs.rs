//! Thin helpers over the arkworks constraint system.
//!
//! Witness values are produced by the allocation closures, which arkworks only
//! evaluates when the system is not in setup mode, so a single synthesis pass
//! both emits the rows and fills the assignment.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};

/// Allocate one field variable in the given mode.
pub fn allocate<F, T>(
    cs: impl Into<Namespace<F>>,
    f: T,
    mode: AllocationMode,
) -> Result<FpVar<F>, SynthesisError>
where
    F: PrimeField,
    T: FnOnce() -> Result<F, SynthesisError>,
{
    FpVar::new_variable(cs, f, mode)
}

/// Allocate one boolean; booleanity is enforced by the allocation.
pub fn allocate_bit<F, T>(
    cs: impl Into<Namespace<F>>,
    f: T,
    mode: AllocationMode,
) -> Result<Boolean<F>, SynthesisError>
where
    F: PrimeField,
    T: FnOnce() -> Result<bool, SynthesisError>,
{
    Boolean::new_variable(cs, f, mode)
}

/// Enforce `a * b = c`. Returns the number of rows added (0 when every operand
/// is a constant).
pub fn constrain<F: PrimeField>(
    a: &FpVar<F>,
    b: &FpVar<F>,
    c: &FpVar<F>,
) -> Result<usize, SynthesisError> {
    let cs = cs_of(&[a, b, c]);
    let before = cs.num_constraints();
    a.mul_equals(b, c)?;
    Ok(cs.num_constraints() - before)
}

pub fn read<F: PrimeField>(v: &FpVar<F>) -> Result<F, SynthesisError> {
    v.value()
}

/// First non-constant constraint system among the operands.
pub fn cs_of<F: PrimeField, V: R1CSVar<F>>(vars: &[&V]) -> ConstraintSystemRef<F> {
    vars.iter()
        .fold(ConstraintSystemRef::None, |acc, v| acc.or(v.cs()))
}
