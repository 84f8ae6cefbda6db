use ark_ff::PrimeField;
use ark_relations::r1cs::{
    ConstraintMatrices, ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisError,
    SynthesisMode,
};

use super::{CompiledCircuit, ConstraintStats, Witness};
use crate::utils::errors::ProofSystemError;

/// Synthesizes `circuit` in setup mode and records its constraint matrices.
#[tracing::instrument(skip_all, name = "r1cs::compile")]
pub fn compile<F: PrimeField, C: ConstraintSynthesizer<F> + Clone>(
    circuit: C,
) -> Result<CompiledCircuit<F, C>, ProofSystemError> {
    let cs = ConstraintSystem::<F>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    circuit.clone().generate_constraints(cs.clone())?;
    cs.finalize();

    let matrices = cs.to_matrices().ok_or(ProofSystemError::MissingMatrices)?;
    let stats = ConstraintStats {
        constraints: matrices.num_constraints,
        public: matrices.num_instance_variables - 1,
        secret: matrices.num_witness_variables,
    };
    tracing::debug!(
        constraints = stats.constraints,
        public = stats.public,
        secret = stats.secret,
        "compiled circuit"
    );
    Ok(CompiledCircuit {
        circuit,
        matrices,
        stats,
    })
}

/// Synthesizes a fully assigned circuit and extracts its assignment.
///
/// The assignment must have the same public and secret wire counts as the
/// compiled circuit.
#[tracing::instrument(skip_all, name = "r1cs::new_witness")]
pub fn new_witness<F: PrimeField, C: ConstraintSynthesizer<F>>(
    compiled: &CompiledCircuit<F, C>,
    assignment: C,
) -> Result<Witness<F>, ProofSystemError> {
    let cs = ConstraintSystem::<F>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Prove {
        construct_matrices: false,
    });
    assignment.generate_constraints(cs.clone())?;

    let instance = cs.num_instance_variables();
    let witness = cs.num_witness_variables();
    let expected_instance = compiled.matrices.num_instance_variables;
    let expected_witness = compiled.matrices.num_witness_variables;
    if instance != expected_instance || witness != expected_witness {
        return Err(ProofSystemError::ShapeMismatch {
            instance: instance - 1,
            witness,
            expected_instance: expected_instance - 1,
            expected_witness,
        });
    }

    let cs = cs.borrow().ok_or(SynthesisError::MissingCS)?;
    let full = [
        cs.instance_assignment.as_slice(),
        cs.witness_assignment.as_slice(),
    ]
    .concat();
    Ok(Witness {
        full,
        num_public: instance - 1,
    })
}

/// Index of the first constraint with `<A,z> * <B,z> != <C,z>`.
pub fn first_unsatisfied<F: PrimeField>(
    matrices: &ConstraintMatrices<F>,
    z: &[F],
) -> Option<usize> {
    let eval = |row: &[(F, usize)]| -> F { row.iter().map(|(coeff, i)| *coeff * z[*i]).sum() };
    (0..matrices.num_constraints).find(|&row| {
        eval(&matrices.a[row]) * eval(&matrices.b[row]) != eval(&matrices.c[row])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::toy::ExpoCircuit;
    use ark_bn254::Fr;
    use ark_ff::Field;

    #[test]
    fn compile_reports_sizes() {
        let compiled = compile(ExpoCircuit::<Fr>::blank(5)).unwrap();
        assert_eq!(
            compiled.stats(),
            ConstraintStats {
                constraints: 6,
                public: 1,
                secret: 6,
            }
        );
    }

    #[test]
    fn witness_satisfies_compiled_matrices() {
        let compiled = compile(ExpoCircuit::<Fr>::blank(5)).unwrap();
        let witness = new_witness(&compiled, ExpoCircuit::new(5, Fr::from(3u64))).unwrap();
        assert_eq!(witness.public(), &[Fr::from(3u64).pow([32u64])]);
        assert_eq!(
            first_unsatisfied(&compiled.matrices, witness.full_assignment()),
            None
        );
    }

    #[test]
    fn wrong_output_is_located() {
        let compiled = compile(ExpoCircuit::<Fr>::blank(3)).unwrap();
        let mut witness = new_witness(&compiled, ExpoCircuit::new(3, Fr::from(3u64))).unwrap();
        witness.full[1] += Fr::from(1u64);
        assert_eq!(
            first_unsatisfied(&compiled.matrices, witness.full_assignment()),
            Some(3)
        );
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let compiled = compile(ExpoCircuit::<Fr>::blank(3)).unwrap();
        let result = new_witness(&compiled, ExpoCircuit::new(4, Fr::from(3u64)));
        assert!(matches!(
            result,
            Err(ProofSystemError::ShapeMismatch { .. })
        ));
    }
}
