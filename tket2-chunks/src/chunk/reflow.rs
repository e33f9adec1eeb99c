//! Relabelling of live operators.

use derive_more::{Display, Error, From};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::pauli::{PauliMap, PauliMapError};
use crate::solve::{solve_pauli_product, DEFAULT_MAX_ENUMERATION};

/// How the inputs of a reflow output are given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReflowInputs {
    /// The output is the product of exactly these inputs.
    Explicit(Vec<PauliMap>),
    /// Solve for the inputs among the available operators.
    Auto,
    /// The output is the product of these inputs and some solved-for
    /// remainder.
    Partial(Vec<PauliMap>),
}

/// A pseudo-chunk re-expressing live operators as products of each other.
///
/// Applying a reflow adds no instructions. Each declared output replaces the
/// operators it is built from; live operators no output refers to are left
/// untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkReflow {
    #[serde(with = "indexmap::map::serde_seq")]
    out2in: IndexMap<PauliMap, ReflowInputs>,
    #[serde(default)]
    discarded_inputs: Vec<PauliMap>,
}

impl ChunkReflow {
    /// Create a reflow from output operators and how to build them.
    pub fn new(out2in: impl IntoIterator<Item = (PauliMap, ReflowInputs)>) -> Self {
        Self {
            out2in: out2in.into_iter().collect(),
            discarded_inputs: Vec::new(),
        }
    }

    /// Create a reflow where every output is an explicit product.
    pub fn from_explicit(out2in: impl IntoIterator<Item = (PauliMap, Vec<PauliMap>)>) -> Self {
        Self::new(
            out2in
                .into_iter()
                .map(|(out, ins)| (out, ReflowInputs::Explicit(ins))),
        )
    }

    /// Create a fully explicit reflow, solving every automatic output against
    /// a list of available inputs.
    ///
    /// Explicit outputs are kept as declared; automatic ones pick the
    /// smallest, then earliest, subset of `inputs` reproducing them.
    pub fn from_auto_rewrite(
        inputs: &[PauliMap],
        out2in: impl IntoIterator<Item = (PauliMap, ReflowInputs)>,
    ) -> Result<Self, ReflowError> {
        let reflow = Self::new(out2in);
        let resolved = reflow.resolve(inputs, DEFAULT_MAX_ENUMERATION)?;
        Ok(Self {
            out2in: resolved
                .into_iter()
                .map(|(out, ins)| (out, ReflowInputs::Explicit(ins)))
                .collect(),
            discarded_inputs: reflow.discarded_inputs,
        })
    }

    /// Declare live operators the reflow drops without using.
    pub fn with_discarded_inputs(mut self, paulis: impl IntoIterator<Item = PauliMap>) -> Self {
        self.discarded_inputs.extend(paulis);
        self
    }

    /// The declared outputs and their inputs, in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (&PauliMap, &ReflowInputs)> + '_ {
        self.out2in.iter()
    }

    /// The inputs of an output, if declared.
    pub fn inputs_of(&self, output: &PauliMap) -> Option<&ReflowInputs> {
        self.out2in.get(output)
    }

    /// Live operators dropped by the reflow.
    #[inline]
    pub fn discarded_inputs(&self) -> &[PauliMap] {
        &self.discarded_inputs
    }

    /// Check that every explicit output is the product of its inputs.
    pub fn verify(&self) -> Result<(), ReflowError> {
        for (output, inputs) in &self.out2in {
            if let ReflowInputs::Explicit(inputs) = inputs {
                check_product(output, inputs)?;
            }
        }
        Ok(())
    }

    /// Resolve every output against the operators in `available`.
    ///
    /// Explicit outputs are checked as given. Automatic outputs only consider
    /// available operators sharing the output's key; for partial outputs the
    /// pinned inputs are divided out of the target before solving and are
    /// excluded from the candidates.
    pub fn resolve(
        &self,
        available: &[PauliMap],
        max_enumeration: usize,
    ) -> Result<Vec<(PauliMap, Vec<PauliMap>)>, ReflowError> {
        self.out2in
            .iter()
            .map(|(output, inputs)| {
                let inputs = match inputs {
                    ReflowInputs::Explicit(inputs) => inputs.clone(),
                    ReflowInputs::Auto => solve_inputs(output, &[], available, max_enumeration)?,
                    ReflowInputs::Partial(pinned) => {
                        solve_inputs(output, pinned, available, max_enumeration)?
                    }
                };
                check_product(output, &inputs)?;
                Ok((output.clone(), inputs))
            })
            .collect()
    }
}

fn solve_inputs(
    output: &PauliMap,
    pinned: &[PauliMap],
    available: &[PauliMap],
    max_enumeration: usize,
) -> Result<Vec<PauliMap>, ReflowError> {
    let target = pinned.iter().fold(output.unsigned(), |acc, p| acc.xor(p));
    let candidates = available
        .iter()
        .filter(|p| p.key() == output.key() && !pinned.contains(p))
        .cloned()
        .collect_vec();
    let solution = solve_pauli_product(&candidates, &target, max_enumeration).ok_or_else(|| {
        ReflowError::Unsolvable {
            output: output.clone(),
        }
    })?;
    Ok(pinned
        .iter()
        .cloned()
        .chain(solution.into_iter().map(|i| candidates[i].clone()))
        .collect())
}

fn check_product(output: &PauliMap, inputs: &[PauliMap]) -> Result<(), ReflowError> {
    let product = PauliMap::try_product(output.key().cloned(), inputs)?;
    if &product != output {
        return Err(ReflowError::Mismatch {
            output: output.clone(),
            product,
        });
    }
    Ok(())
}

/// Errors resolving a reflow.
#[derive(Debug, Display, Clone, PartialEq, Error, From)]
#[non_exhaustive]
pub enum ReflowError {
    /// The inputs of an output do not multiply to it.
    #[display("reflow inputs multiply to {product}, not the declared output {output}")]
    Mismatch {
        /// The declared output.
        output: PauliMap,
        /// The actual product of the inputs.
        product: PauliMap,
    },
    /// No subset of the available operators reproduces an output.
    #[display("no product of the available operators gives {output}")]
    Unsolvable {
        /// The requested output.
        output: PauliMap,
    },
    /// The inputs cannot be multiplied.
    #[display("{_0}")]
    #[from]
    Algebra(PauliMapError),
}
