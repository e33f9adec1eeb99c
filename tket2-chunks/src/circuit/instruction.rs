//! Instructions of a measurement circuit.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::pauli::{Pauli, PauliMap, Qubit};

use super::{Circuit, CircuitError};

/// A relative reference into the measurement record.
///
/// `RecTarget(-1)` is the most recent measurement at the point where the
/// annotation appears in the instruction stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecTarget(pub i64);

impl RecTarget {
    /// The lookback of an absolute record index, seen from a stream with
    /// `num_measurements` measurements.
    #[inline]
    pub fn lookback(record: usize, num_measurements: usize) -> Self {
        debug_assert!(record < num_measurements);
        RecTarget(record as i64 - num_measurements as i64)
    }
}

impl fmt::Display for RecTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec[{}]", self.0)
    }
}

/// A gate target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateTarget {
    /// A bare qubit.
    Qubit(Qubit),
    /// A qubit tagged with a pauli basis, used by product measurements.
    Pauli(Pauli, Qubit),
    /// Joins the neighbouring pauli targets into one product.
    Combiner,
}

impl GateTarget {
    /// The qubit addressed by the target, if any.
    pub fn qubit(&self) -> Option<Qubit> {
        match *self {
            GateTarget::Qubit(q) | GateTarget::Pauli(_, q) => Some(q),
            GateTarget::Combiner => None,
        }
    }

    fn relabelled(self, f: &mut impl FnMut(Qubit) -> Qubit) -> Self {
        match self {
            GateTarget::Qubit(q) => GateTarget::Qubit(f(q)),
            GateTarget::Pauli(p, q) => GateTarget::Pauli(p, f(q)),
            GateTarget::Combiner => GateTarget::Combiner,
        }
    }
}

impl From<Qubit> for GateTarget {
    fn from(q: Qubit) -> Self {
        GateTarget::Qubit(q)
    }
}

impl From<u32> for GateTarget {
    fn from(q: u32) -> Self {
        GateTarget::Qubit(Qubit(q))
    }
}

impl fmt::Display for GateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateTarget::Qubit(q) => write!(f, "{q}"),
            GateTarget::Pauli(p, q) => write!(f, "{p}{q}"),
            GateTarget::Combiner => write!(f, "*"),
        }
    }
}

/// How a measurement-class gate consumes its targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasurementKind {
    /// One record per qubit target, in the given basis.
    Single(Pauli),
    /// One record per pair of qubit targets, measuring the two-qubit product.
    Pair(Pauli),
    /// One record per combiner-joined product of pauli targets.
    Product,
}

impl MeasurementKind {
    /// The measurement kind of a gate name, or `None` for unitary and
    /// reset gates.
    pub fn from_name(name: &str) -> Option<Self> {
        use MeasurementKind::*;
        Some(match name {
            "M" | "MZ" | "MR" | "MRZ" => Single(Pauli::Z),
            "MX" | "MRX" => Single(Pauli::X),
            "MY" | "MRY" => Single(Pauli::Y),
            "MXX" => Pair(Pauli::X),
            "MYY" => Pair(Pauli::Y),
            "MZZ" => Pair(Pauli::Z),
            "MPP" => Product,
            _ => return None,
        })
    }
}

/// A named gate applied to a list of targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    name: SmolStr,
    targets: Vec<GateTarget>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<f64>,
}

impl Gate {
    /// Create a gate, checking its targets are well formed.
    pub fn try_new(
        name: impl Into<SmolStr>,
        targets: impl IntoIterator<Item = impl Into<GateTarget>>,
        args: impl IntoIterator<Item = f64>,
    ) -> Result<Self, CircuitError> {
        let gate = Gate {
            name: name.into(),
            targets: targets.into_iter().map_into().collect(),
            args: args.into_iter().collect(),
        };
        gate.validate()?;
        Ok(gate)
    }

    /// The gate name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The gate targets.
    #[inline]
    pub fn targets(&self) -> &[GateTarget] {
        &self.targets
    }

    /// The gate parameters.
    #[inline]
    pub fn args(&self) -> &[f64] {
        &self.args
    }

    /// The measurement kind, if this gate produces records.
    pub fn measurement_kind(&self) -> Option<MeasurementKind> {
        MeasurementKind::from_name(&self.name)
    }

    /// The number of measurement records this gate produces.
    pub fn num_measurements(&self) -> usize {
        match self.measurement_kind() {
            None => 0,
            Some(MeasurementKind::Single(_)) => self.targets.len(),
            Some(MeasurementKind::Pair(_)) => self.targets.len() / 2,
            Some(MeasurementKind::Product) => self.products().count(),
        }
    }

    /// The operator measured by each record this gate produces, in record
    /// order.
    pub fn measured_paulis(&self) -> Vec<PauliMap> {
        match self.measurement_kind() {
            None => Vec::new(),
            Some(MeasurementKind::Single(p)) => self
                .qubits()
                .map(|q| PauliMap::new([(q, p)]))
                .collect(),
            Some(MeasurementKind::Pair(p)) => self
                .qubits()
                .tuples()
                .map(|(a, b)| PauliMap::new([(a, p)]).xor(&PauliMap::new([(b, p)])))
                .collect(),
            Some(MeasurementKind::Product) => self
                .products()
                .map(|factors| {
                    factors.iter().fold(PauliMap::identity(), |acc, &(p, q)| {
                        acc.xor(&PauliMap::new([(q, p)]))
                    })
                })
                .collect(),
        }
    }

    /// The qubits addressed by the gate, in target order.
    pub fn qubits(&self) -> impl Iterator<Item = Qubit> + '_ {
        self.targets.iter().filter_map(GateTarget::qubit)
    }

    /// The same gate with its qubits renamed.
    pub fn relabelled(&self, mut f: impl FnMut(Qubit) -> Qubit) -> Self {
        Gate {
            name: self.name.clone(),
            targets: self.targets.iter().map(|t| t.relabelled(&mut f)).collect(),
            args: self.args.clone(),
        }
    }

    /// Groups of pauli targets joined by combiners.
    fn products(&self) -> impl Iterator<Item = Vec<(Pauli, Qubit)>> + '_ {
        let mut groups: Vec<Vec<(Pauli, Qubit)>> = Vec::new();
        let mut joined = false;
        for target in &self.targets {
            match *target {
                GateTarget::Combiner => joined = true,
                GateTarget::Pauli(p, q) => {
                    match groups.last_mut() {
                        Some(group) if joined => group.push((p, q)),
                        _ => groups.push(vec![(p, q)]),
                    }
                    joined = false;
                }
                GateTarget::Qubit(_) => {}
            }
        }
        groups.into_iter()
    }

    fn validate(&self) -> Result<(), CircuitError> {
        let invalid = |reason: &str| CircuitError::InvalidTargets {
            gate: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.is_empty() {
            return Err(invalid("gate names cannot be empty"));
        }
        let all_qubits = self
            .targets
            .iter()
            .all(|t| matches!(t, GateTarget::Qubit(_)));
        match self.measurement_kind() {
            Some(MeasurementKind::Product) => {
                let mut prev: Option<&GateTarget> = None;
                for target in &self.targets {
                    match (prev, target) {
                        (_, GateTarget::Qubit(_)) => {
                            return Err(invalid("expected pauli targets"));
                        }
                        (_, GateTarget::Pauli(Pauli::I, _)) => {
                            return Err(invalid("identity pauli target"));
                        }
                        (None | Some(GateTarget::Combiner), GateTarget::Combiner) => {
                            return Err(invalid("misplaced product combiner"));
                        }
                        _ => {}
                    }
                    prev = Some(target);
                }
                if prev == Some(&GateTarget::Combiner) {
                    return Err(invalid("dangling product combiner"));
                }
                Ok(())
            }
            Some(MeasurementKind::Pair(_)) if !all_qubits || self.targets.len() % 2 != 0 => {
                Err(invalid("expected an even number of qubit targets"))
            }
            _ if !all_qubits => Err(invalid("expected qubit targets")),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        write_args(f, &self.args)?;
        let mut glue = false;
        for target in &self.targets {
            match target {
                GateTarget::Combiner => {
                    write!(f, "*")?;
                    glue = true;
                }
                t => {
                    if !glue {
                        write!(f, " ")?;
                    }
                    write!(f, "{t}")?;
                    glue = false;
                }
            }
        }
        Ok(())
    }
}

/// A single entry of the instruction stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// A unitary, reset or measurement gate.
    Gate(Gate),
    /// A step separator.
    Tick,
    /// Declares the coordinates of a qubit.
    QubitCoords {
        /// The declared qubit.
        qubit: Qubit,
        /// Its coordinates.
        coords: Vec<f64>,
    },
    /// Asserts that the parity of some records is deterministic.
    Detector {
        /// The records in the parity.
        records: Vec<RecTarget>,
        /// Auxiliary coordinates, relative to the accumulated shift.
        coords: Vec<f64>,
    },
    /// Includes some records into a logical observable.
    ObservableInclude {
        /// The observable index.
        index: usize,
        /// The included records.
        records: Vec<RecTarget>,
    },
    /// Offsets the coordinates of every later annotation.
    ShiftCoords(Vec<f64>),
    /// A block executed a fixed number of times.
    Repeat {
        /// The number of times the body runs.
        repetitions: usize,
        /// The repeated instructions.
        body: Circuit,
    },
}

impl Instruction {
    /// The number of records this instruction produces, including repeats.
    pub fn num_measurements(&self) -> usize {
        match self {
            Instruction::Gate(gate) => gate.num_measurements(),
            Instruction::Repeat { repetitions, body } => repetitions * body.num_measurements(),
            _ => 0,
        }
    }

    /// Whether the instruction is a detector or observable annotation.
    pub fn is_annotation(&self) -> bool {
        matches!(
            self,
            Instruction::Detector { .. }
                | Instruction::ObservableInclude { .. }
                | Instruction::QubitCoords { .. }
                | Instruction::ShiftCoords(_)
        )
    }

    pub(super) fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        write!(f, "{pad}")?;
        match self {
            Instruction::Gate(gate) => write!(f, "{gate}"),
            Instruction::Tick => write!(f, "TICK"),
            Instruction::QubitCoords { qubit, coords } => {
                write!(f, "QUBIT_COORDS")?;
                write_args(f, coords)?;
                write!(f, " {qubit}")
            }
            Instruction::Detector { records, coords } => {
                write!(f, "DETECTOR")?;
                write_args(f, coords)?;
                write_records(f, records)
            }
            Instruction::ObservableInclude { index, records } => {
                write!(f, "OBSERVABLE_INCLUDE({index})")?;
                write_records(f, records)
            }
            Instruction::ShiftCoords(coords) => {
                write!(f, "SHIFT_COORDS")?;
                write_args(f, coords)
            }
            Instruction::Repeat { repetitions, body } => {
                writeln!(f, "REPEAT {repetitions} {{")?;
                body.fmt_indented(f, indent + 1)?;
                write!(f, "{pad}}}")
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[f64]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "({})", args.iter().join(", "))
}

fn write_records(f: &mut fmt::Formatter<'_>, records: &[RecTarget]) -> fmt::Result {
    for rec in records {
        write!(f, " {rec}")?;
    }
    Ok(())
}
