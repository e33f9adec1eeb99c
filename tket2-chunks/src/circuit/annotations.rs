//! Absolute views of the annotations in a circuit.

use itertools::Itertools;

use super::{Circuit, Instruction, RecTarget};

/// The kind of an [`Annotation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationKind {
    /// A detector.
    Detector,
    /// An inclusion into the observable with the given index.
    Observable(usize),
}

/// A detector or observable inclusion, resolved against the whole circuit.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Whether this is a detector or an observable inclusion.
    pub kind: AnnotationKind,
    /// Absolute record indices, sorted.
    pub records: Vec<usize>,
    /// Coordinates with all preceding shifts applied.
    pub coords: Vec<f64>,
}

impl Circuit {
    /// Every detector and observable inclusion, in execution order.
    ///
    /// Repeat blocks are unrolled and coordinate shifts accumulated, so two
    /// circuits that differ only in how they are folded produce the same
    /// annotations.
    pub fn annotations(&self) -> Vec<Annotation> {
        let mut replay = Replay::default();
        replay.run(self);
        replay.annotations
    }

    /// Only the detectors of [`Circuit::annotations`].
    pub fn detectors(&self) -> Vec<Annotation> {
        self.annotations()
            .into_iter()
            .filter(|a| a.kind == AnnotationKind::Detector)
            .collect()
    }
}

#[derive(Default)]
struct Replay {
    measurements: usize,
    shift: Vec<f64>,
    annotations: Vec<Annotation>,
}

impl Replay {
    fn run(&mut self, circ: &Circuit) {
        for inst in circ.instructions() {
            match inst {
                Instruction::Gate(gate) => self.measurements += gate.num_measurements(),
                Instruction::Detector { records, coords } => {
                    let coords = coords
                        .iter()
                        .enumerate()
                        .map(|(i, c)| c + self.shift.get(i).copied().unwrap_or(0.0))
                        .collect();
                    self.record(AnnotationKind::Detector, records, coords);
                }
                Instruction::ObservableInclude { index, records } => {
                    self.record(AnnotationKind::Observable(*index), records, Vec::new());
                }
                Instruction::ShiftCoords(delta) => {
                    if self.shift.len() < delta.len() {
                        self.shift.resize(delta.len(), 0.0);
                    }
                    for (s, d) in self.shift.iter_mut().zip(delta) {
                        *s += d;
                    }
                }
                Instruction::Repeat { repetitions, body } => {
                    for _ in 0..*repetitions {
                        self.run(body);
                    }
                }
                Instruction::Tick | Instruction::QubitCoords { .. } => {}
            }
        }
    }

    fn record(&mut self, kind: AnnotationKind, records: &[RecTarget], coords: Vec<f64>) {
        let records = records
            .iter()
            .map(|rec| (self.measurements as i64 + rec.0) as usize)
            .sorted()
            .collect();
        self.annotations.push(Annotation {
            kind,
            records,
            coords,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folded_and_unrolled_agree() {
        let mut body = Circuit::new();
        body.append("M", [0u32], []).unwrap();
        body.append_detector(vec![RecTarget(-1), RecTarget(-2)], vec![0.5, 0.0, 0.0]);
        body.append_shift_coords(vec![0.0, 0.0, 1.0]);

        let mut folded = Circuit::new();
        folded.append("M", [0u32], []).unwrap();
        folded.append_repeat(3, body.clone());

        let mut unrolled = Circuit::new();
        unrolled.append("M", [0u32], []).unwrap();
        for _ in 0..3 {
            unrolled.extend(body.clone());
        }

        let dets = folded.detectors();
        assert_eq!(dets, unrolled.detectors());
        assert_eq!(dets.len(), 3);
        assert_eq!(dets[2].records, vec![2, 3]);
        assert_eq!(dets[2].coords, vec![0.5, 0.0, 2.0]);
    }
}
