//! Graph nodes and their per-block processing.
//!
//! Every node produces a stereo block. Sources (oscillators, buffer players)
//! ignore their audio inputs; processors (gain, filter, panner) transform the
//! sum of their inputs.

use crate::biquad::{Biquad, FilterKind};
use crate::param::{AudioParam, ParamKind};
use crate::waveform::Waveform;
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::sync::Arc;

/// One stereo frame: `[left, right]`.
pub type Frame = [f32; 2];

/// Identifier of a node within one [`SynthContext`](crate::SynthContext).
///
/// Ids are never reused, so a stale id fails with
/// [`SynthError::UnknownNode`](crate::SynthError::UnknownNode) rather than
/// addressing a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Get the inner id value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Playback lifecycle of a source node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceState {
    /// Created but never started.
    Idle,
    /// Started; produces sound from `start` until `stop` (if set).
    Scheduled { start: f64, stop: Option<f64> },
    /// Finished; will be released after the current block.
    Ended,
}

impl SourceState {
    fn is_sounding(&self, time: f64) -> bool {
        match *self {
            SourceState::Scheduled { start, stop } => {
                time >= start && stop.map_or(true, |s| time < s)
            }
            _ => false,
        }
    }
}

/// Broad category of a node, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Destination,
    Oscillator,
    Gain,
    Filter,
    Panner,
    BufferSource,
}

pub(crate) enum NodeKind {
    Destination,
    Oscillator {
        waveform: Waveform,
        frequency: AudioParam,
        detune: AudioParam,
        phase: f64,
    },
    Gain {
        gain: AudioParam,
    },
    Filter {
        kind: FilterKind,
        frequency: AudioParam,
        q: AudioParam,
        sections: [Biquad; 2],
    },
    Panner {
        pan: AudioParam,
    },
    BufferSource {
        data: Arc<[f32]>,
        looping: bool,
        cursor: usize,
    },
}

impl NodeKind {
    pub(crate) fn oscillator(waveform: Waveform) -> Self {
        NodeKind::Oscillator {
            waveform,
            frequency: AudioParam::new(440.0),
            detune: AudioParam::new(0.0),
            phase: 0.0,
        }
    }

    pub(crate) fn filter(kind: FilterKind) -> Self {
        let q = match kind {
            FilterKind::BandPass => 1.0,
            _ => std::f32::consts::FRAC_1_SQRT_2,
        };
        NodeKind::Filter {
            kind,
            frequency: AudioParam::new(350.0),
            q: AudioParam::new(q),
            sections: Default::default(),
        }
    }

    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Destination => NodeType::Destination,
            NodeKind::Oscillator { .. } => NodeType::Oscillator,
            NodeKind::Gain { .. } => NodeType::Gain,
            NodeKind::Filter { .. } => NodeType::Filter,
            NodeKind::Panner { .. } => NodeType::Panner,
            NodeKind::BufferSource { .. } => NodeType::BufferSource,
        }
    }

    pub(crate) fn is_source(&self) -> bool {
        matches!(
            self,
            NodeKind::Oscillator { .. } | NodeKind::BufferSource { .. }
        )
    }

    pub(crate) fn param(&self, which: ParamKind) -> Option<&AudioParam> {
        match (self, which) {
            (NodeKind::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Oscillator { detune, .. }, ParamKind::Detune) => Some(detune),
            (NodeKind::Gain { gain }, ParamKind::Gain) => Some(gain),
            (NodeKind::Filter { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Filter { q, .. }, ParamKind::Q) => Some(q),
            (NodeKind::Panner { pan }, ParamKind::Pan) => Some(pan),
            _ => None,
        }
    }

    pub(crate) fn param_mut(&mut self, which: ParamKind) -> Option<&mut AudioParam> {
        match (self, which) {
            (NodeKind::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Oscillator { detune, .. }, ParamKind::Detune) => Some(detune),
            (NodeKind::Gain { gain }, ParamKind::Gain) => Some(gain),
            (NodeKind::Filter { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Filter { q, .. }, ParamKind::Q) => Some(q),
            (NodeKind::Panner { pan }, ParamKind::Pan) => Some(pan),
            _ => None,
        }
    }

    /// All params in a fixed order; `process` reads their evaluated values by index.
    pub(crate) fn params_mut(&mut self) -> Vec<&mut AudioParam> {
        match self {
            NodeKind::Destination | NodeKind::BufferSource { .. } => Vec::new(),
            NodeKind::Oscillator {
                frequency, detune, ..
            } => vec![frequency, detune],
            NodeKind::Gain { gain } => vec![gain],
            NodeKind::Filter { frequency, q, .. } => vec![frequency, q],
            NodeKind::Panner { pan } => vec![pan],
        }
    }

    pub(crate) fn params(&self) -> Vec<&AudioParam> {
        match self {
            NodeKind::Destination | NodeKind::BufferSource { .. } => Vec::new(),
            NodeKind::Oscillator {
                frequency, detune, ..
            } => vec![frequency, detune],
            NodeKind::Gain { gain } => vec![gain],
            NodeKind::Filter { frequency, q, .. } => vec![frequency, q],
            NodeKind::Panner { pan } => vec![pan],
        }
    }
}

/// A node as stored in the context graph.
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    /// Nodes whose output is summed into this node's input.
    pub(crate) inputs: Vec<NodeId>,
    /// `Some` for sources only.
    pub(crate) source: Option<SourceState>,
    /// Pinned nodes are never collected as orphans.
    pub(crate) pinned: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        let source = kind.is_source().then_some(SourceState::Idle);
        Self {
            kind,
            inputs: Vec::new(),
            source,
            pinned: false,
        }
    }

    /// Render one block.
    ///
    /// `input` is the summed audio input; `params[i]` holds the per-frame
    /// values of the i-th param in `params_mut` order.
    pub(crate) fn process(
        &mut self,
        input: &[Frame],
        params: &[Vec<f32>],
        start_time: f64,
        sample_rate: f64,
        out: &mut [Frame],
    ) {
        let source = self.source;
        match &mut self.kind {
            NodeKind::Destination => out.copy_from_slice(input),
            NodeKind::Oscillator {
                waveform, phase, ..
            } => {
                let (freq, detune) = (&params[0], &params[1]);
                for (i, frame) in out.iter_mut().enumerate() {
                    let t = start_time + i as f64 / sample_rate;
                    let sounding = source.map_or(false, |s| s.is_sounding(t));
                    if !sounding {
                        *frame = [0.0; 2];
                        continue;
                    }
                    let s = waveform.sample(*phase);
                    *frame = [s, s];
                    let hz = freq[i] as f64 * 2f64.powf(detune[i] as f64 / 1200.0);
                    *phase = (*phase + hz / sample_rate).rem_euclid(1.0);
                }
            }
            NodeKind::Gain { .. } => {
                let gain = &params[0];
                for (i, frame) in out.iter_mut().enumerate() {
                    let [l, r] = input[i];
                    *frame = [l * gain[i], r * gain[i]];
                }
            }
            NodeKind::Filter { kind, sections, .. } => {
                let (freq, q) = (&params[0], &params[1]);
                for (i, frame) in out.iter_mut().enumerate() {
                    for (ch, section) in sections.iter_mut().enumerate() {
                        section.tune(*kind, freq[i], q[i], sample_rate);
                        frame[ch] = section.process(input[i][ch]);
                    }
                }
            }
            NodeKind::Panner { .. } => {
                let pan = &params[0];
                for (i, frame) in out.iter_mut().enumerate() {
                    let mono = (input[i][0] + input[i][1]) * 0.5;
                    let x = (pan[i].clamp(-1.0, 1.0) + 1.0) * 0.5 * FRAC_PI_2;
                    *frame = [mono * x.cos(), mono * x.sin()];
                }
            }
            NodeKind::BufferSource {
                data,
                looping,
                cursor,
            } => {
                for (i, frame) in out.iter_mut().enumerate() {
                    let t = start_time + i as f64 / sample_rate;
                    let sounding = source.map_or(false, |s| s.is_sounding(t));
                    if !sounding || data.is_empty() || (*cursor >= data.len() && !*looping) {
                        *frame = [0.0; 2];
                        continue;
                    }
                    if *cursor >= data.len() {
                        *cursor = 0;
                    }
                    let s = data[*cursor];
                    *cursor += 1;
                    *frame = [s, s];
                }
            }
        }
    }

    /// Whether a non-looping buffer has played to its end.
    pub(crate) fn is_exhausted(&self) -> bool {
        match &self.kind {
            NodeKind::BufferSource {
                data,
                looping,
                cursor,
            } => !*looping && *cursor >= data.len(),
            _ => false,
        }
    }
}
