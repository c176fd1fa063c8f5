//! The synthesis context: node graph, frame clock and block renderer.
//!
//! A [`SynthContext`] owns every node it creates. Callers hold [`NodeId`]s
//! and address nodes through the context. Rendering pulls the graph from the
//! destination in dependency order, one block at a time, and advances the
//! clock.
//!
//! # Self-release
//!
//! After each block, sources whose stop time has passed are released,
//! together with any processing node that lost its last audio input as a
//! consequence. A fire-and-forget voice (oscillator → gain → panner) therefore
//! disappears on its own once its scheduled stop time is reached. Nodes that
//! must outlive their inputs (a shared bus, the master gain) are [`pin`]ned.
//!
//! [`pin`]: SynthContext::pin

use crate::biquad::FilterKind;
use crate::errors::{Result, SynthError};
use crate::node::{Frame, Node, NodeId, NodeKind, NodeType, SourceState};
use crate::param::{AudioParam, ParamKind};
use crate::waveform::Waveform;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Lowest sample rate a context accepts.
pub const MIN_SAMPLE_RATE: u32 = 8_000;
/// Highest sample rate a context accepts.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Largest render block, in frames.
pub const MAX_BLOCK_SIZE: usize = 8_192;

/// Options for creating a [`SynthContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextOptions {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Frames rendered per block.
    pub block_size: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 128,
        }
    }
}

impl ContextOptions {
    /// Create options with the given sample rate and the default block size.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}

/// Lifecycle of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Closed,
}

/// An audio graph with its own output clock.
pub struct SynthContext {
    sample_rate: u32,
    block_size: usize,
    frames: u64,
    state: ContextState,
    next_id: u64,
    destination: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    outputs: HashMap<NodeId, Vec<Frame>>,
    input_scratch: Vec<Frame>,
    param_scratch: Vec<Vec<f32>>,
}

impl std::fmt::Debug for SynthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthContext")
            .field("sample_rate", &self.sample_rate)
            .field("time", &self.current_time())
            .field("nodes", &self.nodes.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SynthContext {
    /// Acquire a new context.
    ///
    /// Fails with [`SynthError::Unavailable`] when the options cannot be honoured.
    pub fn new(options: ContextOptions) -> Result<Self> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&options.sample_rate) {
            return Err(SynthError::Unavailable(format!(
                "unsupported sample rate {} Hz",
                options.sample_rate
            )));
        }
        if options.block_size == 0 || options.block_size > MAX_BLOCK_SIZE {
            return Err(SynthError::Unavailable(format!(
                "unsupported block size {}",
                options.block_size
            )));
        }

        let destination = NodeId(0);
        let mut nodes = BTreeMap::new();
        let mut dest = Node::new(NodeKind::Destination);
        dest.pinned = true;
        nodes.insert(destination, dest);

        log::debug!(
            "Synthesis context acquired ({} Hz, {} frame blocks)",
            options.sample_rate,
            options.block_size
        );

        Ok(Self {
            sample_rate: options.sample_rate,
            block_size: options.block_size,
            frames: 0,
            state: ContextState::Running,
            next_id: 1,
            destination,
            nodes,
            outputs: HashMap::new(),
            input_scratch: Vec::new(),
            param_scratch: Vec::new(),
        })
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Seconds of audio rendered so far.
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// The node that feeds the output device.
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ContextState::Closed
    }

    /// Number of live nodes, including the destination.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of sources that have been started and not yet ended.
    pub fn active_sources(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n.source, Some(SourceState::Scheduled { .. })))
            .count()
    }

    /// Whether `id` is still alive in this context.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Kind of a live node.
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.nodes.get(&id).map(|n| n.kind.node_type())
    }

    /// Lifecycle of a live source node.
    pub fn source_state(&self, id: NodeId) -> Option<SourceState> {
        self.nodes.get(&id).and_then(|n| n.source)
    }

    /// Audio inputs of a live node.
    pub fn inputs(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(&id).map(|n| n.inputs.as_slice())
    }

    // === Node creation ===

    fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(kind));
        id
    }

    /// Create an oscillator (440 Hz, no detune). It stays silent until started.
    pub fn create_oscillator(&mut self, waveform: Waveform) -> NodeId {
        self.add(NodeKind::oscillator(waveform))
    }

    /// Create a gain node (unity gain).
    pub fn create_gain(&mut self) -> NodeId {
        self.add(NodeKind::Gain {
            gain: AudioParam::new(1.0),
        })
    }

    /// Create a biquad filter (350 Hz cutoff).
    pub fn create_filter(&mut self, kind: FilterKind) -> NodeId {
        self.add(NodeKind::filter(kind))
    }

    /// Create an equal-power stereo panner (centred).
    pub fn create_panner(&mut self) -> NodeId {
        self.add(NodeKind::Panner {
            pan: AudioParam::new(0.0),
        })
    }

    /// Create a player for a mono sample buffer at the context rate.
    pub fn create_buffer_source(&mut self, data: Arc<[f32]>, looping: bool) -> NodeId {
        self.add(NodeKind::BufferSource {
            data,
            looping,
            cursor: 0,
        })
    }

    // === Wiring ===

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(SynthError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(SynthError::UnknownNode(id))
    }

    /// Route `from`'s output into `to`'s audio input.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.node(from)?;
        if self.node(to)?.kind.is_source() {
            return Err(SynthError::InvalidState {
                node: to,
                reason: "sources have no audio input",
            });
        }
        if from == to || self.depends_on(from, to) {
            return Err(SynthError::Cycle { from, to });
        }
        let target = self.node_mut(to)?;
        if !target.inputs.contains(&from) {
            target.inputs.push(from);
        }
        Ok(())
    }

    /// Route `from`'s output (left channel) into a param of `to` at audio rate.
    pub fn connect_param(&mut self, from: NodeId, to: NodeId, param: ParamKind) -> Result<()> {
        self.node(from)?;
        if from == to || self.depends_on(from, to) {
            return Err(SynthError::Cycle { from, to });
        }
        let target = self.param_mut(to, param)?;
        if !target.modulators.contains(&from) {
            target.modulators.push(from);
        }
        Ok(())
    }

    /// Remove every outgoing connection of `id`.
    pub fn disconnect(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        for node in self.nodes.values_mut() {
            node.inputs.retain(|&i| i != id);
            for param in node.kind.params_mut() {
                param.modulators.retain(|&m| m != id);
            }
        }
        Ok(())
    }

    /// Whether `node` (transitively) consumes the output of `upstream`.
    fn depends_on(&self, node: NodeId, upstream: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == upstream {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(n) = self.nodes.get(&id) {
                stack.extend(n.inputs.iter().copied());
                for param in n.kind.params() {
                    stack.extend(param.modulators.iter().copied());
                }
            }
        }
        false
    }

    /// Borrow a node's param.
    pub fn param(&self, id: NodeId, param: ParamKind) -> Result<&AudioParam> {
        self.node(id)?
            .kind
            .param(param)
            .ok_or(SynthError::NoSuchParam { node: id, param })
    }

    /// Mutably borrow a node's param for automation.
    pub fn param_mut(&mut self, id: NodeId, param: ParamKind) -> Result<&mut AudioParam> {
        self.node_mut(id)?
            .kind
            .param_mut(param)
            .ok_or(SynthError::NoSuchParam { node: id, param })
    }

    /// Change an oscillator's wave shape.
    pub fn set_waveform(&mut self, id: NodeId, shape: Waveform) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Oscillator { waveform, .. } => {
                *waveform = shape;
                Ok(())
            }
            _ => Err(SynthError::InvalidState {
                node: id,
                reason: "not an oscillator",
            }),
        }
    }

    /// Exempt a processing node from orphan collection.
    pub fn pin(&mut self, id: NodeId) -> Result<()> {
        self.node_mut(id)?.pinned = true;
        Ok(())
    }

    // === Source lifecycle ===

    /// Start a source at `when` (context seconds). A source starts at most once.
    pub fn start(&mut self, id: NodeId, when: f64) -> Result<()> {
        if self.is_closed() {
            return Err(SynthError::Closed);
        }
        let node = self.node_mut(id)?;
        match node.source {
            None => Err(SynthError::InvalidState {
                node: id,
                reason: "not a source",
            }),
            Some(SourceState::Idle) => {
                node.source = Some(SourceState::Scheduled {
                    start: when.max(0.0),
                    stop: None,
                });
                Ok(())
            }
            Some(_) => Err(SynthError::InvalidState {
                node: id,
                reason: "already started",
            }),
        }
    }

    /// Schedule a started source to stop at `when`.
    ///
    /// Stopping a source that has already ended fails with
    /// [`SynthError::InvalidState`], or [`SynthError::UnknownNode`] once it has
    /// been released; callers tearing down a graph are expected to tolerate both.
    pub fn stop(&mut self, id: NodeId, when: f64) -> Result<()> {
        let node = self.node_mut(id)?;
        match node.source {
            None => Err(SynthError::InvalidState {
                node: id,
                reason: "not a source",
            }),
            Some(SourceState::Idle) => Err(SynthError::InvalidState {
                node: id,
                reason: "not started",
            }),
            Some(SourceState::Ended) => Err(SynthError::InvalidState {
                node: id,
                reason: "already ended",
            }),
            Some(SourceState::Scheduled { start, .. }) => {
                node.source = Some(SourceState::Scheduled {
                    start,
                    stop: Some(when.max(start)),
                });
                Ok(())
            }
        }
    }

    /// Release every node and stop the clock. Rendering afterwards yields silence.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state = ContextState::Closed;
        let released = self.nodes.len().saturating_sub(1);
        self.nodes.retain(|&id, _| id == self.destination);
        if let Some(dest) = self.nodes.get_mut(&self.destination) {
            dest.inputs.clear();
        }
        self.outputs.clear();
        log::debug!("Synthesis context closed ({} nodes released)", released);
    }

    // === Rendering ===

    /// Render interleaved stereo frames into `out` and advance the clock.
    ///
    /// `out.len()` should be even; a trailing odd sample is zeroed.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.is_closed() {
            out.fill(0.0);
            return;
        }
        let block = self.block_size * 2;
        for chunk in out.chunks_mut(block) {
            let frames = chunk.len() / 2;
            if frames > 0 {
                self.render_block(frames);
                if let Some(dest) = self.outputs.get(&self.destination) {
                    for (i, frame) in dest.iter().take(frames).enumerate() {
                        chunk[i * 2] = frame[0].clamp(-1.0, 1.0);
                        chunk[i * 2 + 1] = frame[1].clamp(-1.0, 1.0);
                    }
                }
            }
            if chunk.len() % 2 == 1 {
                chunk[chunk.len() - 1] = 0.0;
            }
        }
    }

    /// Nodes reachable from the destination, dependencies first.
    fn processing_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        // (node, children already pushed)
        let mut stack = vec![(self.destination, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            stack.push((id, true));
            for &input in &node.inputs {
                if !visited.contains(&input) {
                    stack.push((input, false));
                }
            }
            for param in node.kind.params() {
                for &m in &param.modulators {
                    if !visited.contains(&m) {
                        stack.push((m, false));
                    }
                }
            }
        }
        order
    }

    fn render_block(&mut self, frames: usize) {
        let start_time = self.current_time();
        let sample_rate = self.sample_rate as f64;

        for id in self.processing_order() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };

            self.input_scratch.clear();
            self.input_scratch.resize(frames, [0.0; 2]);
            for input in &node.inputs {
                if let Some(buf) = self.outputs.get(input) {
                    for (acc, frame) in self.input_scratch.iter_mut().zip(buf) {
                        acc[0] += frame[0];
                        acc[1] += frame[1];
                    }
                }
            }

            let params = node.kind.params_mut();
            if self.param_scratch.len() < params.len() {
                self.param_scratch.resize_with(params.len(), Vec::new);
            }
            for (slot, param) in params.into_iter().enumerate() {
                let values = &mut self.param_scratch[slot];
                values.clear();
                for f in 0..frames {
                    let t = start_time + f as f64 / sample_rate;
                    let mut v = param.next_value(t);
                    for m in &param.modulators {
                        if let Some(buf) = self.outputs.get(m) {
                            v += buf.get(f).map_or(0.0, |frame| frame[0]);
                        }
                    }
                    values.push(v);
                }
            }

            let mut out = self.outputs.remove(&id).unwrap_or_default();
            out.clear();
            out.resize(frames, [0.0; 2]);
            node.process(
                &self.input_scratch,
                &self.param_scratch,
                start_time,
                sample_rate,
                &mut out,
            );
            self.outputs.insert(id, out);
        }

        self.frames += frames as u64;
        self.collect_finished();
    }

    /// Release ended sources and the processing chains they leave orphaned.
    fn collect_finished(&mut self) {
        let now = self.current_time();
        let mut doomed: Vec<NodeId> = Vec::new();
        for (&id, node) in self.nodes.iter_mut() {
            let ended = match node.source {
                Some(SourceState::Scheduled { stop: Some(stop), .. }) => stop <= now,
                Some(SourceState::Ended) => true,
                _ => false,
            } || node.is_exhausted();
            if ended {
                node.source = Some(SourceState::Ended);
                doomed.push(id);
            }
        }

        let mut released = 0usize;
        while let Some(id) = doomed.pop() {
            if self.nodes.remove(&id).is_none() {
                continue;
            }
            self.outputs.remove(&id);
            released += 1;
            for (&other, node) in self.nodes.iter_mut() {
                let before = node.inputs.len();
                node.inputs.retain(|&i| i != id);
                for param in node.kind.params_mut() {
                    param.modulators.retain(|&m| m != id);
                }
                let orphaned = before > 0 && node.inputs.is_empty();
                if orphaned && !node.pinned && !node.kind.is_source() {
                    doomed.push(other);
                }
            }
        }
        if released > 0 {
            log::trace!("Released {} finished nodes at {:.3}s", released, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SynthContext {
        SynthContext::new(ContextOptions::new(48_000)).unwrap()
    }

    fn render_seconds(ctx: &mut SynthContext, seconds: f64) -> Vec<f32> {
        let frames = (seconds * ctx.sample_rate() as f64) as usize;
        let mut out = vec![0.0; frames * 2];
        ctx.render(&mut out);
        out
    }

    fn peak(buf: &[f32]) -> f32 {
        buf.iter().fold(0.0f32, |m, v| m.max(v.abs()))
    }

    #[test]
    fn test_new_rejects_bad_options() {
        assert!(matches!(
            SynthContext::new(ContextOptions::new(0)),
            Err(SynthError::Unavailable(_))
        ));
        assert!(matches!(
            SynthContext::new(ContextOptions::new(48_000).with_block_size(0)),
            Err(SynthError::Unavailable(_))
        ));
    }

    #[test]
    fn test_empty_context_renders_silence_and_advances() {
        let mut ctx = ctx();
        let out = render_seconds(&mut ctx, 0.5);
        assert_eq!(peak(&out), 0.0);
        assert!((ctx.current_time() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_oscillator_through_gain_is_audible() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator(Waveform::Sine);
        let gain = ctx.create_gain();
        ctx.param_mut(gain, ParamKind::Gain).unwrap().set_value(0.5);
        ctx.connect(osc, gain).unwrap();
        ctx.connect(gain, ctx.destination()).unwrap();
        ctx.start(osc, 0.0).unwrap();
        let out = render_seconds(&mut ctx, 0.1);
        let p = peak(&out);
        assert!(p > 0.45 && p <= 0.5, "peak was {}", p);
    }

    #[test]
    fn test_connect_rejects_cycles_and_sources() {
        let mut ctx = ctx();
        let a = ctx.create_gain();
        let b = ctx.create_gain();
        let osc = ctx.create_oscillator(Waveform::Sine);
        ctx.connect(a, b).unwrap();
        assert!(matches!(ctx.connect(b, a), Err(SynthError::Cycle { .. })));
        assert!(matches!(ctx.connect(a, a), Err(SynthError::Cycle { .. })));
        assert!(matches!(
            ctx.connect(a, osc),
            Err(SynthError::InvalidState { .. })
        ));
        assert!(matches!(
            ctx.connect_param(b, a, ParamKind::Gain),
            Err(SynthError::Cycle { .. })
        ));
    }

    #[test]
    fn test_param_lookup_errors() {
        let mut ctx = ctx();
        let gain = ctx.create_gain();
        assert!(matches!(
            ctx.param(gain, ParamKind::Pan),
            Err(SynthError::NoSuchParam { .. })
        ));
        assert!(matches!(
            ctx.param(NodeId(999), ParamKind::Gain),
            Err(SynthError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_start_twice_and_stop_before_start_fail() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator(Waveform::Sine);
        assert!(matches!(
            ctx.stop(osc, 0.0),
            Err(SynthError::InvalidState { .. })
        ));
        ctx.start(osc, 0.0).unwrap();
        assert!(matches!(
            ctx.start(osc, 0.0),
            Err(SynthError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_fire_and_forget_voice_self_releases() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut ctx = ctx();
        let master = ctx.create_gain();
        ctx.connect(master, ctx.destination()).unwrap();
        ctx.pin(master).unwrap();

        let osc = ctx.create_oscillator(Waveform::Sine);
        let env = ctx.create_gain();
        let pan = ctx.create_panner();
        ctx.connect(osc, env).unwrap();
        ctx.connect(env, pan).unwrap();
        ctx.connect(pan, master).unwrap();
        ctx.start(osc, 0.0).unwrap();
        ctx.stop(osc, 0.2).unwrap();
        assert_eq!(ctx.node_count(), 5);

        render_seconds(&mut ctx, 0.1);
        assert!(ctx.contains(osc));

        render_seconds(&mut ctx, 0.2);
        assert!(!ctx.contains(osc));
        assert!(!ctx.contains(env));
        assert!(!ctx.contains(pan));
        assert!(ctx.contains(master));
        assert_eq!(ctx.node_count(), 2);

        // The voice already halted itself.
        assert!(matches!(
            ctx.stop(osc, 0.5),
            Err(SynthError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_shared_processor_survives_while_inputs_remain() {
        let mut ctx = ctx();
        let bus = ctx.create_gain();
        ctx.connect(bus, ctx.destination()).unwrap();
        let short = ctx.create_oscillator(Waveform::Sine);
        let long = ctx.create_oscillator(Waveform::Sine);
        ctx.connect(short, bus).unwrap();
        ctx.connect(long, bus).unwrap();
        ctx.start(short, 0.0).unwrap();
        ctx.start(long, 0.0).unwrap();
        ctx.stop(short, 0.05).unwrap();

        render_seconds(&mut ctx, 0.1);
        assert!(!ctx.contains(short));
        assert!(ctx.contains(bus));
        assert_eq!(ctx.inputs(bus).unwrap(), &[long]);
    }

    #[test]
    fn test_modulator_drives_param() {
        let mut ctx = ctx();
        // A constant "LFO": square wave at 0 Hz sits at +1.
        let lfo = ctx.create_oscillator(Waveform::Square);
        ctx.param_mut(lfo, ParamKind::Frequency).unwrap().set_value(0.0);
        let depth = ctx.create_gain();
        ctx.param_mut(depth, ParamKind::Gain).unwrap().set_value(0.25);
        ctx.connect(lfo, depth).unwrap();

        let osc = ctx.create_oscillator(Waveform::Square);
        ctx.param_mut(osc, ParamKind::Frequency).unwrap().set_value(0.0);
        let vca = ctx.create_gain();
        ctx.param_mut(vca, ParamKind::Gain).unwrap().set_value(0.25);
        ctx.connect(osc, vca).unwrap();
        ctx.connect_param(depth, vca, ParamKind::Gain).unwrap();
        ctx.connect(vca, ctx.destination()).unwrap();

        ctx.start(lfo, 0.0).unwrap();
        ctx.start(osc, 0.0).unwrap();
        let out = render_seconds(&mut ctx, 0.01);
        // 0.25 base + 0.25 modulation
        assert!((out[2] - 0.5).abs() < 1e-6, "got {}", out[2]);
    }

    #[test]
    fn test_looping_buffer_keeps_playing() {
        let mut ctx = ctx();
        let data: Arc<[f32]> = Arc::from(vec![0.3f32; 64]);
        let src = ctx.create_buffer_source(data, true);
        ctx.connect(src, ctx.destination()).unwrap();
        ctx.start(src, 0.0).unwrap();
        let out = render_seconds(&mut ctx, 0.5);
        assert!((out[out.len() - 2] - 0.3).abs() < 1e-6);
        assert!(ctx.contains(src));
    }

    #[test]
    fn test_one_shot_buffer_is_released_when_exhausted() {
        let mut ctx = ctx();
        let data: Arc<[f32]> = Arc::from(vec![0.3f32; 64]);
        let src = ctx.create_buffer_source(data, false);
        ctx.connect(src, ctx.destination()).unwrap();
        ctx.start(src, 0.0).unwrap();
        render_seconds(&mut ctx, 0.1);
        assert!(!ctx.contains(src));
    }

    #[test]
    fn test_close_releases_everything() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator(Waveform::Sine);
        ctx.connect(osc, ctx.destination()).unwrap();
        ctx.start(osc, 0.0).unwrap();
        ctx.close();
        assert!(ctx.is_closed());
        assert_eq!(ctx.node_count(), 1);
        assert!(matches!(ctx.start(osc, 0.0), Err(SynthError::Closed)));
        let out = render_seconds(&mut ctx, 0.05);
        assert_eq!(peak(&out), 0.0);
        // idempotent
        ctx.close();
    }

    #[test]
    fn test_disconnect_silences_route() {
        let mut ctx = ctx();
        let osc = ctx.create_oscillator(Waveform::Square);
        ctx.connect(osc, ctx.destination()).unwrap();
        ctx.start(osc, 0.0).unwrap();
        ctx.disconnect(osc).unwrap();
        let out = render_seconds(&mut ctx, 0.05);
        assert_eq!(peak(&out), 0.0);
    }
}
