use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{
    body::rig::{BodyPart, NUM_JOINTS},
    config::OutputTypes,
    foundation::core::FrameIndex,
    foundation::error::{SynthError, SynthResult},
};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
/// One image stream produced per rendered frame.
pub enum RenderChannel {
    Composite,
    Depth,
    Normal,
    Flow,
    Segmentation,
    Foreground,
    MotionBlur,
}

impl RenderChannel {
    pub const ALL: [RenderChannel; 7] = [
        RenderChannel::Composite,
        RenderChannel::Depth,
        RenderChannel::Normal,
        RenderChannel::Flow,
        RenderChannel::Segmentation,
        RenderChannel::Foreground,
        RenderChannel::MotionBlur,
    ];

    /// Short name used in temp directory names.
    pub fn key(self) -> &'static str {
        match self {
            Self::Composite => "rgb",
            Self::Depth => "depth",
            Self::Normal => "normal",
            Self::Flow => "gtflow",
            Self::Segmentation => "segm",
            Self::Foreground => "fg",
            Self::MotionBlur => "vblur",
        }
    }

    /// Float data goes to EXR, viewable images to PNG.
    pub fn format(self) -> ChannelFormat {
        match self {
            Self::Depth | Self::Normal | Self::Flow | Self::Segmentation => ChannelFormat::Exr,
            Self::Composite | Self::Foreground | Self::MotionBlur => ChannelFormat::Png,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChannelFormat {
    Png,
    Exr,
}

impl ChannelFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Exr => "exr",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Enabled render channels. The composite is always on; the set is fixed once built.
pub struct RenderChannelSet {
    optional: OutputTypes,
}

impl RenderChannelSet {
    pub fn new(optional: OutputTypes) -> Self {
        Self { optional }
    }

    pub fn contains(&self, channel: RenderChannel) -> bool {
        let o = &self.optional;
        match channel {
            RenderChannel::Composite => true,
            RenderChannel::Depth => o.depth,
            RenderChannel::Normal => o.normal,
            RenderChannel::Flow => o.flow,
            RenderChannel::Segmentation => o.segmentation,
            RenderChannel::Foreground => o.foreground,
            RenderChannel::MotionBlur => o.motion_blur,
        }
    }

    /// Enabled channels, composite first.
    pub fn enabled(&self) -> impl Iterator<Item = RenderChannel> + '_ {
        RenderChannel::ALL
            .into_iter()
            .filter(move |&c| self.contains(c))
    }
}

/// Where a job's channel frames are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPaths {
    /// Composite frame directory (`{name}_c{cut:04}.mp4` inside the temp root).
    pub composite_dir: PathBuf,
    /// Temp root; side channels go to `{dataset_index:05}_{key}` inside it.
    pub tmp_root: PathBuf,
    pub dataset_index: usize,
}

impl ChannelPaths {
    pub fn channel_dir(&self, channel: RenderChannel) -> PathBuf {
        match channel {
            RenderChannel::Composite => self.composite_dir.clone(),
            other => self
                .tmp_root
                .join(format!("{:05}_{}", self.dataset_index, other.key())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Directory and file naming of one channel's frames.
pub struct ChannelOutput {
    pub dir: PathBuf,
    pub format: ChannelFormat,
}

impl ChannelOutput {
    /// `Image{frame:04}.{ext}` inside the channel directory.
    pub fn frame_path(&self, frame: FrameIndex) -> PathBuf {
        self.dir
            .join(format!("Image{:04}.{}", frame.0, self.format.extension()))
    }

    /// ffmpeg input pattern matching [`ChannelOutput::frame_path`].
    pub fn frame_pattern(&self) -> PathBuf {
        self.dir
            .join(format!("Image%04d.{}", self.format.extension()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifier for a node declared in [`RenderGraph::nodes`].
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq)]
/// Compositor node.
pub enum GraphNode {
    /// Rendered scene passes.
    RenderLayers,
    BackgroundImage,
    /// Foreground over background using the foreground alpha.
    AlphaOver,
    VectorBlur { factor: f32 },
    FileOutput { channel: RenderChannel },
    /// Final composite image.
    Composite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Named output socket of a node.
pub enum Socket {
    Image,
    Depth,
    Normal,
    Speed,
    MaterialIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub from: NodeId,
    pub socket: Socket,
    pub to: NodeId,
    /// Input slot on the target node.
    pub input: u32,
}

#[derive(Clone, Debug, PartialEq)]
/// Compositor wiring for one job: background + foreground mix, optional vector blur and one file
/// output per enabled side channel.
pub struct RenderGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<Link>,
    pub outputs: BTreeMap<RenderChannel, ChannelOutput>,
}

impl RenderGraph {
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn find(&self, pred: impl Fn(&GraphNode) -> bool) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(pred)
            .map(|i| NodeId(i as u32))
    }

    pub fn output(&self, channel: RenderChannel) -> Option<&ChannelOutput> {
        self.outputs.get(&channel)
    }

    /// Links feeding `to`, ordered by input slot.
    pub fn inputs_of(&self, to: NodeId) -> Vec<Link> {
        let mut v: Vec<Link> = self.links.iter().copied().filter(|l| l.to == to).collect();
        v.sort_by_key(|l| l.input);
        v
    }

    fn add(&mut self, node: GraphNode) -> NodeId {
        self.nodes.push(node);
        NodeId((self.nodes.len() - 1) as u32)
    }

    fn link(&mut self, from: NodeId, socket: Socket, to: NodeId, input: u32) {
        self.links.push(Link {
            from,
            socket,
            to,
            input,
        });
    }
}

/// Build the compositor graph for the enabled channels.
///
/// `motion_blur_factor` must be present exactly when the motion-blur channel is enabled.
pub fn build_render_graph(
    channels: &RenderChannelSet,
    paths: &ChannelPaths,
    motion_blur_factor: Option<f32>,
) -> SynthResult<RenderGraph> {
    let blur = channels.contains(RenderChannel::MotionBlur);
    if blur != motion_blur_factor.is_some() {
        return Err(SynthError::precondition(if blur {
            "motion-blur channel enabled without a blur factor"
        } else {
            "blur factor given but the motion-blur channel is disabled"
        }));
    }

    let mut g = RenderGraph {
        nodes: Vec::new(),
        links: Vec::new(),
        outputs: BTreeMap::new(),
    };
    let layers = g.add(GraphNode::RenderLayers);
    let bg = g.add(GraphNode::BackgroundImage);
    let mix = g.add(GraphNode::AlphaOver);
    let composite = g.add(GraphNode::Composite);

    g.link(bg, Socket::Image, mix, 1);
    g.link(layers, Socket::Image, mix, 2);
    g.link(mix, Socket::Image, composite, 0);

    if let Some(factor) = motion_blur_factor {
        let vblur = g.add(GraphNode::VectorBlur { factor });
        let out = g.add(GraphNode::FileOutput {
            channel: RenderChannel::MotionBlur,
        });
        g.link(mix, Socket::Image, vblur, 0);
        g.link(layers, Socket::Depth, vblur, 1);
        g.link(layers, Socket::Speed, vblur, 2);
        g.link(vblur, Socket::Image, out, 0);
    }

    for (channel, socket) in [
        (RenderChannel::Foreground, Socket::Image),
        (RenderChannel::Depth, Socket::Depth),
        (RenderChannel::Normal, Socket::Normal),
        (RenderChannel::Flow, Socket::Speed),
        (RenderChannel::Segmentation, Socket::MaterialIndex),
    ] {
        if channels.contains(channel) {
            let out = g.add(GraphNode::FileOutput { channel });
            g.link(layers, socket, out, 0);
        }
    }

    for channel in channels.enabled() {
        g.outputs.insert(
            channel,
            ChannelOutput {
                dir: paths.channel_dir(channel),
                format: channel.format(),
            },
        );
    }

    tracing::debug!(
        nodes = g.nodes.len(),
        links = g.links.len(),
        channels = g.outputs.len(),
        "render graph built"
    );
    Ok(g)
}

/// Segmentation pass index for every body part: `1..=24` in canonical order, `0` is background.
pub fn segmentation_labels() -> [(BodyPart, u8); NUM_JOINTS] {
    BodyPart::ALL.map(|part| (part, part.index() as u8 + 1))
}

#[cfg(test)]
#[path = "../../tests/unit/render/graph.rs"]
mod tests;
