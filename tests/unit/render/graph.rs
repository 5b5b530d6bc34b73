use super::*;

fn paths() -> ChannelPaths {
    ChannelPaths {
        composite_dir: PathBuf::from("tmp/run0_01_01_c0001/01_01_c0001.mp4"),
        tmp_root: PathBuf::from("tmp/run0_01_01_c0001"),
        dataset_index: 7,
    }
}

fn all_on() -> OutputTypes {
    OutputTypes {
        depth: true,
        normal: true,
        flow: true,
        segmentation: true,
        foreground: true,
        motion_blur: true,
    }
}

#[test]
fn composite_only_graph() {
    let g = build_render_graph(&RenderChannelSet::default(), &paths(), None).unwrap();
    assert_eq!(g.nodes.len(), 4);
    assert_eq!(g.outputs.len(), 1);
    let out = g.output(RenderChannel::Composite).unwrap();
    assert_eq!(out.format, ChannelFormat::Png);
    assert_eq!(
        out.frame_path(FrameIndex(12)),
        PathBuf::from("tmp/run0_01_01_c0001/01_01_c0001.mp4/Image0012.png")
    );

    let mix = g.find(|n| *n == GraphNode::AlphaOver).unwrap();
    let inputs = g.inputs_of(mix);
    assert_eq!(inputs.len(), 2);
    assert_eq!(g.node(inputs[0].from), Some(&GraphNode::BackgroundImage));
    assert_eq!(g.node(inputs[1].from), Some(&GraphNode::RenderLayers));
}

#[test]
fn every_channel_gets_an_output_and_format() {
    let set = RenderChannelSet::new(all_on());
    let g = build_render_graph(&set, &paths(), Some(0.4)).unwrap();
    assert_eq!(g.outputs.len(), RenderChannel::ALL.len());

    for (channel, format) in [
        (RenderChannel::Depth, ChannelFormat::Exr),
        (RenderChannel::Normal, ChannelFormat::Exr),
        (RenderChannel::Flow, ChannelFormat::Exr),
        (RenderChannel::Segmentation, ChannelFormat::Exr),
        (RenderChannel::Foreground, ChannelFormat::Png),
        (RenderChannel::MotionBlur, ChannelFormat::Png),
    ] {
        let out = g.output(channel).unwrap();
        assert_eq!(out.format, format, "{channel:?}");
        assert_eq!(
            out.dir,
            PathBuf::from(format!("tmp/run0_01_01_c0001/00007_{}", channel.key()))
        );
        assert!(
            g.find(|n| *n == GraphNode::FileOutput { channel }).is_some(),
            "{channel:?} has no file output node"
        );
    }

    let blur = g.find(|n| matches!(n, GraphNode::VectorBlur { .. })).unwrap();
    assert_eq!(g.node(blur), Some(&GraphNode::VectorBlur { factor: 0.4 }));
    let sockets: Vec<Socket> = g.inputs_of(blur).iter().map(|l| l.socket).collect();
    assert_eq!(sockets, vec![Socket::Image, Socket::Depth, Socket::Speed]);
}

#[test]
fn blur_factor_must_match_channel() {
    let set = RenderChannelSet::new(all_on());
    assert!(build_render_graph(&set, &paths(), None).is_err());
    assert!(build_render_graph(&RenderChannelSet::default(), &paths(), Some(0.5)).is_err());
}

#[test]
fn enabled_lists_composite_first() {
    let set = RenderChannelSet::new(OutputTypes {
        segmentation: true,
        ..OutputTypes::default()
    });
    let enabled: Vec<_> = set.enabled().collect();
    assert_eq!(
        enabled,
        vec![RenderChannel::Composite, RenderChannel::Segmentation]
    );
}

#[test]
fn segmentation_labels_follow_canonical_order() {
    let labels = segmentation_labels();
    let mut seen = std::collections::HashSet::new();
    for (i, (part, label)) in labels.iter().enumerate() {
        assert_eq!(*part, BodyPart::ALL[i]);
        assert_eq!(usize::from(*label), i + 1);
        assert!(seen.insert(*label));
    }
    assert_eq!(labels[0], (BodyPart::Hips, 1));
    assert_eq!(labels[23], (BodyPart::RightHandIndex1, 24));
    // Alphabetical ordering would put "head" first.
    assert_eq!(labels[15].0, BodyPart::Head);
}

#[test]
fn frame_pattern_matches_frame_paths() {
    let out = ChannelOutput {
        dir: PathBuf::from("x"),
        format: ChannelFormat::Exr,
    };
    assert_eq!(out.frame_pattern(), PathBuf::from("x/Image%04d.exr"));
    assert_eq!(out.frame_path(FrameIndex(3)), PathBuf::from("x/Image0003.exr"));
}
