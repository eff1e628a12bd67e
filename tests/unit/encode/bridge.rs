use super::*;
use crate::animation::clock::StopToken;
use crate::encode::sink::InMemorySink;

struct Solid {
    canvas: Canvas,
    rendered: Vec<ChannelIndex>,
    fail_on: Option<ChannelIndex>,
}

impl Solid {
    fn new() -> Self {
        Self {
            canvas: Canvas {
                width: 4,
                height: 2,
            },
            rendered: Vec::new(),
            fail_on: None,
        }
    }
}

impl FrameSource for Solid {
    fn canvas(&self) -> CubeMovieResult<Canvas> {
        Ok(self.canvas)
    }

    fn render_frame(&mut self, channel: ChannelIndex) -> CubeMovieResult<FrameRGBA> {
        if self.fail_on == Some(channel) {
            return Err(CubeMovieError::render("backend failed"));
        }
        self.rendered.push(channel);
        let mut frame = FrameRGBA::blank(self.canvas);
        frame.data[0] = channel.0 as u8;
        Ok(frame)
    }
}

fn request(encoder: &str, codec: &str) -> EncodeRequest {
    EncodeRequest {
        encoder: encoder.to_string(),
        codec: codec.to_string(),
        ..EncodeRequest::from_config(&RenderConfig::default())
    }
}

fn channels(ids: &[usize]) -> Vec<ChannelIndex> {
    ids.iter().copied().map(ChannelIndex).collect()
}

#[test]
fn unsupported_names_fail_fast() {
    let err = EncoderBridge::new(request("imagemagick", "h264")).unwrap_err();
    assert_eq!(
        err.as_encoding().map(|f| f.kind),
        Some(EncodingErrorKind::UnsupportedEncoder)
    );
    let err = EncoderBridge::new(request("ffmpeg", "wmv")).unwrap_err();
    assert_eq!(
        err.as_encoding().map(|f| f.kind),
        Some(EncodingErrorKind::UnsupportedCodec)
    );
    assert_eq!(
        EncoderBridge::new(request("FFmpeg", "hevc")).unwrap().codec(),
        VideoCodec::Hevc
    );
}

#[test]
fn streams_each_frame_once_in_order_with_progress() {
    let bridge = EncoderBridge::new(request("ffmpeg", "h264")).unwrap();
    let mut driver = AnimationDriver::default();
    let mut source = Solid::new();
    let mut sink = InMemorySink::new();
    let mut ticks = Vec::new();

    let written = bridge
        .encode_with_sink(
            &mut driver,
            channels(&[0, 2, 4]),
            &mut source,
            &mut sink,
            &mut |p| ticks.push(p),
        )
        .unwrap();

    assert_eq!(written, 3);
    assert_eq!(source.rendered, channels(&[0, 2, 4]));
    assert_eq!(
        ticks,
        (1..=3)
            .map(|frame| EncodeProgress { frame, total: 3 })
            .collect::<Vec<_>>()
    );
    let positions: Vec<u64> = sink.frames().iter().map(|(p, _)| *p).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(sink.frames()[1].1.data[0], 2);
    assert!(sink.ended());
    assert_eq!(
        sink.config().map(|c| (c.width, c.height)),
        Some((4, 2))
    );
    assert_eq!(driver.state(), DriverState::Finished);
}

#[test]
fn loop_setting_is_ignored_for_encoding() {
    let bridge = EncoderBridge::new(request("ffmpeg", "h264")).unwrap();
    let mut driver = AnimationDriver::default();
    driver
        .arm(channels(&[1]), Fps::new(1, 1).unwrap(), true)
        .unwrap();
    let mut sink = InMemorySink::new();
    let written = bridge
        .encode_with_sink(
            &mut driver,
            channels(&[1, 0]),
            &mut Solid::new(),
            &mut sink,
            &mut |_| {},
        )
        .unwrap();
    assert_eq!(written, 2);
    assert_eq!(driver.state(), DriverState::Finished);
}

#[test]
fn render_failure_aborts_the_sink_and_finishes_the_driver() {
    let bridge = EncoderBridge::new(request("ffmpeg", "h264")).unwrap();
    let mut driver = AnimationDriver::default();
    let mut source = Solid::new();
    source.fail_on = Some(ChannelIndex(2));
    let mut sink = InMemorySink::new();
    let mut count = 0;

    let err = bridge
        .encode_with_sink(
            &mut driver,
            channels(&[0, 1, 2, 3]),
            &mut source,
            &mut sink,
            &mut |_| count += 1,
        )
        .unwrap_err();
    assert!(matches!(err, CubeMovieError::Render(_)));
    assert_eq!(count, 2);
    assert!(sink.aborted());
    assert!(!sink.ended());
    assert_eq!(driver.state(), DriverState::Finished);
}

#[test]
fn a_stop_request_cannot_cut_an_encode_short() {
    let bridge = EncoderBridge::new(request("ffmpeg", "h264")).unwrap();
    let token = StopToken::new();
    let mut driver = AnimationDriver::default().with_stop_token(token.clone());
    let mut sink = InMemorySink::new();
    let err = bridge
        .encode_with_sink(
            &mut driver,
            channels(&[0, 1, 2]),
            &mut Solid::new(),
            &mut sink,
            &mut |_| token.request_stop(),
        )
        .unwrap_err();
    assert_eq!(
        err.as_encoding().map(|f| f.kind),
        Some(EncodingErrorKind::Process)
    );
    assert!(sink.aborted());
}
