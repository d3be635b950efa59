use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::VideoSource;

/// Decodes frames via ffmpeg-next (libavformat + libavcodec).
///
/// Opens either a container file or, through libavdevice, a live capture
/// device. Each decoded frame is converted to RGB24 and wrapped in a
/// [`Frame`] whose index counts decoded frames from zero.
pub struct FfmpegSource {
    state: Option<DecodeState>,
    metadata: VideoMetadata,
}

struct DecodeState {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    next_index: usize,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegSource {}

impl FfmpegSource {
    /// Opens a video file.
    pub fn open_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let input = ffmpeg_next::format::input(path)?;
        Self::from_input(input, Some(path), true)
    }

    /// Opens a live capture device (e.g. `/dev/video0` with `video4linux2`,
    /// `0` with `avfoundation`).
    pub fn open_device(device: &str, format_name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == format_name)
            .ok_or_else(|| format!("Capture format not available: {format_name}"))?;

        let context = ffmpeg_next::format::open_with(
            &device,
            &ffmpeg_next::format::Format::Input(format),
            ffmpeg_next::Dictionary::new(),
        )?;
        let input = match context {
            ffmpeg_next::format::context::Context::Input(input) => input,
            ffmpeg_next::format::context::Context::Output(_) => {
                return Err(format!("Device opened as output: {device}").into())
            }
        };
        Self::from_input(input, None, false)
    }

    fn from_input(
        input: ffmpeg_next::format::context::Input,
        path: Option<&Path>,
        counted: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = if counted {
            stream.frames().max(0) as usize
        } else {
            0
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: path.map(Path::to_path_buf),
        };

        Ok(Self {
            state: Some(DecodeState {
                input,
                decoder,
                scaler,
                stream_index,
                width,
                height,
                next_index: 0,
                flushing: false,
                done: false,
            }),
            metadata,
        })
    }
}

impl VideoSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        match self.state.as_mut() {
            Some(state) => state.next_frame(),
            None => Err("FfmpegSource: already released".into()),
        }
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Released video source {:?}", self.metadata.source_path);
        }
    }
}

impl DecodeState {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }
        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let Some((stream, packet)) = self.input.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                let frame = self.try_receive()?;
                self.done = frame.is_none();
                return Ok(frame);
            };

            if stream.index() != self.stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width*3); the padding is dropped.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
