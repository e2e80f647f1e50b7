// ffmpeg.rs — media element backed by the ffmpeg/ffprobe command line tools
//
// Probing and decoding run on background threads; everything they produce
// arrives over channels that the main thread drains in `poll_events`.

use super::audio::{AudioOutput, AudioTrack};
use super::{MediaElement, MediaEvent, MediaOptions, VideoFrame};
use crate::error::MediaError;

use image::RgbaImage;
use serde::Deserialize;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Decoded frames wider than this are scaled down by ffmpeg.
pub const MAX_DECODE_WIDTH: u32 = 4096;
/// Media-time spacing of `TimeUpdate` events (~4 Hz, like browsers).
const TIME_UPDATE_INTERVAL: f64 = 0.25;
/// Frames buffered between the reader thread and the main thread.
const FRAME_QUEUE_DEPTH: usize = 2;
const DEFAULT_FRAME_RATE: f64 = 30.0;
/// Decoder stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub duration: f64,
    pub has_audio: bool,
}

impl StreamInfo {
    /// Output size for the decoder: capped width, even dimensions.
    pub fn decode_size(&self) -> (u32, u32) {
        let (w, h) = if self.width > MAX_DECODE_WIDTH {
            let scale = MAX_DECODE_WIDTH as f64 / self.width as f64;
            (MAX_DECODE_WIDTH, (self.height as f64 * scale).round() as u32)
        } else {
            (self.width, self.height)
        };
        ((w & !1).max(2), (h & !1).max(2))
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_rate(text: &str) -> Option<f64> {
    let rate = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => text.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Parses `ffprobe -of json` output: the first video stream, plus whether
/// any audio stream exists.
pub fn parse_probe(json: &str) -> Result<StreamInfo, MediaError> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| MediaError::Probe(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| {
            s.codec_type.as_deref().map_or(true, |t| t == "video")
                && s.width.is_some()
                && s.height.is_some()
        })
        .ok_or(MediaError::NoVideoStream)?;
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(MediaError::NoVideoStream),
    };

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .unwrap_or(DEFAULT_FRAME_RATE);

    // Live streams report no duration; treat it as zero-length for seeking.
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(stream.duration.as_deref())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(StreamInfo {
        width,
        height,
        frame_rate,
        duration,
        has_audio,
    })
}

fn probe(url: &str) -> Result<StreamInfo, MediaError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,width,height,avg_frame_rate,r_frame_rate,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(url)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| MediaError::Spawn {
            program: "ffprobe",
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::Probe(stderr.trim().to_string()));
    }
    parse_probe(&String::from_utf8_lossy(&output.stdout))
}

/// Wraps a media timestamp into `[0, duration)` for looping sources.
fn wrap_time(time: f64, duration: f64, looping: bool) -> f64 {
    if looping && duration > 0.0 {
        time.rem_euclid(duration)
    } else if duration > 0.0 {
        time.min(duration)
    } else {
        time
    }
}

#[derive(Debug)]
enum DecoderMessage {
    Frame(VideoFrame),
    Ended,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DecodeJob {
    start: f64,
    width: u32,
    height: u32,
    frame_rate: f64,
    duration: f64,
    looping: bool,
    has_audio: bool,
    /// Poster decode: one frame, unpaced, silent.
    single_frame: bool,
}

/// A running decode: frames arrive on `frames` until it is dropped.
struct Decoder {
    child: Option<Child>,
    frames: Option<Receiver<DecoderMessage>>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    audio: Option<AudioTrack>,
    single_frame: bool,
}

impl Decoder {
    fn from_channel(frames: Receiver<DecoderMessage>, single_frame: bool) -> Self {
        Self {
            child: None,
            frames: Some(frames),
            stop: Arc::new(AtomicBool::new(false)),
            reader: None,
            audio: None,
            single_frame,
        }
    }

    fn spawn(url: &str, job: DecodeJob) -> Result<Self, MediaError> {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-nostdin", "-loglevel", "error"]);
        if job.looping && !job.single_frame {
            cmd.args(["-stream_loop", "-1"]);
        }
        cmd.arg("-ss").arg(format!("{:.3}", job.start));
        cmd.arg("-i").arg(url);
        cmd.args(["-map", "0:v:0", "-an", "-f", "rawvideo", "-pix_fmt", "rgba"]);
        cmd.arg("-s").arg(format!("{}x{}", job.width, job.height));
        if job.single_frame {
            cmd.args(["-frames:v", "1"]);
        }
        cmd.arg("pipe:1");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| MediaError::Spawn {
            program: "ffmpeg",
            source,
        })?;
        let (stdout, stderr) = (child.stdout.take(), child.stderr.take());

        let (tx, rx) = mpsc::sync_channel(FRAME_QUEUE_DEPTH);
        let mut decoder = Self::from_channel(rx, job.single_frame);
        // From here on, dropping `decoder` kills the process.
        decoder.child = Some(child);
        let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
            return Err(MediaError::Decode("decoder pipes unavailable".into()));
        };

        // Drained continuously so a chatty decoder never blocks on a full pipe.
        let stderr_tail = thread::Builder::new()
            .name("ffmpeg-stderr".into())
            .spawn(move || drain_stderr(stderr))
            .map_err(|e| MediaError::Decode(e.to_string()))?;

        let stop = decoder.stop.clone();
        let reader = thread::Builder::new()
            .name("ffmpeg-frames".into())
            .spawn(move || read_frames(stdout, Some(stderr_tail), tx, stop, job))
            .map_err(|e| MediaError::Decode(e.to_string()))?;
        decoder.reader = Some(reader);

        log::debug!(
            "decoder started at {:.3}s ({}x{} @ {:.2} fps{})",
            job.start,
            job.width,
            job.height,
            job.frame_rate,
            if job.single_frame { ", poster" } else { "" }
        );
        Ok(decoder)
    }

    fn set_gain(&self, gain: f32) {
        if let Some(audio) = &self.audio {
            audio.set_gain(gain);
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.audio = None;
        // Unblocks a reader waiting on a full queue.
        self.frames.take();
        if let Some(child) = &mut self.child {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Reads decoder diagnostics until the pipe closes; returns the last lines.
fn drain_stderr<R: Read>(stderr: R) -> String {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    for line in BufReader::new(stderr).split(b'\n') {
        let Ok(line) = line else {
            break;
        };
        let line = String::from_utf8_lossy(&line).trim_end().to_string();
        if line.is_empty() {
            continue;
        }
        log::debug!("ffmpeg: {line}");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("\n")
}

fn read_frames<R: Read>(
    mut stdout: R,
    stderr_tail: Option<JoinHandle<String>>,
    tx: SyncSender<DecoderMessage>,
    stop: Arc<AtomicBool>,
    job: DecodeJob,
) {
    let frame_len = job.width as usize * job.height as usize * 4;
    let frame_interval = 1.0 / job.frame_rate;
    let started = Instant::now();
    let mut index: u64 = 0;

    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }

        let mut buf = vec![0u8; frame_len];
        match stdout.read_exact(&mut buf) {
            Ok(()) => {}
            // Seeking at or past the last frame decodes nothing; only an
            // empty decode from the start means the stream is unreadable.
            Err(err)
                if err.kind() == ErrorKind::UnexpectedEof && (index > 0 || job.start > 0.0) =>
            {
                let _ = tx.send(DecoderMessage::Ended);
                return;
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                let text = stderr_tail
                    .and_then(|tail| tail.join().ok())
                    .unwrap_or_default();
                let _ = tx.send(DecoderMessage::Failed(if text.is_empty() {
                    "decoder produced no frames".to_string()
                } else {
                    text
                }));
                return;
            }
            Err(err) => {
                if !stop.load(Ordering::SeqCst) {
                    let _ = tx.send(DecoderMessage::Failed(err.to_string()));
                }
                return;
            }
        }

        let offset = index as f64 * frame_interval;
        if !job.single_frame {
            let due = started + Duration::from_secs_f64(offset);
            if let Some(wait) = due.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
        }

        let Some(image) = RgbaImage::from_raw(job.width, job.height, buf) else {
            let _ = tx.send(DecoderMessage::Failed("frame size mismatch".into()));
            return;
        };
        let frame = VideoFrame {
            image,
            timestamp: wrap_time(job.start + offset, job.duration, job.looping),
        };
        if tx.send(DecoderMessage::Frame(frame)).is_err() {
            return;
        }
        index += 1;
    }
}

/// Starts decode runs for an element.
trait Launcher {
    fn launch(&mut self, url: &str, job: DecodeJob, gain: f32) -> Result<Decoder, MediaError>;
}

/// Spawns ffmpeg for the picture and, while playing, for the soundtrack.
struct ProcessLauncher {
    audio: AudioOutput,
}

impl Launcher for ProcessLauncher {
    fn launch(&mut self, url: &str, job: DecodeJob, gain: f32) -> Result<Decoder, MediaError> {
        let mut decoder = Decoder::spawn(url, job)?;
        if job.has_audio && !job.single_frame {
            if let Some(output) = self.audio.handle() {
                match AudioTrack::spawn(url, job.start, job.looping, output, gain) {
                    Ok(track) => decoder.audio = Some(track),
                    Err(err) => log::warn!("playing {url} without sound: {err}"),
                }
            }
        }
        Ok(decoder)
    }
}

/// Native stand-in for an HTML video element.
pub struct FfmpegElement {
    url: String,
    options: MediaOptions,
    info: Option<StreamInfo>,
    probe_rx: Option<Receiver<Result<StreamInfo, MediaError>>>,
    decoder: Option<Decoder>,
    paused: bool,
    play_pending: bool,
    position: f64,
    reported_position: Option<f64>,
    volume: f32,
    muted: bool,
    latest_frame: Option<VideoFrame>,
    events: Vec<MediaEvent>,
    failure: Option<String>,
    launcher: Box<dyn Launcher>,
}

impl FfmpegElement {
    /// Starts probing `url` in the background and returns immediately.
    pub fn open(url: &str, options: &MediaOptions) -> Result<Self, MediaError> {
        let (tx, rx) = mpsc::channel();
        let probe_url = url.to_string();
        thread::Builder::new()
            .name("ffprobe".into())
            .spawn(move || {
                let _ = tx.send(probe(&probe_url));
            })
            .map_err(|source| MediaError::Spawn {
                program: "ffprobe",
                source,
            })?;

        log::info!("loading video {url}");
        Ok(Self::with_launcher(
            url,
            options,
            rx,
            Box::new(ProcessLauncher {
                audio: AudioOutput::new(),
            }),
        ))
    }

    fn with_launcher(
        url: &str,
        options: &MediaOptions,
        probe_rx: Receiver<Result<StreamInfo, MediaError>>,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        Self {
            url: url.to_string(),
            options: *options,
            info: None,
            probe_rx: Some(probe_rx),
            decoder: None,
            paused: true,
            play_pending: false,
            position: 0.0,
            reported_position: None,
            volume: 1.0,
            muted: options.muted,
            latest_frame: None,
            events: Vec::new(),
            failure: None,
            launcher,
        }
    }

    /// Sink volume: muted plays silence but keeps the level.
    fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    fn fail(&mut self, message: String) {
        log::error!("video {} failed: {message}", self.url);
        self.decoder = None;
        self.probe_rx = None;
        self.play_pending = false;
        if !self.paused {
            self.paused = true;
            self.events.push(MediaEvent::PlayPaused);
        }
        self.events.push(MediaEvent::Failed(message.clone()));
        self.failure = Some(message);
    }

    fn start_decoder(&mut self, single_frame: bool) {
        let Some(info) = self.info else {
            return;
        };
        self.decoder = None;

        let (width, height) = info.decode_size();
        let job = DecodeJob {
            start: self.position,
            width,
            height,
            frame_rate: info.frame_rate,
            duration: info.duration,
            looping: self.options.looping,
            has_audio: info.has_audio,
            single_frame,
        };
        let gain = self.gain();
        match self.launcher.launch(&self.url, job, gain) {
            Ok(decoder) => self.decoder = Some(decoder),
            Err(err) => self.fail(err.to_string()),
        }
    }

    fn poll_probe(&mut self) {
        let Some(rx) = &self.probe_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(MediaError::Probe("probe thread exited".into())),
        };
        self.probe_rx = None;

        match result {
            Ok(info) => {
                log::info!(
                    "video ready: {}x{} @ {:.2} fps, {:.1}s",
                    info.width,
                    info.height,
                    info.frame_rate,
                    info.duration
                );
                self.info = Some(info);
                self.events.push(MediaEvent::MetadataReady {
                    duration: info.duration,
                });
                if self.play_pending {
                    self.play_pending = false;
                    self.start_decoder(false);
                } else {
                    self.start_decoder(true);
                }
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    fn poll_decoder(&mut self) {
        let mut ended = false;
        let mut failed = None;
        if let Some(rx) = self.decoder.as_ref().and_then(|d| d.frames.as_ref()) {
            loop {
                match rx.try_recv() {
                    Ok(DecoderMessage::Frame(frame)) => {
                        self.position = frame.timestamp;
                        self.latest_frame = Some(frame);
                    }
                    Ok(DecoderMessage::Ended) => {
                        ended = true;
                        break;
                    }
                    Ok(DecoderMessage::Failed(message)) => {
                        failed = Some(message);
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        ended = true;
                        break;
                    }
                }
            }
        }

        if let Some(message) = failed {
            self.fail(message);
            return;
        }
        if ended {
            let was_poster = self.decoder.as_ref().map_or(true, |d| d.single_frame);
            self.decoder = None;
            if was_poster || self.paused {
                return;
            }
            if self.options.looping {
                // Non-seekable inputs ignore -stream_loop; restart by hand.
                self.position = 0.0;
                self.start_decoder(false);
            } else {
                self.paused = true;
                self.events.push(MediaEvent::PlayPaused);
            }
        }
    }

    fn emit_time_update(&mut self) {
        let due = match self.reported_position {
            None => true,
            Some(last) => {
                (self.position - last).abs() >= TIME_UPDATE_INTERVAL || self.position < last
            }
        };
        if due {
            self.reported_position = Some(self.position);
            self.events.push(MediaEvent::TimeUpdate {
                position: self.position,
            });
        }
    }
}

impl MediaElement for FfmpegElement {
    fn play(&mut self) -> Result<(), MediaError> {
        if let Some(message) = &self.failure {
            return Err(MediaError::Failed(message.clone()));
        }
        if !self.paused {
            return Ok(());
        }
        self.paused = false;
        self.events.push(MediaEvent::PlayStarted);
        if self.info.is_some() {
            self.start_decoder(false);
        } else {
            self.play_pending = true;
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.play_pending = false;
        self.decoder = None;
        self.events.push(MediaEvent::PlayPaused);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, time: f64) {
        if self.failure.is_some() {
            return;
        }
        let duration = self.info.map_or(0.0, |i| i.duration);
        // The end of a looping source is its start.
        self.position = wrap_time(time.max(0.0), duration, self.options.looping);
        self.reported_position = Some(self.position);
        self.events.push(MediaEvent::TimeUpdate {
            position: self.position,
        });
        if self.info.is_some() {
            self.start_decoder(self.paused);
        }
    }

    fn duration(&self) -> Option<f64> {
        self.info.map(|i| i.duration)
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(decoder) = &self.decoder {
            decoder.set_gain(self.gain());
        }
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(decoder) = &self.decoder {
            decoder.set_gain(self.gain());
        }
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.poll_probe();
        self.poll_decoder();
        if !self.paused && self.failure.is_none() {
            self.emit_time_update();
        }
        std::mem::take(&mut self.events)
    }

    fn take_frame(&mut self) -> Option<VideoFrame> {
        self.latest_frame.take()
    }

    fn stop(&mut self) {
        self.decoder = None;
        self.probe_rx = None;
        self.play_pending = false;
        self.paused = true;
        self.latest_frame = None;
    }
}

impl Drop for FfmpegElement {
    fn drop(&mut self) {
        self.stop();
    }
}
