// audio.rs — soundtrack playback: ffmpeg PCM decoding into a rodio sink
//
// A second ffmpeg process decodes the first audio stream to interleaved f32
// stereo. A reader thread fills a ring buffer that a rodio `Source` drains;
// the ring never blocks the audio callback and plays silence when empty.

use crate::error::MediaError;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 48_000;
pub const CHANNELS: u16 = 2;
const BUFFER_SECONDS: usize = 2;
const READ_CHUNK: usize = 16 * 1024;

/// Fixed-capacity FIFO of interleaved samples.
struct SampleRing {
    samples: Vec<f32>,
    read: usize,
    write: usize,
}

impl SampleRing {
    fn with_capacity(capacity: usize) -> Self {
        // One slot stays empty to tell full from empty.
        Self {
            samples: vec![0.0; capacity + 1],
            read: 0,
            write: 0,
        }
    }

    /// Appends as many samples as fit; returns how many were taken.
    fn push(&mut self, data: &[f32]) -> usize {
        let mut taken = 0;
        for &sample in data {
            let next = (self.write + 1) % self.samples.len();
            if next == self.read {
                break;
            }
            self.samples[self.write] = sample;
            self.write = next;
            taken += 1;
        }
        taken
    }

    fn pop(&mut self) -> Option<f32> {
        if self.read == self.write {
            return None;
        }
        let sample = self.samples[self.read];
        self.read = (self.read + 1) % self.samples.len();
        Some(sample)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        (self.write + self.samples.len() - self.read) % self.samples.len()
    }
}

struct RingSource {
    ring: Arc<Mutex<SampleRing>>,
    stop: Arc<AtomicBool>,
}

impl Iterator for RingSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.stop.load(Ordering::Relaxed) {
            return None;
        }
        // Underruns and a poisoned lock both play silence.
        Some(
            self.ring
                .lock()
                .ok()
                .and_then(|mut ring| ring.pop())
                .unwrap_or(0.0),
        )
    }
}

impl Source for RingSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

enum OutputState {
    Unopened,
    Open {
        // Dropping the stream closes the device.
        _stream: OutputStream,
        handle: OutputStreamHandle,
    },
    Unavailable,
}

/// The default output device, opened on first use.
pub struct AudioOutput {
    state: OutputState,
}

impl AudioOutput {
    pub fn new() -> Self {
        Self {
            state: OutputState::Unopened,
        }
    }

    /// `None` when no device could be opened; the failure is logged once.
    pub fn handle(&mut self) -> Option<&OutputStreamHandle> {
        if let OutputState::Unopened = self.state {
            self.state = match OutputStream::try_default() {
                Ok((stream, handle)) => OutputState::Open {
                    _stream: stream,
                    handle,
                },
                Err(err) => {
                    log::warn!("no audio output ({err}); video plays silently");
                    OutputState::Unavailable
                }
            };
        }
        match &self.state {
            OutputState::Open { handle, .. } => Some(handle),
            _ => None,
        }
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Playing soundtrack of one decode run. Dropping it silences the sink and
/// ends the process.
pub struct AudioTrack {
    child: Child,
    sink: Sink,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl AudioTrack {
    pub fn spawn(
        url: &str,
        start: f64,
        looping: bool,
        output: &OutputStreamHandle,
        gain: f32,
    ) -> Result<Self, MediaError> {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-nostdin", "-loglevel", "quiet"]);
        if looping {
            cmd.args(["-stream_loop", "-1"]);
        }
        cmd.arg("-ss").arg(format!("{start:.3}"));
        cmd.arg("-i").arg(url);
        cmd.args(["-map", "0:a:0", "-vn", "-f", "f32le"]);
        cmd.arg("-ac").arg(CHANNELS.to_string());
        cmd.arg("-ar").arg(SAMPLE_RATE.to_string());
        cmd.arg("pipe:1");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|source| MediaError::Spawn {
            program: "ffmpeg",
            source,
        })?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MediaError::Decode("audio pipe unavailable".into()));
        };

        let sink = match Sink::try_new(output) {
            Ok(sink) => sink,
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MediaError::Decode(err.to_string()));
            }
        };
        sink.set_volume(gain);

        let ring = Arc::new(Mutex::new(SampleRing::with_capacity(
            SAMPLE_RATE as usize * CHANNELS as usize * BUFFER_SECONDS,
        )));
        let stop = Arc::new(AtomicBool::new(false));
        sink.append(RingSource {
            ring: ring.clone(),
            stop: stop.clone(),
        });

        let mut track = Self {
            child,
            sink,
            stop: stop.clone(),
            reader: None,
        };
        let reader = thread::Builder::new()
            .name("ffmpeg-audio".into())
            .spawn(move || read_samples(stdout, ring, stop))
            .map_err(|e| MediaError::Decode(e.to_string()))?;
        track.reader = Some(reader);
        Ok(track)
    }

    pub fn set_gain(&self, gain: f32) {
        self.sink.set_volume(gain);
    }
}

impl Drop for AudioTrack {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.sink.stop();
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

fn read_samples(mut stdout: ChildStdout, ring: Arc<Mutex<SampleRing>>, stop: Arc<AtomicBool>) {
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut pending: Vec<u8> = Vec::new();

    while !stop.load(Ordering::SeqCst) {
        let n = match stdout.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        pending.extend_from_slice(&chunk[..n]);
        let whole = pending.len() / 4 * 4;
        let samples: Vec<f32> = pending[..whole]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        pending.drain(..whole);

        let mut offset = 0;
        while offset < samples.len() {
            if stop.load(Ordering::SeqCst) {
                return;
            }
            let taken = match ring.lock() {
                Ok(mut ring) => ring.push(&samples[offset..]),
                Err(_) => return,
            };
            offset += taken;
            if taken == 0 {
                // Full: wait for the sink to catch up.
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}
