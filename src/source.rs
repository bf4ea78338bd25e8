// src/source.rs - Landmark producers: recorded files and a scripted simulation
use crate::error::SourceError;
use crate::landmarks::{FrameRecord, Hand, Handedness, LandmarkFrame, LANDMARK_COUNT};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Anything that yields one `LandmarkFrame` per camera frame.
/// `Ok(None)` means the stream has ended.
pub trait LandmarkSource: Send {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, SourceError>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, SourceError> {
        (**self).next_frame()
    }
}

// ── Recorded source ────────────────────────────────────────

/// Reads JSON lines, one `FrameRecord` per line. Blank lines are ignored and
/// malformed lines are logged and skipped.
pub struct RecordedSource<R> {
    reader: R,
    line: usize,
    width: u32,
    height: u32,
    buf: String,
}

impl RecordedSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), width, height))
    }
}

impl<R: BufRead> RecordedSource<R> {
    pub fn new(reader: R, width: u32, height: u32) -> Self {
        Self {
            reader,
            line: 0,
            width,
            height,
            buf: String::new(),
        }
    }
}

pub fn parse_line(
    line: &str,
    line_no: usize,
    width: u32,
    height: u32,
) -> Result<LandmarkFrame, SourceError> {
    let record: FrameRecord = serde_json::from_str(line).map_err(|source| SourceError::Decode {
        line: line_no,
        source,
    })?;
    Ok(record.into_frame(width, height))
}

impl<R: BufRead + Send> LandmarkSource for RecordedSource<R> {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(line, self.line, self.width, self.height) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => warn!("Skipping frame: {}", e),
            }
        }
    }
}

// ── Scripted simulation ────────────────────────────────────

/// Build a plausible 21-point hand (pixel space) whose finger geometry reads
/// as `bits` (thumb → pinky), offset by `(dx, dy)`.
pub fn synthesize_hand(bits: [u8; 5], handedness: Handedness, dx: f64, dy: f64) -> Hand {
    let mut points = vec![(320.0, 400.0); LANDMARK_COUNT];

    // Thumb: base at x=300; extended tip sits outboard for the given side.
    let (out, tucked) = match handedness {
        Handedness::Right => (250.0, 340.0),
        Handedness::Left => (350.0, 260.0),
    };
    let thumb_tip = if bits[0] != 0 { out } else { tucked };
    points[1] = (300.0, 380.0);
    points[2] = (300.0, 360.0);
    points[3] = ((300.0 + thumb_tip) / 2.0, 350.0);
    points[4] = (thumb_tip, 340.0);

    // Other digits: base at y=300, raised fingers stack upward.
    for (digit, bit) in bits.iter().enumerate().skip(1) {
        let first = 1 + digit * 4;
        let x = 280.0 + digit as f64 * 20.0;
        let joints = if *bit != 0 {
            [300.0, 250.0, 220.0, 190.0]
        } else {
            [300.0, 330.0, 350.0, 340.0]
        };
        for (offset, y) in joints.iter().enumerate() {
            points[first + offset] = (x, *y);
        }
    }

    for p in &mut points {
        p.0 += dx;
        p.1 += dy;
    }

    Hand::from_xy(&points, Some(handedness))
}

#[derive(Debug, Clone)]
pub struct ScriptStep {
    /// Finger pattern to show, or `None` for an empty frame.
    pub bits: Option<[u8; 5]>,
    pub handedness: Handedness,
    pub frames: usize,
}

impl ScriptStep {
    pub fn hand(bits: [u8; 5], frames: usize) -> Self {
        Self {
            bits: Some(bits),
            handedness: Handedness::Right,
            frames,
        }
    }

    pub fn empty(frames: usize) -> Self {
        Self {
            bits: None,
            handedness: Handedness::Right,
            frames,
        }
    }

    pub fn left(mut self) -> Self {
        self.handedness = Handedness::Left;
        self
    }
}

/// Plays a fixed script of hand poses, with a small drift so frames are not
/// bit-identical.
pub struct ScriptedSource {
    steps: Vec<ScriptStep>,
    step: usize,
    frame_in_step: usize,
    repeat: bool,
    sim_time: f64,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>, repeat: bool) -> Self {
        Self {
            steps,
            step: 0,
            frame_in_step: 0,
            repeat,
            sim_time: 0.0,
        }
    }

    /// Walk through every media gesture with idle gaps between them.
    pub fn demo() -> Self {
        Self::new(
            vec![
                ScriptStep::empty(30),
                ScriptStep::hand([0, 1, 1, 0, 0], 45),
                ScriptStep::empty(30),
                ScriptStep::hand([1, 1, 0, 0, 0], 45),
                ScriptStep::hand([0, 0, 0, 0, 0], 30),
                ScriptStep::hand([0, 1, 1, 1, 1], 45),
                ScriptStep::hand([1, 0, 0, 0, 0], 45).left(),
                ScriptStep::hand([1, 0, 0, 0, 1], 45),
                ScriptStep::hand([1, 1, 1, 1, 1], 30),
                ScriptStep::hand([0, 1, 1, 0, 0], 45),
                ScriptStep::empty(30),
            ],
            true,
        )
    }
}

impl LandmarkSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, SourceError> {
        while self.step < self.steps.len() && self.frame_in_step >= self.steps[self.step].frames {
            self.step += 1;
            self.frame_in_step = 0;
        }
        if self.step >= self.steps.len() {
            if !self.repeat || self.steps.iter().all(|s| s.frames == 0) {
                return Ok(None);
            }
            self.step = 0;
            return self.next_frame();
        }

        let step = &self.steps[self.step];
        self.frame_in_step += 1;
        self.sim_time += 0.033;

        let t = self.sim_time;
        Ok(Some(match step.bits {
            Some(bits) => LandmarkFrame::single(synthesize_hand(
                bits,
                step.handedness,
                4.0 * t.sin(),
                3.0 * (t * 0.7).cos(),
            )),
            None => LandmarkFrame::empty(),
        }))
    }
}
