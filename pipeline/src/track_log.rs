//! Per-track history of reported positions, exported as JSON for offline analysis

use crate::error::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    x: i64,
    y: i64,
    frame: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TrackLog {
    samples: HashMap<u32, Vec<Sample>>,
    birth: HashMap<u32, u64>,
    num_frames: u64,
    width: u32,
    height: u32,
    /// Form used by `write_to`
    compress: bool,
}

impl TrackLog {
    pub fn new(compress: bool) -> Self {
        Self {
            compress,
            ..Default::default()
        }
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Record one reported position of `track_id`
    pub fn add_track(&mut self, track_id: u32, x: i64, y: i64, frame: u64) {
        self.samples
            .entry(track_id)
            .or_default()
            .push(Sample { x, y, frame });
        let birth = self.birth.entry(track_id).or_insert(frame);
        *birth = (*birth).min(frame);
        self.num_frames = self.num_frames.max(frame);
    }

    /// Highest frame number seen so far
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    pub fn track_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Trackers ordered by birth frame, ties broken by id
    fn birth_order(&self) -> Vec<(u32, u64)> {
        let mut order: Vec<(u32, u64)> = self.birth.iter().map(|(id, b)| (*id, *b)).collect();
        order.sort_by_key(|&(id, birth)| (birth, id));
        order
    }

    /// Build the JSON document. Compressed samples are `[x, y, frame]` arrays.
    pub fn to_json(&self, compress: bool) -> Value {
        let trackers: Vec<Value> = self
            .birth_order()
            .into_iter()
            .map(|(id, birth)| {
                let track: Vec<Value> = self
                    .samples
                    .get(&id)
                    .map(|samples| {
                        samples
                            .iter()
                            .map(|s| {
                                if compress {
                                    json!([s.x, s.y, s.frame])
                                } else {
                                    json!({ "x": s.x, "y": s.y, "frame": s.frame })
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                json!({ "birth": birth, "trackerId": id, "track": track })
            })
            .collect();

        json!({
            "numFrames": self.num_frames,
            "width": self.width,
            "height": self.height,
            "trackers": trackers,
        })
    }

    /// Write the log; the compact form is a single line, the expanded one is pretty printed
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        let document = self.to_json(self.compress);
        if self.compress {
            serde_json::to_writer(&mut writer, &document)?;
        } else {
            serde_json::to_writer_pretty(&mut writer, &document)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        log::info!(
            "Wrote {} tracks over {} frames to {}",
            self.track_count(),
            self.num_frames,
            path.display()
        );
        Ok(())
    }
}
