//! Silence trimming.
//!
//! Stimulus annotations only cover spans where audio was actually playing.
//! A run of consecutive events sharing one `sound_id` corresponds to one
//! audio file; the gaps between runs are inter-stimulus silence and carry no
//! alignable signal. This module finds those runs and concatenates the
//! sound-covered slices of the recording, dropping the gaps.
//!
//! Cut positions are whole milliseconds: a span boundary at `t` seconds
//! becomes sample `trunc(t * 1000)`. That equals a sample index only at the
//! corpus's 1 kHz acquisition rate; recordings at other rates inherit the
//! same arithmetic.
use anyhow::{bail, Result};
use ndarray::{concatenate, Array2, Axis};

use crate::annot::Annotation;

/// A contiguous span of stimulus audio, in seconds since recording start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

/// Group annotations into runs of constant `sound_id` and return one
/// [`Segment`] per run, spanning the run's first onset through its last
/// offset (onset + duration). Events must be in onset order.
pub fn sound_segments(events: &[Annotation]) -> Result<Vec<Segment>> {
    if events.is_empty() {
        bail!("cannot locate sound segments: no annotation events");
    }
    let mut segments = Vec::new();
    let mut run_start = 0;
    for t in 1..=events.len() {
        if t == events.len() || events[t].sound_id != events[run_start].sound_id {
            let first = &events[run_start];
            let last = &events[t - 1];
            segments.push(Segment {
                start: first.onset,
                end: last.onset + last.duration,
            });
            run_start = t;
        }
    }
    Ok(segments)
}

/// Cut the silent gaps out of `data` (channels x samples), keeping only the
/// spans listed in `segments`, in order.
///
/// Boundaries are converted to sample indices as whole milliseconds
/// (`trunc(sec * 1000)`, see the module docs). A segment end past the
/// recording is clamped to the last sample with a warning, matching how the
/// source recordings behave when the final stimulus outruns the acquisition
/// stop.
pub fn keep_segments(data: &Array2<f32>, segments: &[Segment]) -> Result<Array2<f32>> {
    let n_times = data.ncols();
    let mut pieces = Vec::with_capacity(segments.len());
    for seg in segments {
        if seg.end < seg.start {
            bail!(
                "segment ends before it starts: {:.3}s .. {:.3}s",
                seg.start,
                seg.end
            );
        }
        let start = (seg.start.max(0.0) * 1000.0) as usize;
        let mut end = (seg.end.max(0.0) * 1000.0) as usize;
        if end > n_times {
            log::warn!(
                "segment {:.3}s..{:.3}s runs past the recording ({} samples); clamping",
                seg.start,
                seg.end,
                n_times
            );
            end = n_times;
        }
        let start = start.min(end);
        pieces.push(data.slice(ndarray::s![.., start..end]));
    }
    if pieces.is_empty() {
        bail!("cannot trim: no segments to keep");
    }
    Ok(concatenate(Axis(1), &pieces)?)
}

/// Scan annotations and trim in one step. Returns the concatenated
/// sound-covered signal together with the real duration of every kept
/// segment in seconds, in segment order.
pub fn trim_silent_spans(
    data: &Array2<f32>,
    events: &[Annotation],
) -> Result<(Array2<f32>, Vec<f64>)> {
    let segments = sound_segments(events)?;
    let durations = segments.iter().map(|s| s.end - s.start).collect();
    let trimmed = keep_segments(data, &segments)?;
    Ok((trimmed, durations))
}
