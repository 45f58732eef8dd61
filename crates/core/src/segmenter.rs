use tracing::{debug, warn};

use crate::types::{Segment, TranscriptFragment};

/// Width of a segment in seconds.
pub const DEFAULT_BUCKET_WIDTH: u64 = 30;

/// Floor of the bucket a fragment starting at `start` belongs to.
/// Negative and non-finite starts land in bucket 0. Starts past the last
/// representable bucket land in that bucket.
pub fn bucket_start(start: f64, bucket_width: u64) -> u64 {
    let width = bucket_width.max(1);
    if !start.is_finite() || start <= 0.0 {
        return 0;
    }
    // float to int casts saturate
    let index = (start / width as f64).floor() as u64;
    index.min(u64::MAX / width) * width
}

struct Accumulator {
    start: u64,
    text: String,
    fragments: Vec<TranscriptFragment>,
}

impl Accumulator {
    fn empty(start: u64) -> Self {
        Self {
            start,
            text: String::new(),
            fragments: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn push(&mut self, fragment: &TranscriptFragment) {
        self.text.push(' ');
        self.text.push_str(&fragment.text);
        self.fragments.push(fragment.clone());
    }

    fn finish(self) -> Segment {
        Segment {
            start: self.start,
            text: self.text.trim().to_string(),
            source_fragments: self.fragments,
        }
    }
}

/// Group time-ordered fragments into fixed-width segments.
///
/// Fragments are never re-sorted. A new segment starts whenever a fragment's
/// bucket differs from the one being accumulated, so out-of-order input can
/// yield a bucket that goes backward; that case is logged, not corrected.
pub fn segment(fragments: &[TranscriptFragment], bucket_width: u64) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = Accumulator::empty(0);

    for fragment in fragments {
        let expected_start = bucket_start(fragment.start, bucket_width);

        if expected_start != current.start && !current.is_empty() {
            if expected_start < current.start {
                warn!(
                    previous = current.start,
                    next = expected_start,
                    "transcript fragments out of order, segment start goes backward"
                );
            }
            let done = std::mem::replace(&mut current, Accumulator::empty(expected_start));
            segments.push(done.finish());
        }

        current.start = expected_start;
        current.push(fragment);
    }

    if !current.is_empty() {
        segments.push(current.finish());
    }

    debug!(
        fragments = fragments.len(),
        segments = segments.len(),
        bucket_width,
        "transcript segmented"
    );

    segments
}
