use serde::{Deserialize, Serialize};

/// One timed unit of transcript text, eligible for independent translation
/// and per-segment caching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimedSegment {
    /// Segment start, in seconds from the start of the audio.
    pub start: f64,
    /// Segment end, in seconds.
    pub end: f64,
    pub text: String,
}

/// Output of the transcription capability: full text plus timed segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<TimedSegment>,
}

impl Transcript {
    /// Segments with non-blank text, in order. Blank segments carry no
    /// translatable content and are skipped when building subtitles.
    pub fn spoken_segments(&self) -> Vec<&TimedSegment> {
        self.segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect()
    }
}
