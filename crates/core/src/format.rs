use crate::types::{SearchOutcome, Segment};

/// Format whole seconds as `m:ss`. Minutes are not wrapped into hours.
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Numbered segment listing used as ranking context
pub fn format_manifest(segments: &[Segment]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| format!("[{}] ({}) {}\n\n", i, format_time(seg.start), seg.text))
        .collect()
}

/// Format segments one per line with timestamps
pub fn format_segments_with_timestamps(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|seg| format!("[{}] {}", format_time(seg.start), seg.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_hits_readable(outcome: &SearchOutcome) -> String {
    let hits = match outcome {
        SearchOutcome::NoMatches => return "No matches found\n".to_string(),
        SearchOutcome::Matches(hits) => hits,
    };

    let mut output = String::new();
    for (rank, hit) in hits.iter().enumerate() {
        output.push_str(&format!(
            "{}. [{}] score {}\n",
            rank + 1,
            hit.time,
            format_score(hit.result.score)
        ));
        output.push_str(&format!("   {}\n", hit.result.text));
        if let Some(reason) = hit.result.reason.as_deref().filter(|r| !r.is_empty()) {
            output.push_str(&format!("   → {}\n", reason));
        }
        output.push_str(&format!("   {}\n\n", hit.url));
    }

    output
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}
