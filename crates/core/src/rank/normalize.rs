use serde::Deserialize;

/// One entry of a ranking reply, before validation against the segment list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedEntry {
    pub index: i64,
    pub score: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RankedReply {
    Wrapped { results: Vec<RankedEntry> },
    Bare(Vec<RankedEntry>),
}

/// Strip a surrounding markdown code fence (with or without a `json` tag).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a ranking reply, either `{"results": [...]}` or a bare array.
pub fn parse_ranked_entries(raw: &str) -> Result<Vec<RankedEntry>, serde_json::Error> {
    let reply: RankedReply = serde_json::from_str(strip_code_fences(raw))?;
    Ok(match reply {
        RankedReply::Wrapped { results } => results,
        RankedReply::Bare(entries) => entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"{"results": [{"index": 1, "score": 9, "reason": "exact topic"}, {"index": 0, "score": 4}]}"#;

    #[test]
    fn strip_json_code_fence() {
        let input = format!("```json\n{PLAIN}\n```");
        assert_eq!(strip_code_fences(&input), PLAIN);
    }

    #[test]
    fn strip_plain_code_fence() {
        let input = format!("  ```\n{PLAIN}\n```  \n");
        assert_eq!(strip_code_fences(&input), PLAIN);
    }

    #[test]
    fn unfenced_input_passes_through_trimmed() {
        assert_eq!(strip_code_fences(&format!("\n{PLAIN} ")), PLAIN);
    }

    #[test]
    fn fenced_and_plain_replies_parse_identically() {
        let fenced = format!("```json\n{PLAIN}\n```");
        assert_eq!(
            parse_ranked_entries(&fenced).unwrap(),
            parse_ranked_entries(PLAIN).unwrap()
        );
    }

    #[test]
    fn parses_wrapped_and_bare_shapes() {
        let entries = parse_ranked_entries(PLAIN).unwrap();
        assert_eq!(
            entries,
            vec![
                RankedEntry {
                    index: 1,
                    score: 9.0,
                    reason: Some("exact topic".into())
                },
                RankedEntry {
                    index: 0,
                    score: 4.0,
                    reason: None
                },
            ]
        );

        let bare = parse_ranked_entries(r#"[{"index": 3, "score": 7.5, "reason": "close"}]"#).unwrap();
        assert_eq!(bare[0].index, 3);
        assert_eq!(bare[0].score, 7.5);
    }

    #[test]
    fn malformed_reply_is_an_error() {
        assert!(parse_ranked_entries("Sure! Here are the results:").is_err());
        assert!(parse_ranked_entries(r#"{"results": [{"index": "one"}]}"#).is_err());
        assert!(parse_ranked_entries("```json\n```").is_err());
    }
}
