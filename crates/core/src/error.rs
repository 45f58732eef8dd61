use thiserror::Error;

use crate::{provider::ProviderError, rank::Strategy};

#[derive(Error, Debug)]
pub enum TubeseekError {
    #[error("Invalid YouTube URL or video id: {reference}")]
    InvalidVideoReference { reference: String },

    #[error("Enter a search query")]
    EmptyQuery,

    #[error("Video {video_id} is not loaded, load it first")]
    VideoNotLoaded { video_id: String },

    #[error("Could not fetch transcript for {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Search failed: {reason}")]
    RankingFailed { reason: String },

    #[error("Ranking strategy {strategy} is not configured")]
    StrategyUnavailable { strategy: Strategy },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

/// Coarse classification of a failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    FetchFailure,
    RankingFailure,
    Internal,
}

impl TubeseekError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TubeseekError::InvalidVideoReference { .. }
            | TubeseekError::EmptyQuery
            | TubeseekError::VideoNotLoaded { .. } => ErrorKind::InvalidInput,
            TubeseekError::TranscriptUnavailable { .. } => ErrorKind::FetchFailure,
            TubeseekError::RankingFailed { .. }
            | TubeseekError::StrategyUnavailable { .. }
            | TubeseekError::Provider(_) => ErrorKind::RankingFailure,
            TubeseekError::IoError(_) | TubeseekError::JsonError(_) | TubeseekError::ApiError(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TubeseekError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_request_errors_as_invalid_input() {
        assert_eq!(TubeseekError::EmptyQuery.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            TubeseekError::VideoNotLoaded {
                video_id: "abc".into()
            }
            .kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn classifies_collaborator_failures() {
        let fetch = TubeseekError::TranscriptUnavailable {
            video_id: "dQw4w9WgXcQ".into(),
            reason: "no captions".into(),
        };
        assert_eq!(fetch.kind(), ErrorKind::FetchFailure);

        let ranking = TubeseekError::RankingFailed {
            reason: "bad json".into(),
        };
        assert_eq!(ranking.kind(), ErrorKind::RankingFailure);
        assert_eq!(ranking.to_string(), "Search failed: bad json");
    }
}
