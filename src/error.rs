// src/error.rs
//! Failure taxonomy for the pipeline. None of these escape `pipeline::run`;
//! each stage turns them into its recovery behaviour and logs the cause.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsError {
    /// A feed could not be fetched; wraps the transport failure with the source name.
    #[error("source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Connection failure or timeout talking to a URL.
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// Non-success HTTP status from a feed or the enrichment service.
    #[error("http {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Feed body contained no item blocks.
    #[error("no item blocks in feed from {source_name}")]
    MalformedFeed { source_name: String },

    /// Enrichment call could not produce usable output for the batch.
    #[error("enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),

    /// Response body did not decode into the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for NewsError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        match e.status() {
            Some(status) => NewsError::HttpStatus {
                url,
                status: status.as_u16(),
            },
            None => NewsError::Network {
                url,
                reason: e.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_source() {
        let e = NewsError::MalformedFeed {
            source_name: "Hacker News".into(),
        };
        assert_eq!(e.to_string(), "no item blocks in feed from Hacker News");

        let e = NewsError::HttpStatus {
            url: "http://x/feed".into(),
            status: 500,
        };
        assert_eq!(e.to_string(), "http 500 from http://x/feed");

        let e = NewsError::SourceUnavailable {
            source_name: "BBC World".into(),
            reason: "timed out".into(),
        };
        assert_eq!(e.to_string(), "source BBC World unavailable: timed out");
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network_with_url() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/feed.xml")
            .send()
            .await
            .unwrap_err();
        match NewsError::from(err) {
            NewsError::Network { url, reason } => {
                assert_eq!(url, "http://127.0.0.1:9/feed.xml");
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
