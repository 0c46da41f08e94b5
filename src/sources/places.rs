//! Official place-details API source
//!
//! Fetches structured review objects from the key-gated place-details API.
//! This is the preferred source whenever a credential is configured: it is
//! cheap, structured, and not subject to anti-automation defenses.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use chrono::Utc;

use crate::data::{normalize_rating, Provenance, Review};

use super::{ReviewSource, SourceError};

/// Base URL for the place-details endpoint
const PLACE_DETAILS_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// Review source backed by the official place-details API
#[derive(Debug, Clone)]
pub struct PlacesApiSource {
    client: Client,
    api_key: String,
    place_id: String,
    base_url: String,
}

impl PlacesApiSource {
    /// Creates a source for the given credential and place
    pub fn new(client: Client, api_key: impl Into<String>, place_id: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            place_id: place_id.into(),
            base_url: PLACE_DETAILS_BASE_URL.to_string(),
        }
    }

    fn details_url(&self) -> String {
        format!(
            "{}?place_id={}&fields=reviews,rating&reviews_no_translations=true&key={}",
            self.base_url, self.place_id, self.api_key
        )
    }

    /// Maps the API payload into the shared review model
    fn parse_response(&self, response: DetailsResponse) -> Result<Vec<Review>, SourceError> {
        if response.status != "OK" {
            return Err(SourceError::Parse(format!(
                "place details status: {}",
                response.status
            )));
        }

        let api_reviews = response
            .result
            .and_then(|r| r.reviews)
            .unwrap_or_default();

        let now = Utc::now();
        let reviews = api_reviews
            .into_iter()
            .enumerate()
            .map(|(i, r)| Review {
                // `time` is the upstream posting epoch; fall back to the index
                id: r
                    .time
                    .map(|t| format!("api-{t}"))
                    .unwrap_or_else(|| format!("api-{}", i + 1)),
                author: r.author_name.unwrap_or_else(|| "Anonymous".to_string()),
                rating: normalize_rating(r.rating),
                text: r.text.unwrap_or_default(),
                date_label: r.relative_time_description.unwrap_or_default(),
                avatar_url: r.profile_photo_url,
                source: Provenance::PlacesApi,
                retrieved_at: now,
            })
            .collect();

        Ok(reviews)
    }
}

#[async_trait]
impl ReviewSource for PlacesApiSource {
    fn name(&self) -> &'static str {
        "places_api"
    }

    fn provenance(&self) -> Provenance {
        Provenance::PlacesApi
    }

    async fn fetch(&self) -> Result<Vec<Review>, SourceError> {
        let response = self.client.get(self.details_url()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Rejected(status.as_u16()));
        }

        let payload = response.json::<DetailsResponse>().await?;
        self.parse_response(payload)
    }
}

/// Place-details API response structure
#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    reviews: Option<Vec<ApiReview>>,
}

/// A single review object from the place-details API
#[derive(Debug, Deserialize)]
struct ApiReview {
    author_name: Option<String>,
    rating: Option<f64>,
    text: Option<String>,
    relative_time_description: Option<String>,
    profile_photo_url: Option<String>,
    /// Posting time as a unix epoch
    time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> PlacesApiSource {
        PlacesApiSource::new(Client::new(), "test-key", "test-place")
    }

    /// Sample valid place-details API response
    const VALID_RESPONSE: &str = r#"{
        "html_attributions": [],
        "result": {
            "rating": 4.8,
            "reviews": [
                {
                    "author_name": "Jan Peeters",
                    "author_url": "https://example.invalid/profile/1",
                    "profile_photo_url": "https://example.invalid/photo/1.png",
                    "rating": 5,
                    "relative_time_description": "a month ago",
                    "text": "Fantastic experience, everything went smoothly.",
                    "time": 1753790400
                },
                {
                    "author_name": "Lies Maes",
                    "rating": 4,
                    "relative_time_description": "3 months ago",
                    "text": "Good service, minor delays in communication.",
                    "time": 1748500000
                }
            ]
        },
        "status": "OK"
    }"#;

    #[test]
    fn test_parse_valid_response() {
        let response: DetailsResponse =
            serde_json::from_str(VALID_RESPONSE).expect("Failed to parse valid response");

        let reviews = test_source()
            .parse_response(response)
            .expect("Failed to map reviews");

        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].author, "Jan Peeters");
        assert_eq!(reviews[0].rating, 5.0);
        assert_eq!(reviews[0].id, "api-1753790400");
        assert_eq!(reviews[0].date_label, "a month ago");
        assert_eq!(
            reviews[0].avatar_url.as_deref(),
            Some("https://example.invalid/photo/1.png")
        );
        assert_eq!(reviews[0].source, Provenance::PlacesApi);
        assert_eq!(reviews[1].rating, 4.0);
        assert!(reviews[1].avatar_url.is_none());
    }

    #[test]
    fn test_parse_error_status_is_rejected() {
        let payload = r#"{ "status": "OVER_QUERY_LIMIT" }"#;
        let response: DetailsResponse = serde_json::from_str(payload).expect("Failed to parse");

        let result = test_source().parse_response(response);
        match result {
            Err(SourceError::Parse(msg)) => assert!(msg.contains("OVER_QUERY_LIMIT")),
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_ok_without_reviews_yields_empty_batch() {
        let payload = r#"{ "status": "OK", "result": {} }"#;
        let response: DetailsResponse = serde_json::from_str(payload).expect("Failed to parse");

        let reviews = test_source().parse_response(response).expect("Should map");
        assert!(reviews.is_empty());
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let payload = r#"{
            "status": "OK",
            "result": { "reviews": [ { "text": "Short and sweet." } ] }
        }"#;
        let response: DetailsResponse = serde_json::from_str(payload).expect("Failed to parse");

        let reviews = test_source().parse_response(response).expect("Should map");
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author, "Anonymous");
        assert_eq!(reviews[0].rating, 5.0, "Unknown ratings default to 5");
        assert_eq!(reviews[0].id, "api-1");
    }

    #[test]
    fn test_details_url_contains_credentials() {
        let url = test_source().details_url();
        assert!(url.contains("place_id=test-place"));
        assert!(url.contains("key=test-key"));
        assert!(url.contains("fields=reviews"));
    }

    #[test]
    fn test_parse_malformed_json() {
        let result: Result<DetailsResponse, _> = serde_json::from_str("{ invalid json }");
        assert!(result.is_err());
    }
}
