use std::time::Duration;

use chrono::{Days, Local};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;

use crate::config::Config;
use crate::models::{RawNewsItem, Region, SearchSource};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct SearchRequest {
    messages: Vec<Message>,
    model: String,
    search_parameters: SearchParameters,
    response_format: ResponseFormat,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct SearchParameters {
    mode: String,
    from_date: String,
    to_date: String,
    sources: Vec<SearchSource>,
    max_search_results: u32,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// Fetches one news digest per region from the Grok live-search API.
///
/// `fetch` never propagates an error: upstream failures of any kind
/// degrade to an empty digest, so callers treat "API down" the same as
/// "no news today".
pub struct DigestFetcher {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    retry_delay: Duration,
}

impl DigestFetcher {
    pub fn new(config: &Config, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            endpoint: config.api_endpoint.clone(),
            model: config.model.clone(),
            api_key,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Fetch the digest for one region. Gateway timeouts and transport
    /// errors are retried up to the attempt budget with a fixed delay;
    /// everything else fails the whole attempt sequence immediately.
    pub async fn fetch(&self, region: Region) -> Vec<RawNewsItem> {
        let request = self.build_request(region);

        for attempt in 1..=MAX_ATTEMPTS {
            tracing::info!(region = %region, attempt, "requesting news digest");

            let response = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    if attempt < MAX_ATTEMPTS {
                        tracing::warn!(region = %region, attempt, error = %e, "transport error, retrying");
                        sleep(self.retry_delay).await;
                        continue;
                    }
                    tracing::error!(region = %region, error = %e, "transport error on final attempt");
                    return Vec::new();
                }
            };

            let status = response.status();
            if status == StatusCode::GATEWAY_TIMEOUT {
                if attempt < MAX_ATTEMPTS {
                    tracing::warn!(region = %region, attempt, status = %status, "gateway timeout, retrying");
                    sleep(self.retry_delay).await;
                    continue;
                }
                tracing::error!(region = %region, status = %status, "gateway timeout on final attempt");
                return Vec::new();
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(region = %region, status = %status, body = %body, "search API returned an error");
                return Vec::new();
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    if attempt < MAX_ATTEMPTS {
                        tracing::warn!(region = %region, attempt, error = %e, "failed reading response body, retrying");
                        sleep(self.retry_delay).await;
                        continue;
                    }
                    tracing::error!(region = %region, error = %e, "failed reading response body on final attempt");
                    return Vec::new();
                }
            };

            return decode_digest(region, &body);
        }

        Vec::new()
    }

    fn build_request(&self, region: Region) -> SearchRequest {
        let today = Local::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

        SearchRequest {
            messages: vec![Message {
                role: "user".to_string(),
                content: digest_prompt(region.query()),
            }],
            model: self.model.clone(),
            search_parameters: SearchParameters {
                mode: "on".to_string(),
                from_date: yesterday.format("%Y-%m-%d").to_string(),
                to_date: today.format("%Y-%m-%d").to_string(),
                sources: region.sources(),
                max_search_results: region.max_search_results(),
            },
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

fn digest_prompt(query: &str) -> String {
    format!(
        r#"Please provide a comprehensive digest of {} from reputable and authoritative news organizations. Aim for at least 6-12 diverse news items if available within the specified timeframe.
For general global news or global technology news, prioritize internationally recognized news agencies, established media outlets, and reputable tech publications (e.g., Reuters, Associated Press, BBC News, CNN, The New York Times, The Wall Street Journal, The Guardian, Le Monde, Der Spiegel, TechCrunch, Wired, The Verge, Ars Technica).
For China news, prioritize official news agencies and major state-affiliated media (e.g., Xinhua News Agency, People's Daily, CCTV, China Daily, Global Times, CGTN).
Return the response strictly as a JSON object with a single key named "news_items".
The "news_items" array should contain multiple distinct news articles.
The value of "news_items" must be an array of news articles.
Each news article object in the array must have the following string fields: "title", "contents", and "source".
It must also have a field named "links" which is an array of URL strings.
Ensure the "contents" field provides a detailed summary or the main points of the news.
If a news article is in English, provide both the original title and contents, and their Chinese translations. The translated title should be in a field named "title_cn" and the translated contents in a field named "contents_cn". If the news article is already in Chinese, then omit "title_cn" and "contents_cn".
If providing translations, ensure they are accurate and natural-sounding.
Do not include any explanations, introductory text, or any characters outside of the JSON object itself.
The "title" should be concise and informative (in the original language).
The "links" array should contain relevant URLs for the news item. It can be an empty array if no specific links are found.
The "source" should be the name of the news publication or source."#,
        query
    )
}

/// Two-stage decode: the API wraps a JSON payload as a string inside the
/// chat-completion envelope. Each stage logs its own failure mode so a bad
/// response stays attributable (envelope vs payload vs schema).
fn decode_digest(region: Region, body: &str) -> Vec<RawNewsItem> {
    let envelope: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(region = %region, error = %e, body = %body, "response envelope is not valid JSON");
            return Vec::new();
        }
    };

    let content = match envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        Some(content) => content,
        None => {
            tracing::warn!(region = %region, body = %body, "response did not contain message content");
            return Vec::new();
        }
    };

    let payload: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(region = %region, error = %e, content = %content, "message content is not valid JSON");
            return Vec::new();
        }
    };

    let items = match payload.get("news_items") {
        Some(items) if items.is_array() => items.clone(),
        _ => {
            tracing::warn!(region = %region, content = %content, "payload is missing an array-typed news_items");
            return Vec::new();
        }
    };

    match serde_json::from_value::<Vec<RawNewsItem>>(items) {
        Ok(items) => {
            tracing::info!(region = %region, count = items.len(), "parsed news digest");
            items
        }
        Err(e) => {
            tracing::error!(region = %region, error = %e, content = %content, "news_items entries did not match the expected shape");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(server: &MockServer) -> DigestFetcher {
        let config = Config {
            api_endpoint: format!("{}/v1/chat/completions", server.uri()),
            ..Config::default()
        };
        let mut fetcher = DigestFetcher::new(&config, "xai-test-key".to_string());
        fetcher.retry_delay = Duration::from_millis(100);
        fetcher
    }

    fn envelope_with(payload: Value) -> Value {
        json!({
            "choices": [{
                "message": {
                    "content": serde_json::to_string(&payload).unwrap()
                }
            }]
        })
    }

    fn valid_body() -> Value {
        envelope_with(json!({
            "news_items": [
                {
                    "title": "Markets rally",
                    "contents": "Stocks rose across the board.",
                    "source": "Reuters",
                    "links": ["https://a.example/1"]
                },
                {
                    "title": "新能源产业增长",
                    "contents": "产业快速增长。",
                    "source": "新华社",
                    "links": []
                }
            ]
        }))
    }

    #[tokio::test]
    async fn gateway_timeouts_are_retried_then_succeed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(504))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(valid_body()))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(&server);
        let start = Instant::now();
        let items = fetcher.fetch(Region::Global).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("Markets rally"));
        // Two retries with the fixed delay in between.
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(&server);
        let items = fetcher.fetch(Region::China).await;

        assert!(items.is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn exhausted_gateway_timeouts_yield_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(504))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(&server);
        let items = fetcher.fetch(Region::GlobalTech).await;

        assert!(items.is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unparsable_message_content_yields_empty() {
        let server = MockServer::start().await;

        let body = json!({
            "choices": [{"message": {"content": "this is not json"}}]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(&server);
        assert!(fetcher.fetch(Region::Global).await.is_empty());
    }

    #[tokio::test]
    async fn non_array_news_items_yields_empty() {
        let server = MockServer::start().await;

        let body = envelope_with(json!({"news_items": "not an array"}));
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(&server);
        assert!(fetcher.fetch(Region::Global).await.is_empty());
    }

    #[tokio::test]
    async fn missing_message_content_yields_empty_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(&server);
        assert!(fetcher.fetch(Region::Global).await.is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test]
    fn request_carries_region_search_parameters() {
        let config = Config::default();
        let fetcher = DigestFetcher::new(&config, "xai-test-key".to_string());

        let request = fetcher.build_request(Region::China);
        assert_eq!(request.search_parameters.max_search_results, 30);
        assert_eq!(request.search_parameters.sources.len(), 3);
        assert_eq!(
            request.search_parameters.sources[0].country.as_deref(),
            Some("CN")
        );

        let request = fetcher.build_request(Region::Global);
        assert_eq!(request.search_parameters.max_search_results, 25);
        assert!(request
            .search_parameters
            .sources
            .iter()
            .all(|s| s.country.is_none()));
    }
}
