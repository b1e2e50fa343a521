use super::rest::{RestClient, TokenSource};
use crate::error::Result;
use crate::resource::ScheduledQueryInfo;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

pub const DATA_TRANSFER_URL: &str = "https://bigquerydatatransfer.googleapis.com";

const SCHEDULED_QUERY_SOURCE: &str = "scheduled_query";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferConfig {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    data_source_id: String,
    #[serde(default)]
    schedule: String,
    update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    params: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferConfigPage {
    #[serde(default)]
    transfer_configs: Vec<TransferConfig>,
    next_page_token: Option<String>,
}

/// Lists scheduled queries through the BigQuery Data Transfer API.
#[derive(Debug, Clone)]
pub struct TransferClient {
    rest: RestClient,
}

impl TransferClient {
    pub fn new(tokens: TokenSource) -> Self {
        Self::with_base_url(DATA_TRANSFER_URL, tokens)
    }

    pub fn with_base_url(base_url: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            rest: RestClient::new(base_url, tokens),
        }
    }

    pub async fn list_scheduled_queries(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<ScheduledQueryInfo>> {
        let path = format!(
            "v1/projects/{}/locations/{}/transferConfigs",
            project, region
        );
        let mut queries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("dataSourceIds", SCHEDULED_QUERY_SOURCE)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: TransferConfigPage = self.rest.get_json(&path, &query).await?;

            queries.extend(
                page.transfer_configs
                    .into_iter()
                    .filter(|c| c.data_source_id == SCHEDULED_QUERY_SOURCE)
                    .map(|c| ScheduledQueryInfo {
                        sql: c
                            .params
                            .get("query")
                            .and_then(|q| q.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        name: c.display_name,
                        schedule: c.schedule,
                        modified: c.update_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                    }),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CONFIGS_PATH: &str = "/v1/projects/proj/locations/us-east1/transferConfigs";

    #[tokio::test]
    async fn test_lists_scheduled_queries_across_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONFIGS_PATH))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transferConfigs": [{
                    "displayName": "weekly",
                    "dataSourceId": "scheduled_query",
                    "schedule": "every monday 09:00",
                    "params": {"query": "SELECT 2"}
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(CONFIGS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transferConfigs": [
                    {
                        "displayName": "daily_load",
                        "dataSourceId": "scheduled_query",
                        "schedule": "every 24 hours",
                        "updateTime": "2025-01-01T00:00:00.123456Z",
                        "params": {"query": "INSERT INTO t SELECT 1", "destination_table_name_template": "t"}
                    },
                    {
                        "displayName": "gcs import",
                        "dataSourceId": "google_cloud_storage",
                        "schedule": "every 24 hours"
                    }
                ],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let client = TransferClient::with_base_url(server.uri(), TokenSource::Static("t".into()));
        let queries = client
            .list_scheduled_queries("proj", "us-east1")
            .await
            .unwrap();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].name, "daily_load");
        assert_eq!(queries[0].sql, "INSERT INTO t SELECT 1");
        assert_eq!(queries[0].schedule, "every 24 hours");
        assert_eq!(
            queries[0].modified.date_naive(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().date_naive()
        );
        assert_eq!(queries[1].name, "weekly");
        assert_eq!(queries[1].modified.timestamp(), 0);
    }
}
