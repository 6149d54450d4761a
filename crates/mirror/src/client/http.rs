use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use interface::{ClientError, CommandReply, Settings, StatusMessage, TradeLogResponse};

use super::{ensure_success, Command, CommandGateway, DashboardApi};
use crate::config::Config;

/// 대시보드 서버 REST 클라이언트
#[derive(Debug, Clone)]
pub struct HttpDashboardClient {
    http: reqwest::Client,
    base_url: String,
    command_timeout: Duration,
}

impl HttpDashboardClient {
    pub fn new(base_url: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            command_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server_url.clone(), config.command_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 브라우저 캐시 회피용 쿼리를 붙인 GET
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let mut params: Vec<(&str, String)> = query.to_vec();
        params.push(("t", Utc::now().timestamp_millis().to_string()));

        let response = self.http.get(self.url(path)).query(&params).send().await?;
        let text = read_body(response).await?;

        serde_json::from_str(&text).map_err(|e| {
            ClientError::Decode(format!(
                "{} 응답 해석 실패: {}, response: {}",
                path,
                e,
                snippet(&text)
            ))
        })
    }

    async fn send_for_reply(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<CommandReply, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        // 실패 응답도 {success, error} 모양이면 그 문구를 살린다
        match serde_json::from_str::<CommandReply>(&text) {
            Ok(reply) if reply.success.is_some() || reply.error.is_some() => ensure_success(reply),
            _ if !status.is_success() => Err(ClientError::Other(format!(
                "HTTP error: status {}, response: {}",
                status,
                snippet(&text)
            ))),
            _ => Err(ClientError::Decode(format!(
                "응답에 success 필드가 없습니다: {}",
                snippet(&text)
            ))),
        }
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardClient {
    async fn fetch_status(&self) -> Result<StatusMessage, ClientError> {
        self.get_json("/api/status", &[]).await
    }

    async fn fetch_trade_log(&self, since_id: u64) -> Result<TradeLogResponse, ClientError> {
        let response: TradeLogResponse = self
            .get_json("/api/trading-log", &[("since_id", since_id.to_string())])
            .await?;

        if let Some(error) = &response.error {
            return Err(ClientError::Rejected(error.clone()));
        }
        if response.buys.is_none() || response.sells.is_none() {
            return Err(ClientError::Decode(
                "매매 로그 응답에 buys/sells 가 없습니다".to_string(),
            ));
        }

        debug!(
            "trading-log since_id={}: buys={}, sells={}",
            since_id,
            response.buys.as_ref().map(Vec::len).unwrap_or(0),
            response.sells.as_ref().map(Vec::len).unwrap_or(0)
        );
        Ok(response)
    }

    async fn fetch_settings(&self) -> Result<Settings, ClientError> {
        self.get_json("/api/settings", &[]).await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<CommandReply, ClientError> {
        let request = self.http.post(self.url("/api/settings")).json(settings);
        self.send_for_reply(request).await
    }

    async fn clear_entries(&self) -> Result<CommandReply, ClientError> {
        let request = self.http.delete(self.url("/api/buy-log"));
        self.send_for_reply(request).await
    }

    async fn clear_exits(&self) -> Result<CommandReply, ClientError> {
        let request = self.http.delete(self.url("/api/sell-log"));
        self.send_for_reply(request).await
    }
}

#[async_trait]
impl CommandGateway for HttpDashboardClient {
    async fn send_command(&self, command: Command) -> Result<CommandReply, ClientError> {
        info!("명령 전송: {}", command);

        let request = self
            .http
            .post(self.url("/api/command"))
            .json(&json!({ "command": command.to_string() }));

        let pending = self.send_for_reply(request);
        let result = match tokio::time::timeout(self.command_timeout, pending).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.command_timeout)),
        };

        match &result {
            Ok(_) => info!("명령 실행: {}", command),
            Err(e) => warn!("명령 실패: {} ({})", command, e),
        }
        result
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, ClientError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ClientError::Other(format!(
            "HTTP error: status {}, response: {}",
            status,
            snippet(&text)
        )));
    }
    Ok(text)
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}
