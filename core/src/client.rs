//! The abstraction the controller issues service calls through, and the
//! concrete HTTP implementation that backs the binaries.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::model::{Client, Job, JobSizes, Property, QueueEntry, ScriptDescriptor, ServerFacts};

/// Everything the controller needs from the remote service.
///
/// Uses a native `async fn` in trait rather than the `async-trait` crate:
/// every caller is generic over a concrete `C: ServiceClient`, never a
/// trait object, so the extra dependency buys nothing here.
#[allow(async_fn_in_trait)]
pub trait ServiceClient {
    /// Supply credentials for subsequent calls.
    fn set_credentials(&mut self, key: String, secret: String);

    /// Probe the service; returns the negotiated facts on success.
    async fn alive(&self) -> Result<ServerFacts>;

    async fn scripts(&self) -> Result<Vec<ScriptDescriptor>>;

    async fn script(&self, id: &str) -> Result<ScriptDescriptor>;

    fn script_url(&self, id: &str) -> String;

    async fn submit_job(&self, wire: WireJobRequest, payload: Option<Vec<u8>>) -> Result<Job>;

    async fn job(&self, id: &str, from_sequence: u64) -> Result<Job>;

    async fn delete_job(&self, id: &str) -> Result<()>;

    async fn results(&self, id: &str) -> Result<Vec<u8>>;

    async fn log(&self, id: &str) -> Result<Vec<u8>>;

    async fn jobs(&self) -> Result<Vec<Job>>;

    async fn halt(&self, key: &str) -> Result<()>;

    async fn clients(&self) -> Result<Vec<Client>>;

    async fn new_client(&self, client: Client) -> Result<Client>;

    async fn modify_client(&self, client: Client) -> Result<Client>;

    async fn delete_client(&self, id: &str) -> Result<()>;

    async fn client(&self, id: &str) -> Result<Client>;

    async fn properties(&self) -> Result<Vec<Property>>;

    async fn sizes(&self) -> Result<JobSizes>;

    async fn queue(&self) -> Result<Vec<QueueEntry>>;

    async fn move_up(&self, id: &str) -> Result<Vec<QueueEntry>>;

    async fn move_down(&self, id: &str) -> Result<Vec<QueueEntry>>;
}

/// Wire shape of a job submission, translated from a [`crate::model::JobRequest`]
/// by the execution engine (one scalar per single-valued option, an items
/// list otherwise).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireJobRequest {
    pub href: String,
    #[serde(default)]
    pub nicename: Option<String>,
    pub inputs: Vec<WireInput>,
    pub options: Vec<WireOption>,
    pub background: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireInput {
    pub name: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireOption {
    Scalar { name: String, value: String },
    Items { name: String, items: Vec<String> },
}

/// `reqwest`-backed implementation of [`ServiceClient`].
pub struct HttpServiceClient {
    http: reqwest::Client,
    base_url: String,
    key: Option<String>,
    secret: Option<String>,
}

impl HttpServiceClient {
    pub fn new(base_url: String, timeout_seconds: i64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1) as u64))
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, base_url, key: None, secret: None })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.key, &self.secret) {
            (Some(k), Some(s)) => builder.basic_auth(k, Some(s)),
            _ => builder,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let resp = self
            .authed(self.http.get(self.url(path)))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(PipelineError::Transport(format!(
                "GET {path} returned {}",
                resp.status()
            ))
            .into());
        }
        resp.json::<T>().await.map_err(|e| PipelineError::Transport(e.to_string()).into())
    }
}

#[allow(async_fn_in_trait)]
impl ServiceClient for HttpServiceClient {
    fn set_credentials(&mut self, key: String, secret: String) {
        self.key = Some(key);
        self.secret = Some(secret);
    }

    async fn alive(&self) -> Result<ServerFacts> {
        self.get_json("alive").await
    }

    async fn scripts(&self) -> Result<Vec<ScriptDescriptor>> {
        self.get_json("scripts").await
    }

    async fn script(&self, id: &str) -> Result<ScriptDescriptor> {
        self.get_json(&format!("scripts/{id}")).await
    }

    fn script_url(&self, id: &str) -> String {
        self.url(&format!("scripts/{id}"))
    }

    async fn submit_job(&self, wire: WireJobRequest, payload: Option<Vec<u8>>) -> Result<Job> {
        let req = self.authed(self.http.post(self.url("jobs")));
        let resp = if let Some(bytes) = payload {
            let form = reqwest::multipart::Form::new()
                .text("job", serde_json::to_string(&wire)?)
                .part("data", reqwest::multipart::Part::bytes(bytes).file_name("data"));
            req.multipart(form).send().await
        } else {
            req.json(&wire).send().await
        }
        .map_err(|e| PipelineError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PipelineError::Transport(format!(
                "job submission returned {}",
                resp.status()
            ))
            .into());
        }
        resp.json::<Job>().await.map_err(|e| PipelineError::Transport(e.to_string()).into())
    }

    async fn job(&self, id: &str, from_sequence: u64) -> Result<Job> {
        self.get_json(&format!("jobs/{id}?fromSequence={from_sequence}")).await
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        let resp = self
            .authed(self.http.delete(self.url(&format!("jobs/{id}"))))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(PipelineError::Transport(format!(
                "delete job returned {}",
                resp.status()
            ))
            .into());
        }
        Ok(())
    }

    async fn results(&self, id: &str) -> Result<Vec<u8>> {
        let resp = self
            .authed(self.http.get(self.url(&format!("jobs/{id}/result"))))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        Ok(resp.bytes().await.map_err(|e| PipelineError::Transport(e.to_string()))?.to_vec())
    }

    async fn log(&self, id: &str) -> Result<Vec<u8>> {
        let resp = self
            .authed(self.http.get(self.url(&format!("jobs/{id}/log"))))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        Ok(resp.bytes().await.map_err(|e| PipelineError::Transport(e.to_string()))?.to_vec())
    }

    async fn jobs(&self) -> Result<Vec<Job>> {
        self.get_json("jobs").await
    }

    async fn halt(&self, key: &str) -> Result<()> {
        let resp = self
            .authed(self.http.post(self.url("admin/halt")))
            .query(&[("key", key)])
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(PipelineError::Transport(format!("halt returned {}", resp.status())).into());
        }
        Ok(())
    }

    async fn clients(&self) -> Result<Vec<Client>> {
        self.get_json("clients").await
    }

    async fn new_client(&self, client: Client) -> Result<Client> {
        let resp = self
            .authed(self.http.post(self.url("clients")))
            .json(&client)
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        resp.json::<Client>().await.map_err(|e| PipelineError::Transport(e.to_string()).into())
    }

    async fn modify_client(&self, client: Client) -> Result<Client> {
        let resp = self
            .authed(self.http.put(self.url(&format!("clients/{}", client.id))))
            .json(&client)
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        resp.json::<Client>().await.map_err(|e| PipelineError::Transport(e.to_string()).into())
    }

    async fn delete_client(&self, id: &str) -> Result<()> {
        let resp = self
            .authed(self.http.delete(self.url(&format!("clients/{id}"))))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(PipelineError::Transport(format!(
                "delete client returned {}",
                resp.status()
            ))
            .into());
        }
        Ok(())
    }

    async fn client(&self, id: &str) -> Result<Client> {
        self.get_json(&format!("clients/{id}")).await
    }

    async fn properties(&self) -> Result<Vec<Property>> {
        self.get_json("properties").await
    }

    async fn sizes(&self) -> Result<JobSizes> {
        self.get_json("admin/sizes").await
    }

    async fn queue(&self) -> Result<Vec<QueueEntry>> {
        self.get_json("admin/queue").await
    }

    async fn move_up(&self, id: &str) -> Result<Vec<QueueEntry>> {
        let resp = self
            .authed(self.http.post(self.url(&format!("admin/queue/{id}/up"))))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        resp.json().await.map_err(|e| PipelineError::Transport(e.to_string()).into())
    }

    async fn move_down(&self, id: &str) -> Result<Vec<QueueEntry>> {
        let resp = self
            .authed(self.http.post(self.url(&format!("admin/queue/{id}/down"))))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        resp.json().await.map_err(|e| PipelineError::Transport(e.to_string()).into())
    }
}
