//! AI re-staging of a stitched panorama.
//!
//! The staging pipeline is three remote hops: upload the panorama to an
//! image host to obtain a public URL, submit an image-to-image task with a
//! text prompt, then poll the task record until a result image URL appears
//! and download it.

use std::path::Path;
use std::time::Duration;

use log::info;
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;

use crate::error::{ensure_success, RemoteError};
use crate::poll::{drive, JobPoll, PollPolicy};

const GENERATE_URL: &str = "https://api.nanobananaapi.ai/api/v1/nanobanana/generate";
const RECORD_INFO_URL: &str = "https://api.nanobananaapi.ai/api/v1/nanobanana/record-info";
const IMAGE_HOST_URL: &str = "https://api.imgbb.com/1/upload";

// The task type literal is fixed by the provider, typo included.
const TASK_TYPE: &str = "IMAGETOIAMGE";

// Task record success flags.
const FLAG_GENERATING: u8 = 0;
const FLAG_SUCCESS: u8 = 1;

/// Client for prompt-driven panorama restyling.
pub struct StagingClient {
    http: Client,
    api_key: String,
    host_key: String,
    policy: PollPolicy,
}

#[derive(Debug, Deserialize)]
struct HostUpload {
    data: HostUploadData,
}

#[derive(Debug, Deserialize)]
struct HostUploadData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TaskEnvelope<T> {
    code: u16,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(rename = "taskId")]
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct RecordData {
    #[serde(rename = "successFlag")]
    success_flag: u8,
    #[serde(default)]
    response: Option<RecordResponse>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    #[serde(rename = "resultImageUrl", default)]
    result_image_url: Option<String>,
}

impl StagingClient {
    /// `api_key` authenticates the generation service, `host_key` the
    /// intermediate image host.
    pub fn new(api_key: impl Into<String>, host_key: impl Into<String>) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            host_key: host_key.into(),
            policy: PollPolicy::new(Duration::from_secs(5), Duration::from_secs(540)),
        })
    }

    /// Override the default 5 s / 540 s polling policy.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Restyle the panorama at `image` according to `prompt`.
    ///
    /// Returns the bytes of the generated image.
    pub fn stage(&self, image: &Path, prompt: &str) -> Result<Vec<u8>, RemoteError> {
        let image_url = self.upload_to_host(image)?;
        let task_id = self.submit_task(&image_url, prompt)?;
        let result_url = drive("staging", self.policy, || self.poll_task(&task_id))?;
        self.download(&result_url)
    }

    fn upload_to_host(&self, image: &Path) -> Result<String, RemoteError> {
        info!("uploading {} to image host", image.display());
        let form = multipart::Form::new().file("image", image)?;
        let resp = self
            .http
            .post(IMAGE_HOST_URL)
            .query(&[("key", self.host_key.as_str())])
            .multipart(form)
            .send()?;
        let upload: HostUpload = ensure_success(resp)?.json()?;
        Ok(upload.data.url)
    }

    fn submit_task(&self, image_url: &str, prompt: &str) -> Result<String, RemoteError> {
        info!("submitting staging task");
        let body = serde_json::json!({
            "prompt": prompt,
            "type": TASK_TYPE,
            "imageUrls": [image_url],
            "numImages": 1,
            "image_size": "16:9",
            // The service requires a callback URL even when polling.
            "callBackUrl": "https://nanobananaapi.ai/",
        });
        let resp = self
            .http
            .post(GENERATE_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;
        let envelope: TaskEnvelope<SubmitData> = ensure_success(resp)?.json()?;
        if envelope.code != 200 {
            return Err(RemoteError::Api {
                status: envelope.code,
                message: envelope.msg,
            });
        }
        envelope
            .data
            .map(|d| d.task_id)
            .ok_or_else(|| RemoteError::UnexpectedShape("submit response missing data.taskId".to_string()))
    }

    fn poll_task(&self, task_id: &str) -> Result<JobPoll<String>, RemoteError> {
        let resp = self
            .http
            .get(RECORD_INFO_URL)
            .bearer_auth(&self.api_key)
            .query(&[("taskId", task_id)])
            .send()?;
        let envelope: TaskEnvelope<RecordData> = ensure_success(resp)?.json()?;
        if envelope.code != 200 {
            return Err(RemoteError::Api {
                status: envelope.code,
                message: envelope.msg,
            });
        }
        let record = match envelope.data {
            Some(record) => record,
            None => return Ok(JobPoll::Running),
        };
        Ok(classify_record(record))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        info!("downloading staged panorama");
        let resp = self.http.get(url).send()?;
        let bytes = ensure_success(resp)?.bytes()?;
        Ok(bytes.to_vec())
    }
}

fn classify_record(record: RecordData) -> JobPoll<String> {
    match record.success_flag {
        FLAG_GENERATING => JobPoll::Running,
        FLAG_SUCCESS => match record.response.and_then(|r| r.result_image_url) {
            Some(url) => JobPoll::Succeeded(url),
            None => JobPoll::Failed("task succeeded without a result image url".to_string()),
        },
        flag => JobPoll::Failed(
            record
                .error_message
                .unwrap_or_else(|| format!("generation failed (flag {flag})")),
        ),
    }
}
