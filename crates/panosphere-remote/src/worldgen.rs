//! Panorama to navigable 3D world generation.
//!
//! Pipeline against the World Labs Marble API:
//!
//! 1. `media-assets:prepare_upload` returns a media asset id and a signed
//!    storage URL.
//! 2. PUT the panorama bytes to the signed URL.
//! 3. `worlds:generate` submits the job in panorama mode.
//! 4. Poll `operations/{id}` until done.
//! 5. Extract asset URLs into a [`WorldManifest`].
//!
//! The live API and its documentation disagree on field casing and on
//! whether the final world object arrives bare or wrapped, so the parsers
//! here accept both shapes and fall back to scanning for any nested object
//! carrying an `id`.

use std::collections::HashMap;
use std::time::Duration;

use log::{info, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ensure_success, RemoteError};
use crate::poll::{drive, JobPoll, PollPolicy};

const BASE_URL: &str = "https://api.worldlabs.ai";
const API_KEY_HEADER: &str = "WLT-Api-Key";
const DEFAULT_MODEL: &str = "Marble 0.1-plus";

/// Parameters for one world-generation job.
#[derive(Debug, Clone)]
pub struct WorldGenRequest {
    /// Human-readable name shown in the provider's library.
    pub display_name: String,
    /// Optional scene description; falls back to `display_name`.
    pub text_prompt: Option<String>,
    /// Generation model, e.g. `"Marble 0.1-plus"`.
    pub model: String,
}

impl Default for WorldGenRequest {
    fn default() -> Self {
        Self {
            display_name: "Interior Panorama".to_string(),
            text_prompt: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl WorldGenRequest {
    fn effective_prompt(&self) -> &str {
        self.text_prompt.as_deref().unwrap_or(&self.display_name)
    }
}

/// Asset URLs of a generated world.
///
/// Splats come in three density variants; the collider mesh is a GLB for
/// physics and raycasting. Any field the provider omits stays `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldManifest {
    pub world_id: String,
    pub marble_url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub pano_url: Option<String>,
    pub spz_url_100k: Option<String>,
    pub spz_url_500k: Option<String>,
    pub spz_url_full: Option<String>,
    pub collider_mesh_url: Option<String>,
}

/// Client for panorama-to-world reconstruction.
pub struct WorldGenClient {
    http: Client,
    api_key: String,
    base_url: String,
    policy: PollPolicy,
}

#[derive(Debug, Deserialize)]
struct PrepareUpload {
    #[serde(alias = "mediaAsset", default)]
    media_asset: Option<MediaAsset>,
    #[serde(alias = "uploadInfo", default)]
    upload_info: Option<UploadInfo>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    upload_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaAsset {
    #[serde(
        alias = "id",
        alias = "asset_id",
        alias = "mediaAssetId",
        default
    )]
    media_asset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadInfo {
    #[serde(alias = "uploadUrl", default)]
    upload_url: Option<String>,
    #[serde(alias = "requiredHeaders", default)]
    required_headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(alias = "operationId", default)]
    operation_id: Option<String>,
    #[serde(default)]
    operation: Option<OperationRef>,
}

#[derive(Debug, Deserialize)]
struct OperationRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    metadata: Option<OperationMetadata>,
}

#[derive(Debug, Deserialize)]
struct OperationMetadata {
    #[serde(default)]
    progress: Option<OperationProgress>,
}

#[derive(Debug, Deserialize)]
struct OperationProgress {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct World {
    #[serde(alias = "world_id")]
    id: String,
    #[serde(default)]
    world_marble_url: Option<String>,
    #[serde(default)]
    assets: Option<WorldAssets>,
}

#[derive(Debug, Deserialize, Default)]
struct WorldAssets {
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    splats: Option<WorldSplats>,
    #[serde(default)]
    mesh: Option<WorldMesh>,
    #[serde(default)]
    imagery: Option<WorldImagery>,
}

#[derive(Debug, Deserialize)]
struct WorldSplats {
    #[serde(default)]
    spz_urls: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct WorldMesh {
    #[serde(default)]
    collider_mesh_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorldImagery {
    #[serde(default)]
    pano_url: Option<String>,
}

impl WorldGenClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            policy: PollPolicy::new(Duration::from_secs(8), Duration::from_secs(540)),
        })
    }

    /// Override the default 8 s / 540 s polling policy.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Full pipeline: panorama bytes to a [`WorldManifest`] of asset URLs.
    pub fn reconstruct(
        &self,
        image_bytes: Vec<u8>,
        request: &WorldGenRequest,
    ) -> Result<WorldManifest, RemoteError> {
        let media_asset_id = self.upload_panorama(image_bytes)?;
        let operation_id = self.submit_generation(&media_asset_id, request)?;
        let world = drive("worldgen", self.policy, || self.poll_operation(&operation_id))?;
        parse_world(&world)
    }

    fn upload_panorama(&self, image_bytes: Vec<u8>) -> Result<String, RemoteError> {
        let resp = self
            .http
            .post(format!("{}/marble/v1/media-assets:prepare_upload", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&serde_json::json!({
                "file_name": "panorama.jpg",
                "kind": "image",
                "extension": "jpg",
            }))
            .send()?;
        let prep: PrepareUpload = ensure_success(resp)?.json()?;

        let media_asset_id = prep
            .media_asset
            .and_then(|a| a.media_asset_id)
            .or(prep.id)
            .ok_or_else(|| {
                RemoteError::UnexpectedShape(
                    "prepare_upload response missing media asset id".to_string(),
                )
            })?;
        let (upload_url, required_headers) = match prep.upload_info {
            Some(info) => (info.upload_url, info.required_headers),
            None => (None, HashMap::new()),
        };
        let upload_url = upload_url.or(prep.upload_url).ok_or_else(|| {
            RemoteError::UnexpectedShape("prepare_upload response missing upload url".to_string())
        })?;

        info!(
            "uploading panorama ({} bytes) as media asset {media_asset_id}",
            image_bytes.len()
        );
        let mut put = self.http.put(&upload_url);
        for (name, value) in &required_headers {
            put = put.header(name.as_str(), value.as_str());
        }
        ensure_success(put.body(image_bytes).send()?)?;
        Ok(media_asset_id)
    }

    fn submit_generation(
        &self,
        media_asset_id: &str,
        request: &WorldGenRequest,
    ) -> Result<String, RemoteError> {
        let payload = serde_json::json!({
            "display_name": request.display_name,
            "model": request.model,
            "world_prompt": {
                "type": "image",
                "image_prompt": {
                    "source": "media_asset",
                    "media_asset_id": media_asset_id,
                    "is_pano": true,
                },
                "text_prompt": request.effective_prompt(),
            },
        });
        let resp = self
            .http
            .post(format!("{}/marble/v1/worlds:generate", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()?;
        let body: GenerateResponse = ensure_success(resp)?.json()?;
        let operation_id = body
            .operation_id
            .or(body.operation.map(|op| op.id))
            .ok_or_else(|| {
                RemoteError::UnexpectedShape("generate response missing operation id".to_string())
            })?;
        info!("generation submitted, operation {operation_id}");
        Ok(operation_id)
    }

    fn poll_operation(&self, operation_id: &str) -> Result<JobPoll<Value>, RemoteError> {
        let resp = self
            .http
            .get(format!("{}/marble/v1/operations/{operation_id}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .send()?;
        let op: Operation = ensure_success(resp)?.json()?;
        Ok(classify_operation(op))
    }
}

fn classify_operation(op: Operation) -> JobPoll<Value> {
    if op.done {
        if let Some(error) = op.error {
            return JobPoll::Failed(error.to_string());
        }
        return match op.response {
            Some(response) => JobPoll::Succeeded(response),
            None => JobPoll::Failed("operation done without a response body".to_string()),
        };
    }
    let progress = op.metadata.and_then(|m| m.progress);
    if let Some(progress) = progress {
        let status = progress.status.as_deref().unwrap_or("UNKNOWN");
        if status == "FAILED" || status == "CANCELLED" {
            return JobPoll::Failed(
                progress
                    .description
                    .unwrap_or_else(|| format!("generation {status}")),
            );
        }
    }
    JobPoll::Running
}

/// Extract a [`WorldManifest`] from the operation response.
///
/// Accepts the bare world object, the `{"world": {...}}` wrapper, and as a
/// last resort any nested object carrying an `id`.
fn parse_world(response: &Value) -> Result<WorldManifest, RemoteError> {
    let world_value = if let Some(wrapped) = response.get("world").filter(|w| w.is_object()) {
        wrapped
    } else if response.get("id").is_some() {
        response
    } else {
        warn!("unrecognized world response shape, scanning nested objects");
        response
            .as_object()
            .and_then(|map| {
                map.values()
                    .find(|v| v.is_object() && v.get("id").is_some())
            })
            .ok_or_else(|| {
                RemoteError::UnexpectedShape("no world object found in operation response".to_string())
            })?
    };
    let world: World = serde_json::from_value(world_value.clone())?;
    Ok(manifest_from_world(world))
}

fn manifest_from_world(world: World) -> WorldManifest {
    let assets = world.assets.unwrap_or_default();
    let mut spz_urls = assets
        .splats
        .map(|s| s.spz_urls)
        .unwrap_or_default();
    let marble_url = world
        .world_marble_url
        .unwrap_or_else(|| format!("https://marble.worldlabs.ai/world/{}", world.id));
    WorldManifest {
        world_id: world.id,
        marble_url,
        thumbnail_url: assets.thumbnail_url,
        caption: assets.caption,
        pano_url: assets.imagery.and_then(|i| i.pano_url),
        spz_url_100k: spz_urls.remove("100k"),
        spz_url_500k: spz_urls.remove("500k"),
        spz_url_full: spz_urls.remove("full_res"),
        collider_mesh_url: assets.mesh.and_then(|m| m.collider_mesh_url),
    }
}
