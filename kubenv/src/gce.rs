use anyhow::{bail, Context as _};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::select::{InstanceTemplate, MetadataItem};

const TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Ambient default credentials: the instance metadata server, or the
/// `GCE_ACCESS_TOKEN` environment variable when running off-instance.
pub fn access_token(client: &Client) -> anyhow::Result<String> {
    if let Ok(token) = std::env::var("GCE_ACCESS_TOKEN") {
        return Ok(token);
    }

    let response = client
        .get(TOKEN_URL)
        .header("Metadata-Flavor", "Google")
        .send()
        .context("Requesting access token from metadata server")?
        .error_for_status()
        .context("Metadata server refused token request")?;

    let token: TokenResponse = response.json().context("Parsing token response")?;
    Ok(token.access_token)
}

// region: wire format
#[derive(Deserialize, Default)]
struct TemplateList {
    #[serde(default)]
    items: Vec<TemplateResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateResource {
    #[serde(default)]
    name: String,
    #[serde(default)]
    creation_timestamp: String,
    #[serde(default)]
    properties: TemplateProperties,
}

#[derive(Deserialize, Default)]
struct TemplateProperties {
    #[serde(default)]
    metadata: TemplateMetadata,
}

#[derive(Deserialize, Default)]
struct TemplateMetadata {
    #[serde(default)]
    items: Vec<TemplateMetadataItem>,
}

#[derive(Deserialize)]
struct TemplateMetadataItem {
    key: String,
    value: Option<String>,
}
// endregion

impl From<TemplateResource> for InstanceTemplate {
    fn from(resource: TemplateResource) -> Self {
        InstanceTemplate {
            name: resource.name,
            creation_timestamp: resource.creation_timestamp,
            metadata: resource
                .properties
                .metadata
                .items
                .into_iter()
                .map(|item| MetadataItem {
                    key: item.key,
                    value: item.value,
                })
                .collect(),
        }
    }
}

pub fn list_instance_templates(
    client: &Client,
    token: &str,
    project: &str,
) -> anyhow::Result<Vec<InstanceTemplate>> {
    let url =
        format!("https://compute.googleapis.com/compute/v1/projects/{project}/global/instanceTemplates");

    let response = client
        .get(&url)
        .bearer_auth(token)
        .send()
        .context("Listing instance templates")?;

    let status = response.status();
    if !status.is_success() {
        bail!("instance template listing failed: {status}");
    }

    let list: TemplateList = response.json().context("Parsing instance template list")?;
    Ok(list.items.into_iter().map(InstanceTemplate::from).collect())
}
