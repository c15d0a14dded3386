//! Per-invocation rendering session: who is rendering and how images resolve.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use mtg_blocks::{ImageLookup, ImageRef, NullImageLookup};
use mtg_client::ApiClient;
use mtg_config::{CliSettings, Config, GraphSize};

use crate::error::CliError;
use crate::output::Output;

/// Arguments shared by commands that extract graph blocks.
#[derive(Args)]
pub(crate) struct SessionArgs {
    /// Id of the document author (enables resolving the author's images).
    #[arg(long)]
    author: Option<String>,

    /// Id of the current user (overrides config).
    #[arg(long, env = "MTGDOCS_USER")]
    user: Option<String>,

    /// Image API base URL (overrides config).
    #[arg(long, env = "MTGDOCS_API_URL")]
    api_url: Option<String>,

    /// Do not contact the image API.
    #[arg(long)]
    offline: bool,

    /// Path to configuration file (default: auto-discover mtgdocs.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl SessionArgs {
    /// Load configuration with CLI overrides applied.
    pub(crate) fn load_config(&self, graph_size: Option<GraphSize>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            user_id: self.user.clone(),
            api_url: self.api_url.clone(),
            graph_size,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Everything an extraction pass needs besides the shared cache.
pub(crate) struct Session {
    pub(crate) user_id: String,
    pub(crate) author_id: Option<String>,
    pub(crate) own_images: Vec<ImageRef>,
    client: Option<ApiClient>,
}

impl Session {
    /// Open a session from configuration.
    ///
    /// Own images come from the configured manifest, else from the API (when
    /// configured and not offline), else the list is empty.
    pub(crate) fn open(
        args: &SessionArgs,
        config: &Config,
        output: &Output,
    ) -> Result<Self, CliError> {
        let user_id = config.session_resolved.user_id.clone().ok_or_else(|| {
            output.error("Error: user id required");
            output.info("\nPass --user, set MTGDOCS_USER, or add to mtgdocs.toml:");
            output.info("\n[session]");
            output.info(r#"user_id = "your-user-id""#);
            CliError::Validation("user id required".to_owned())
        })?;

        let client = if args.offline {
            None
        } else {
            config.api.as_ref().map(|api| {
                ApiClient::new(
                    &api.base_url,
                    api.token.clone(),
                    Duration::from_secs(api.timeout_secs),
                )
            })
        };

        let own_images = match (&config.session_resolved.images_manifest, &client) {
            (Some(manifest), _) => load_manifest(manifest)?,
            (None, Some(client)) => client.list_own_images()?,
            (None, None) => {
                tracing::info!("No image manifest or API configured, own images empty");
                Vec::new()
            }
        };

        Ok(Self {
            user_id,
            author_id: args.author.clone(),
            own_images,
            client,
        })
    }

    /// Fallback lookup for images outside the user's own set.
    pub(crate) fn lookup(&self) -> &dyn ImageLookup {
        match &self.client {
            Some(client) => client as &dyn ImageLookup,
            None => &NullImageLookup,
        }
    }
}

/// Read a JSON array of images.
fn load_manifest(path: &Path) -> Result<Vec<ImageRef>, CliError> {
    let content = std::fs::read_to_string(path)?;
    let images: Vec<ImageRef> = serde_json::from_str(&content)?;
    tracing::info!(path = %path.display(), count = images.len(), "Loaded image manifest");
    Ok(images)
}
