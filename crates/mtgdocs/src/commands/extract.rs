//! `mtgdocs extract` command implementation.

use std::path::PathBuf;

use clap::Args;
use mtg_blocks::{GraphBlockExtractor, SharedImageCache};

use super::session::{Session, SessionArgs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the extract command.
#[derive(Args)]
pub(crate) struct ExtractArgs {
    /// Markdown document to extract graph blocks from.
    file: PathBuf,

    #[command(flatten)]
    session: SessionArgs,

    /// Enable verbose output (show lookup and cache logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ExtractArgs {
    /// Execute the extract command.
    ///
    /// Prints the placeholder body and parsed blocks as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, image listing, or file I/O fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.session.load_config(None)?;
        let session = Session::open(&self.session, &config, &output)?;

        let content = std::fs::read_to_string(&self.file)?;
        let cache = SharedImageCache::new();
        let extracted = GraphBlockExtractor::new(
            &session.user_id,
            &session.own_images,
            &cache,
            session.lookup(),
        )
        .with_author(session.author_id.as_deref())
        .extract(&content);

        output.result(&serde_json::to_string_pretty(&extracted)?)?;
        output.info(&format!(
            "{}: {} graph block(s), {} unresolved image(s), {} cached lookup(s)",
            self.file.display(),
            extracted.blocks.len(),
            extracted.unknown_graph_count(),
            cache.len()
        ));
        Ok(())
    }
}
