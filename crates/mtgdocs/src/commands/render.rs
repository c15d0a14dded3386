//! `mtgdocs render` command implementation.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::Args;
use mtg_blocks::{GraphBlockExtractor, SharedImageCache};
use mtg_config::GraphSize;
use mtg_renderer::{DocumentRenderer, RenderResult, escape_html};

use super::session::{Session, SessionArgs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown documents to render.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory for `<name>.html` output (default: print to stdout).
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Graph image size (overrides config).
    #[arg(long)]
    graph_size: Option<GraphSize>,

    #[command(flatten)]
    session: SessionArgs,

    /// Enable verbose output (show lookup and cache logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, image listing, or file I/O fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.session.load_config(self.graph_size)?;
        let session = Session::open(&self.session, &config, &output)?;

        if let Some(out_dir) = &self.out_dir {
            std::fs::create_dir_all(out_dir)?;
        }

        // One cache for every file so images fetched once are reused.
        let cache = SharedImageCache::new();
        let renderer = DocumentRenderer::from_config(&config.render).with_title_extraction();

        for file in &self.files {
            let content = std::fs::read_to_string(file)?;
            let extracted = GraphBlockExtractor::new(
                &session.user_id,
                &session.own_images,
                &cache,
                session.lookup(),
            )
            .with_author(session.author_id.as_deref())
            .extract(&content);

            let result = renderer.render(&extracted);
            for warning in &result.warnings {
                output.warning(&format!("{}: {warning}", file.display()));
            }

            output.info(&format!(
                "{}: {} graph block(s), {} rendered, {} unresolved image(s)",
                file.display(),
                extracted.blocks.len(),
                result.blocks,
                extracted.unknown_graph_count()
            ));

            match &self.out_dir {
                Some(out_dir) => {
                    let target = output_path(out_dir, file);
                    std::fs::write(&target, html_document(&result, file))?;
                    output.success(&format!("Wrote {}", target.display()));
                }
                None => output.result(&result.html)?,
            }
        }

        output.info(&format!("Image cache: {} entries", cache.len()));
        Ok(())
    }
}

/// `<out_dir>/<file stem>.html`.
fn output_path(out_dir: &Path, file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map_or_else(|| "index".into(), |s| s.to_string_lossy());
    out_dir.join(format!("{stem}.html"))
}

/// Wrap rendered HTML in a standalone document.
fn html_document(result: &RenderResult, file: &Path) -> String {
    let title = result.title.clone().unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut doc = String::with_capacity(result.html.len() + 256);
    doc.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(doc, "<title>{}</title>", escape_html(&title));
    doc.push_str("</head>\n<body>\n");
    doc.push_str(&result.html);
    doc.push_str("</body>\n</html>\n");
    doc
}
