use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_LINK_REL, DEFAULT_SITE_BASE};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every chapter of a work and write an EPUB.
    Build(BuildArgs),
    /// Print the chapter listing of a work as JSON lines.
    List(ListArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SiteArgs {
    /// Base URL of the source site.
    #[arg(long, default_value = DEFAULT_SITE_BASE)]
    pub site_base: String,

    /// `rel` of the `Link` header entry that points at a chapter's content API.
    #[arg(long, default_value = DEFAULT_LINK_REL)]
    pub link_rel: String,

    /// Per-request timeout (default: wait indefinitely).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Extra attempts for a request that failed in transport or with a 5xx status.
    #[arg(long, default_value_t = 0)]
    pub retries: u32,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Landing page URL of the work (prompted for when omitted).
    #[arg(long)]
    pub url: Option<String>,

    /// Output EPUB path (default: derived from the work title).
    #[arg(long)]
    pub out: Option<String>,

    /// Overwrite an existing output file.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Also write the assembled table of contents as YAML.
    #[arg(long)]
    pub toc_out: Option<String>,

    /// BCP-47 language tag for EPUB metadata.
    #[arg(long, default_value = "en")]
    pub lang: String,

    #[command(flatten)]
    pub site: SiteArgs,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Landing page URL of the work.
    #[arg(long)]
    pub url: String,

    #[command(flatten)]
    pub site: SiteArgs,
}
