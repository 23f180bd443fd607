use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;

use crate::assemble::{ClassifiedChapter, assemble};
use crate::cli::BuildArgs;
use crate::config::SiteConfig;
use crate::epub::CreateEpubOptions;
use crate::formats::TocDump;
use crate::http::Fetcher;
use crate::listing::{Chapter, ChapterStatus};

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let config = SiteConfig::from_args(&args.site).context("site config")?;
    let raw_url = match args.url {
        Some(url) => url,
        None => crate::prompt::work_url(config.host())?,
    };
    let url = config.validate_work_url(&raw_url)?;
    let fetcher = config.fetcher().context("build http client")?;

    tracing::info!(%url, "build: landing page");
    let work = crate::work::fetch(&fetcher, &url).context("landing page")?;
    tracing::info!(work_id = %work.id, title = %work.title, "found work");

    let out_path = args
        .out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate::epub::output_file_name(&work.title)));
    if out_path.exists() && !args.force {
        anyhow::bail!("epub output already exists: {}", out_path.display());
    }

    let cover = match &work.cover_url {
        Some(cover_url) => {
            tracing::info!(%cover_url, "build: cover");
            Some(crate::work::fetch_cover(&fetcher, cover_url).context("cover image")?)
        }
        None => {
            tracing::warn!("landing page has no cover image");
            None
        }
    };

    tracing::info!(work_id = %work.id, "build: chapters");
    let chapters = crate::listing::list(&fetcher, &config, &work.id)
        .context("chapter listing")?
        .enumerate()
        .map(|(index, chapter)| fetch_chapter(&fetcher, &config, index, chapter))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let book = assemble(work, chapters);
    tracing::info!(
        chapters = book.chapter_count(),
        sections = book.toc.len(),
        "build: assembled"
    );

    if let Some(toc_out) = &args.toc_out {
        let yaml = serde_yaml::to_string(&TocDump::from(&book)).context("serialize toc yaml")?;
        std::fs::write(toc_out, yaml).with_context(|| format!("write toc: {toc_out}"))?;
    }

    tracing::info!(out = %out_path.display(), "build: epub");
    crate::epub::write_epub(
        &book,
        cover.as_ref(),
        &out_path,
        &CreateEpubOptions {
            force: args.force,
            lang: args.lang,
        },
    )
    .context("write epub")?;

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", out_path.display()).context("write stdout")?;
    Ok(())
}

fn fetch_chapter(
    fetcher: &Fetcher,
    config: &SiteConfig,
    index: usize,
    mut chapter: Chapter,
) -> anyhow::Result<ClassifiedChapter> {
    if chapter.status == ChapterStatus::Locked {
        tracing::warn!(index, link = %chapter.link, "chapter is marked locked");
    }

    let location = crate::resolve::resolve(fetcher, &chapter.link, &config.link_rel)
        .with_context(|| format!("chapter {index}"))?;
    let content = crate::content::fetch(fetcher, &location)
        .with_context(|| format!("chapter {index}"))?;
    chapter.fill(content);

    let classified = ClassifiedChapter::new(index, chapter);
    tracing::info!(
        index,
        volume = classified.classification.volume_key().number(),
        heading = %classified.heading(),
        "chapter"
    );
    Ok(classified)
}
