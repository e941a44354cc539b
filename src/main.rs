mod crawler;
mod extract;
mod fetch;
mod filter;
mod frontier;
mod kb;
mod merge;
mod retrieval;
mod validate;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;
use url::Url;

use crate::extract::article;
use crate::kb::KnowledgeBase;

#[derive(Parser)]
#[command(name = "kb_scraper", about = "Case-study knowledge base scraper and toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a site and save an auto-scraped knowledge base
    Crawl {
        /// Base URL of the site to crawl
        url: String,
        /// Page-visit budget
        #[arg(long, default_value_t = 30)]
        max_pages: usize,
        /// Link-follow depth budget
        #[arg(long, default_value_t = 3)]
        max_depth: u32,
        #[arg(short, long, default_value = "knowledge_base_auto.json")]
        output: PathBuf,
    },
    /// Scrape case-study detail pages into a flat case-study array
    Articles {
        /// URL list file (one per line, # for comments); discovery runs
        /// against --base-url when omitted
        #[arg(long)]
        from_file: Option<PathBuf>,
        /// Base URL for auto-discovery of detail links
        #[arg(long)]
        base_url: Option<String>,
        #[arg(short, long, default_value = "case_studies_scraped.json")]
        output: PathBuf,
    },
    /// Merge the manual and auto knowledge bases into one document
    Merge {
        #[arg(long, default_value = "knowledge_base.json")]
        manual: PathBuf,
        #[arg(long, default_value = "knowledge_base_auto.json")]
        auto: PathBuf,
        #[arg(short, long, default_value = "knowledge_base_merged.json")]
        output: PathBuf,
    },
    /// Append scraped case studies into a knowledge base with URL dedup
    Append {
        #[arg(long, default_value = "knowledge_base.json")]
        kb: PathBuf,
        #[arg(long, default_value = "case_studies_scraped.json")]
        scraped: PathBuf,
    },
    /// Filter low-quality case studies in place, with automatic backup
    Filter {
        #[arg(long, default_value = "knowledge_base.json")]
        kb: PathBuf,
        /// Minimum quality case studies; curated fallbacks top up the rest
        #[arg(long, default_value_t = 5)]
        min_quality: usize,
    },
    /// Validate a knowledge base document and print a pass/fail report
    Validate {
        #[arg(long, default_value = "knowledge_base_auto.json")]
        file: PathBuf,
    },
    /// Export retrieval documents (text blob + metadata) as JSONL
    Export {
        #[arg(long, default_value = "knowledge_base.json")]
        kb: PathBuf,
        #[arg(short, long, default_value = "retrieval_documents.jsonl")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Crawl {
            url,
            max_pages,
            max_depth,
            output,
        } => run_crawl(&url, max_pages, max_depth, &output).await,
        Commands::Articles {
            from_file,
            base_url,
            output,
        } => run_articles(from_file.as_deref(), base_url.as_deref(), &output).await,
        Commands::Merge {
            manual,
            auto,
            output,
        } => run_merge(&manual, &auto, &output),
        Commands::Append { kb, scraped } => run_append(&kb, &scraped),
        Commands::Filter { kb, min_quality } => run_filter(&kb, min_quality),
        Commands::Validate { file } => run_validate(&file),
        Commands::Export { kb, output } => {
            let document = KnowledgeBase::load(&kb)?;
            let count = retrieval::export_jsonl(&document, &output)?;
            println!("Exported {count} retrieval documents to {}", output.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_crawl(
    url: &str,
    max_pages: usize,
    max_depth: u32,
    output: &Path,
) -> anyhow::Result<()> {
    let crawler = crawler::Crawler::new(url, max_pages, max_depth)?;

    // Partial results are always persisted on interruption.
    let shutdown = crawler.shutdown_handle();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        warn!("Interrupt received; saving partial results after current page");
        shutdown.store(true, Ordering::SeqCst);
    });

    let outcome = crawler.crawl().await;
    outcome.knowledge_base.save(output)?;

    let kb = &outcome.knowledge_base;
    print_rule();
    println!("CRAWL SUMMARY");
    print_rule();
    println!("Pages visited:  {}", outcome.pages_visited);
    println!("Case studies:   {}", kb.case_studies.len());
    println!("Services:       {}", kb.services.len());
    println!("Technologies:   {}", kb.technologies.len());
    println!("Industries:     {}", kb.industries.len());

    if let Some(first) = kb.case_studies.first() {
        println!("\nSample case study:");
        println!("  Client:       {}", first.client_name);
        println!("  Industry:     {}", first.industry);
        println!("  Problem:      {}...", truncate(&first.problem, 100));
        println!(
            "  Technologies: {}",
            first.technologies.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
        );
    }

    println!("\nSaved to: {}", output.display());
    print_rule();
    Ok(())
}

async fn run_articles(
    from_file: Option<&Path>,
    base_url: Option<&str>,
    output: &Path,
) -> anyhow::Result<()> {
    let fetcher = fetch::Fetcher::new()?;

    let urls = match from_file {
        Some(path) => article::load_urls_from_file(path)?,
        None => {
            let base_url =
                base_url.context("--base-url is required when --from-file is not given")?;
            let base = Url::parse(base_url)
                .with_context(|| format!("Invalid base URL: {base_url}"))?;
            article::discover_case_study_urls(&fetcher, &base).await
        }
    };

    if urls.is_empty() {
        println!("No case study URLs to scrape.");
        return Ok(());
    }

    println!("Scraping {} case study pages...", urls.len());
    let case_studies = article::scrape_articles(&fetcher, &urls).await;
    kb::save_case_study_array(&case_studies, output)?;

    print_rule();
    println!("ARTICLE SCRAPE SUMMARY");
    print_rule();
    println!("Extracted {}/{} case studies", case_studies.len(), urls.len());
    for cs in &case_studies {
        println!("\n  #{} {} ({})", cs.id, cs.client_name, cs.industry);
        println!("    Problem:  {}...", truncate(&cs.problem, 80));
        println!("    Solution: {}...", truncate(&cs.solution, 80));
    }
    println!("\nSaved to: {}", output.display());
    print_rule();
    Ok(())
}

fn run_merge(manual: &Path, auto: &Path, output: &Path) -> anyhow::Result<()> {
    let manual_kb = kb::load_lenient(manual);
    let auto_kb = kb::load_lenient(auto);
    let manual_count = manual_kb.as_ref().map_or(0, |k| k.case_studies.len());
    let auto_count = auto_kb.as_ref().map_or(0, |k| k.case_studies.len());

    let merged = merge::merge(manual_kb.as_ref(), auto_kb.as_ref())?;
    merged.kb.save(output)?;

    print_rule();
    println!("MERGE SUMMARY");
    print_rule();
    println!("Case studies:  {manual_count} manual + {auto_count} auto = {}", merged.kb.case_studies.len());
    println!(
        "Services:      {} unique ({} duplicates removed)",
        merged.kb.services.len(),
        merged.duplicate_services
    );
    println!(
        "Technologies:  {} unique ({} duplicates removed)",
        merged.kb.technologies.len(),
        merged.duplicate_technologies
    );
    println!(
        "Industries:    {} unique ({} duplicates removed)",
        merged.kb.industries.len(),
        merged.duplicate_industries
    );
    println!("\nSaved to: {}", output.display());
    print_rule();
    Ok(())
}

fn run_append(kb_path: &Path, scraped_path: &Path) -> anyhow::Result<()> {
    let mut target = KnowledgeBase::load(kb_path)?;
    let scraped = kb::load_case_study_array(scraped_path)?;

    let outcome = merge::append_case_studies(&mut target, scraped);

    if outcome.added > 0 {
        kb::backup_file(kb_path, &backup_path(kb_path))?;
        target.save(kb_path)?;
    }

    print_rule();
    println!("APPEND SUMMARY");
    print_rule();
    println!("Added:                {}", outcome.added);
    println!("Skipped (duplicates): {}", outcome.skipped);
    println!("Total case studies:   {}", outcome.total);
    print_rule();
    Ok(())
}

fn run_filter(kb_path: &Path, min_quality: usize) -> anyhow::Result<()> {
    let document = KnowledgeBase::load(kb_path)?;
    kb::backup_file(kb_path, &backup_path(kb_path))?;

    let original_count = document.case_studies.len();
    let outcome = filter::filter_case_studies(&document, min_quality);

    let mut updated = document;
    updated.case_studies = outcome.kept;
    updated.save(kb_path)?;

    print_rule();
    println!("QUALITY FILTER SUMMARY");
    print_rule();
    println!("Original case studies: {original_count}");
    println!("Filtered (low quality): {}", outcome.rejected.len());
    println!("Fallbacks added:        {}", outcome.fallback_added);
    println!("Final case studies:     {}", updated.case_studies.len());

    if !outcome.rejected.is_empty() {
        println!("\nSample filtered cases (first 5):");
        for (cs, reason) in outcome.rejected.iter().take(5) {
            println!("  - #{} {}: {reason}", cs.id, cs.client_name);
        }
    }
    print_rule();
    Ok(())
}

fn run_validate(file: &Path) -> anyhow::Result<()> {
    let report = validate::validate_file(file)?;

    print_rule();
    println!("VALIDATION REPORT");
    print_rule();
    println!("Case studies: {}", report.case_study_count);
    println!("Services:     {}", report.service_count);
    println!("Technologies: {}", report.technology_count);
    println!("Industries:   {}", report.industry_count);

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in report.warnings.iter().take(10) {
            println!("  - {warning}");
        }
        if report.warnings.len() > 10 {
            println!("  ... and {} more warnings", report.warnings.len() - 10);
        }
    }

    if !report.errors.is_empty() {
        println!("\nErrors ({}):", report.errors.len());
        for error in &report.errors {
            println!("  - {error}");
        }
    }

    print_rule();
    if report.passed() {
        println!("VALIDATION PASSED");
        Ok(())
    } else {
        println!("VALIDATION FAILED");
        anyhow::bail!("Validation failed for {}", file.display())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("knowledge_base");
    path.with_file_name(format!("{stem}_backup.json"))
}

fn print_rule() {
    println!("{}", "=".repeat(70));
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
