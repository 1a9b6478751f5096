//! CLI command handlers

use std::path::PathBuf;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::processors::export::{extract_workload, load_document, save_document, ExportProcessor};

/// Handle the export translation run
pub async fn handle_translate(
    input: PathBuf,
    output: PathBuf,
    target_lang: String,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    info!("Starting export translation");
    info!("Input: {}", input.display());
    info!("Output: {}", output.display());
    info!("Target language: {}", target_lang);

    // Fails fast when the credential is absent, before any file is touched
    let processor = ExportProcessor::from_env()?;

    let mut document = load_document(&input).await?;
    let workload = extract_workload(&document, processor.config())?;

    println!("📝 Found {} items to translate to {}.", workload.len(), target_lang);

    let batch_size = processor.config().batch_size;
    let total_batches = workload.len().div_ceil(batch_size);

    let pb = ProgressBar::new(total_batches as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut translated = 0;
    for batch in workload.items.chunks(batch_size) {
        pb.set_message(format!("{} items", batch.len()));
        translated += processor
            .process_batch(&mut document, batch, &workload.index, &target_lang)
            .await;
        pb.inc(1);
    }

    pb.finish_with_message("Completed");

    save_document(&output, &document).await?;

    let usage = processor.usage().report().await;
    let duration = start_time.elapsed();
    info!(
        "Completed: {}/{} items translated in {:?}",
        translated,
        workload.len(),
        duration
    );

    println!("\n✅ Translation to {} complete!", target_lang);
    println!("   Items: {}/{}", translated, workload.len());
    println!(
        "   Batches: {} succeeded, {} failed",
        usage.batches_succeeded, usage.batches_failed
    );
    println!(
        "   Tokens: {} ({} prompt, {} completion)",
        usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
    );
    println!("   Time: {:?}", duration);
    println!("💾 Saved to {}", output.display());

    Ok(())
}
