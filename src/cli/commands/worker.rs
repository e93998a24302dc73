//! Extraction worker command.

use console::style;

use themeharvest::config::Settings;
use themeharvest::queue::AmqpQueue;
use themeharvest::render::{HttpRenderer, PageRenderer};
use themeharvest::worker::ExtractionWorker;

/// Run an extraction worker until the broker closes the stream.
pub async fn cmd_worker(settings: &Settings, tag: Option<&str>) -> anyhow::Result<()> {
    // Competing consumers need distinct tags on the shared queue.
    let tag = tag.map(String::from).unwrap_or_else(|| {
        format!("harvest-worker-{}", uuid::Uuid::new_v4().simple())
    });

    let repos = settings.repositories();
    let renderer = make_renderer(settings).await?;

    let queue = AmqpQueue::connect(&settings.broker_url, &settings.queue_name).await?;
    let worker = ExtractionWorker::new(
        repos.configs.clone(),
        repos.datasets.clone(),
        repos.sources.clone(),
        repos.registry.clone(),
        renderer,
    );

    println!(
        "{} Worker {} consuming from {}",
        style("✓").green(),
        style(&tag).bold(),
        settings.queue_name
    );
    worker.run(&queue, &tag).await?;
    Ok(())
}

#[cfg(feature = "browser")]
async fn make_renderer(settings: &Settings) -> anyhow::Result<Box<dyn PageRenderer>> {
    use themeharvest::render::browser::BrowserRenderer;

    if settings.render_with_browser {
        let renderer = BrowserRenderer::launch(settings.render_wait_secs).await?;
        Ok(Box::new(renderer))
    } else {
        Ok(Box::new(HttpRenderer::new(
            &settings.user_agent,
            settings.request_timeout,
        )))
    }
}

#[cfg(not(feature = "browser"))]
async fn make_renderer(settings: &Settings) -> anyhow::Result<Box<dyn PageRenderer>> {
    if settings.render_with_browser {
        anyhow::bail!(
            "browser rendering requested but this build lacks the 'browser' feature"
        );
    }
    Ok(Box::new(HttpRenderer::new(
        &settings.user_agent,
        settings.request_timeout,
    )))
}
