use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::Authenticator;
use crate::browser::BrowserSession;
use crate::config::Config;
use crate::extract::Extractor;
use crate::models::SearchTarget;
use crate::notify::{NotificationComposer, Notifier};

/// Settle delay after a search navigation; the result list renders client-side.
const RENDER_SETTLE: Duration = Duration::from_secs(2);

/// Runs the polling loop: one fresh authenticated browser session per cycle,
/// each target processed in configured order, fail-stop on the first error
/// that escapes a cycle. Restart-on-crash belongs to an external supervisor.
pub struct Orchestrator {
    config: Config,
    targets: Vec<SearchTarget>,
    authenticator: Authenticator,
    extractor: Extractor,
    composer: NotificationComposer,
    notifier: Box<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(config: Config, notifier: Box<dyn Notifier>) -> Self {
        let targets = config.search_targets();
        let authenticator = Authenticator::new(&config.crous_email, &config.crous_password);
        let composer = NotificationComposer::new(config.notify_when_no_results);

        Self {
            config,
            targets,
            authenticator,
            extractor: Extractor::new(),
            composer,
            notifier,
        }
    }

    pub async fn run(&self) -> Result<()> {
        loop {
            self.run_cycle().await.context("Polling cycle failed")?;

            info!(
                "Sleeping {}s before next check...",
                self.config.poll_interval_secs
            );
            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
        }
    }

    /// One cycle. The session is closed on every exit path before the outcome
    /// propagates, so the next cycle always starts from a clean state.
    async fn run_cycle(&self) -> Result<()> {
        let session =
            BrowserSession::launch(self.config.headless).context("Failed to acquire a browser session")?;

        let outcome = self.process_targets(&session).await;
        session.close();
        outcome
    }

    async fn process_targets(&self, session: &BrowserSession) -> Result<()> {
        self.authenticator
            .authenticate(session, &self.config.login_url)?;

        for target in &self.targets {
            info!("Handling configuration: {}", target.title);

            session.navigate(&target.search_url)?;
            tokio::time::sleep(RENDER_SETTLE).await;

            let html = session.page_html()?;
            debug!("Page HTML length: {}", html.len());

            let summary = self.extractor.extract(&target.search_url, &html);
            if let Ok(snapshot) = serde_json::to_string(&summary) {
                debug!("Extraction snapshot: {}", snapshot);
            }

            if let Some(notification) = self.composer.compose(target, &summary) {
                self.notifier
                    .send(&target.telegram_id, &notification.message)
                    .await
                    .with_context(|| format!("Failed to notify target {:?}", target.title))?;
                info!("Notification sent for {:?}", target.title);
            } else {
                info!("Nothing to send for {:?} this cycle", target.title);
            }
        }

        Ok(())
    }
}
