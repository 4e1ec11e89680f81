use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::briefing::BriefingWriter;
use crate::config::{AgencyProfile, PublishSettings};
use crate::digest::Digest;
use crate::llm::LanguageModel;
use crate::render::DigestRenderer;
use crate::slack::{build_payload, SlackClient};

/// The two files one run leaves in the output directory
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFiles {
    pub dated: PathBuf,
    pub index: PathBuf,
}

impl WrittenFiles {
    fn names(&self) -> Vec<&str> {
        [&self.dated, &self.index]
            .into_iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub deployed: bool,
    pub posted: bool,
}

pub fn dated_filename(date: DateTime<Utc>) -> String {
    format!("digest_{}.html", date.format("%Y-%m-%d"))
}

/// Write the page under its dated name and as `index.html`
pub fn write_outputs(dir: &Path, html: &str, date: DateTime<Utc>) -> Result<WrittenFiles> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let files = WrittenFiles {
        dated: dir.join(dated_filename(date)),
        index: dir.join("index.html"),
    };

    for path in [&files.dated, &files.index] {
        fs::write(path, html)
            .with_context(|| format!("Failed to write digest: {}", path.display()))?;
    }

    Ok(files)
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
    debug!("git -C {} {}", dir.display(), args.join(" "));

    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .await
        .with_context(|| format!("Failed to run git {}", args.first().unwrap_or(&"")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "git {} failed ({}): {}",
            args.join(" "),
            output.status,
            stderr.trim()
        );
    }

    Ok(())
}

/// Stage both files, commit, push
pub async fn commit_and_push(
    dir: &Path,
    files: &WrittenFiles,
    date: DateTime<Utc>,
    remote: &str,
    branch: &str,
) -> Result<()> {
    let mut add = vec!["add"];
    add.extend(files.names());
    run_git(dir, &add).await?;

    let message = format!("Digest {}", date.format("%Y-%m-%d"));
    run_git(dir, &["commit", "-m", message.as_str()]).await?;

    run_git(dir, &["push", remote, branch]).await?;
    Ok(())
}

/// The page counts as live once it serves 200 and shows today's date
pub fn page_is_live(status: u16, body: &str, date_str: &str) -> bool {
    status == 200 && body.contains(date_str)
}

/// Poll until the page is live or `timeout` passes. Request errors just mean "not yet".
pub async fn wait_for_deployment(
    page_url: &str,
    date_str: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<bool> {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")?;

    let start = Instant::now();
    while start.elapsed() < timeout {
        match client.get(page_url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                if page_is_live(status, &body, date_str) {
                    return Ok(true);
                }
                debug!("Page not live yet (HTTP {})", status);
            }
            Err(e) => debug!("Deployment poll failed: {}", e),
        }
        tokio::time::sleep(interval).await;
    }

    Ok(false)
}

/// Writes, pushes, waits for the deploy, then posts the briefing
pub struct Publisher<'a, M: LanguageModel + ?Sized> {
    settings: &'a PublishSettings,
    agency: &'a AgencyProfile,
    output_dir: PathBuf,
    briefing: BriefingWriter<'a, M>,
    slack: Option<SlackClient>,
}

impl<'a, M: LanguageModel + ?Sized> Publisher<'a, M> {
    pub fn new(
        settings: &'a PublishSettings,
        agency: &'a AgencyProfile,
        output_dir: PathBuf,
        model: &'a M,
        slack: Option<SlackClient>,
    ) -> Self {
        Self {
            settings,
            agency,
            output_dir,
            briefing: BriefingWriter::new(model, agency),
            slack,
        }
    }

    /// File and git failures are errors. Deployment timeouts and chat failures are not.
    pub async fn publish(&self, digest: &Digest, html: &str) -> Result<PublishReport> {
        let date = digest.generated_at;
        let mut report = PublishReport::default();

        let files = write_outputs(&self.output_dir, html, date)?;
        info!("Saved {} and index.html", dated_filename(date));

        commit_and_push(
            &self.output_dir,
            &files,
            date,
            &self.settings.remote,
            &self.settings.branch,
        )
        .await
        .context("Git publish failed")?;
        info!("Pushed to {}/{}", self.settings.remote, self.settings.branch);

        let Some(page_url) = self.settings.page_url.as_deref() else {
            warn!("No page_url configured, skipping deployment check and briefing");
            return Ok(report);
        };

        let date_str = DigestRenderer::display_date(date);
        report.deployed = wait_for_deployment(
            page_url,
            &date_str,
            Duration::from_secs(self.settings.deploy_timeout_secs),
            Duration::from_secs(self.settings.poll_interval_secs),
        )
        .await?;
        if report.deployed {
            info!("Page is live at {}", page_url);
        } else {
            warn!("Timed out waiting for {}, posting anyway", page_url);
        }

        let Some(slack) = &self.slack else {
            info!("No Slack webhook configured, skipping briefing");
            return Ok(report);
        };

        let briefing = self.briefing.generate(digest, page_url).await;
        let payload = build_payload(
            &self.agency.digest_title,
            &date_str,
            &briefing,
            digest.total_articles(),
            digest.industry_count(),
            page_url,
        );

        match slack.post(&payload).await {
            Ok(()) => {
                info!("Posted briefing to Slack");
                report.posted = true;
            }
            Err(e) => warn!("Slack post failed: {:#}", e),
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::fixtures::generated_at;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "industry-digest-test-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    // ==================== Output Tests ====================

    #[test]
    fn test_dated_filename() {
        assert_eq!(dated_filename(generated_at()), "digest_2026-10-16.html");
    }

    #[test]
    fn test_write_outputs_creates_both_files() {
        let dir = scratch_dir("write");
        let files = write_outputs(&dir, "<html>ok</html>", generated_at()).unwrap();

        assert_eq!(files.dated, dir.join("digest_2026-10-16.html"));
        assert_eq!(files.index, dir.join("index.html"));
        assert_eq!(fs::read_to_string(&files.dated).unwrap(), "<html>ok</html>");
        assert_eq!(fs::read_to_string(&files.index).unwrap(), "<html>ok</html>");
        assert_eq!(files.names(), vec!["digest_2026-10-16.html", "index.html"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_outputs_overwrites_index() {
        let dir = scratch_dir("overwrite");
        write_outputs(&dir, "old", generated_at()).unwrap();
        let files = write_outputs(&dir, "new", generated_at()).unwrap();
        assert_eq!(fs::read_to_string(&files.index).unwrap(), "new");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_outputs_fails_when_dir_is_a_file() {
        let dir = scratch_dir("blocked");
        fs::write(&dir, "not a directory").unwrap();
        assert!(write_outputs(&dir, "x", generated_at()).is_err());
        fs::remove_file(&dir).unwrap();
    }

    // ==================== Git Tests ====================

    #[tokio::test]
    async fn test_git_failure_is_an_error() {
        let dir = scratch_dir("missing-repo");
        let files = WrittenFiles {
            dated: dir.join("digest_2026-10-16.html"),
            index: dir.join("index.html"),
        };
        let result = commit_and_push(&dir, &files, generated_at(), "origin", "main").await;
        assert!(result.is_err());
    }

    // ==================== Deployment Tests ====================

    #[test]
    fn test_page_is_live_needs_status_and_date() {
        let date = "October 16, 2026";
        assert!(page_is_live(200, "<p>October 16, 2026</p>", date));
        assert!(!page_is_live(200, "<p>October 9, 2026</p>", date));
        assert!(!page_is_live(404, "October 16, 2026", date));
    }

    #[tokio::test]
    async fn test_wait_for_deployment_zero_timeout() {
        let live = wait_for_deployment(
            "http://127.0.0.1:9/",
            "October 16, 2026",
            Duration::ZERO,
            Duration::from_millis(1),
        )
        .await
        .unwrap();
        assert!(!live);
    }
}
