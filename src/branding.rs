//! Keeps the favicon and logo in sync with `site_settings`.
//!
//! Polls start at the base interval and double after every poll that finds
//! nothing new (or fails), up to the ceiling. A change resets the interval.
//! Nothing is polled while the page is hidden.

use std::time::Duration;
use tokio::sync::watch;

use bilingual_cms_postgrest::SortOrder;

use crate::context::CmsContext;
use crate::error::Result;
use crate::models::{Branding, Entity, SiteSettings};
use crate::store::ListQuery;

/// Delay before the poll after one that took `current`.
pub fn next_delay(current: Duration, changed: bool, base: Duration, max: Duration) -> Duration {
    if changed {
        base
    } else {
        current.saturating_mul(2).min(max)
    }
}

pub struct BrandingRefresher {
    ctx: CmsContext,
    base: Duration,
    max: Duration,
    branding: watch::Sender<Option<Branding>>,
    visible: watch::Sender<bool>,
}

impl BrandingRefresher {
    pub fn new(ctx: CmsContext, base: Duration, max: Duration) -> Self {
        let (branding, _) = watch::channel(None);
        let (visible, _) = watch::channel(true);
        Self {
            ctx,
            base,
            max: max.max(base),
            branding,
            visible,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Branding>> {
        self.branding.subscribe()
    }

    pub fn current(&self) -> Option<Branding> {
        self.branding.borrow().clone()
    }

    /// Page visibility; polling pauses while hidden.
    pub fn set_visible(&self, visible: bool) {
        self.visible.send_replace(visible);
    }

    /// Fetch once and publish. Returns whether the branding changed.
    pub async fn poll_once(&self) -> Result<bool> {
        let (column, _) = SiteSettings::ORDER_BY;
        let query = ListQuery::new()
            .columns("logo_url,favicon_url")
            .order(column, SortOrder::Descending);
        let row = self.ctx.store.select_one(SiteSettings::TABLE, &query).await?;
        let branding = row
            .map(|row| Branding {
                logo_url: text(&row, "logo_url"),
                favicon_url: text(&row, "favicon_url"),
            })
            .unwrap_or_default();

        Ok(self.branding.send_if_modified(|current| {
            if current.as_ref() == Some(&branding) {
                false
            } else {
                *current = Some(branding);
                true
            }
        }))
    }

    /// Poll until `shutdown` turns true or its sender goes away.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut visible = self.visible.subscribe();
        let mut delay = self.base;

        loop {
            if *shutdown.borrow() {
                break;
            }
            if !*visible.borrow_and_update() {
                tracing::debug!("page hidden, branding refresh paused");
                tokio::select! {
                    res = visible.changed() => {
                        if res.is_err() {
                            break;
                        }
                    }
                    res = shutdown.changed() => {
                        if res.is_err() {
                            break;
                        }
                    }
                }
                continue;
            }

            let changed = match self.poll_once().await {
                Ok(changed) => changed,
                Err(err) => {
                    tracing::debug!(error = %err, "branding refresh failed");
                    false
                }
            };
            if changed {
                tracing::info!("branding updated");
            }
            delay = next_delay(delay, changed, self.base, self.max);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                res = shutdown.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("branding refresh stopped");
    }
}

fn text(row: &serde_json::Value, column: &str) -> Option<String> {
    row.get(column)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
