use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::NewsWeekConfig;
use crate::core::block::Page;
use crate::core::week::{WeekOption, WeekRange, resolve_offset, week_options};
use crate::error::NewsError;
use crate::host::DocumentHost;
use crate::options::{SelectionState, ToolOption, validate};

use super::instantiate::{
    TemplateOutcome, clone_template, find_page, get_or_create_page, instantiate_template,
};
use super::synchronize::synchronize_dates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Rewritten(usize),
    /// Every heading already carried its date; nothing was written.
    AlreadySynchronized,
}

/// Result of [`NewsWeek::create_or_update_news_week`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsWeekReport {
    pub page: Page,
    pub range: WeekRange,
    pub template: TemplateOutcome,
    pub sync: SyncOutcome,
}

/// What one toolbar option did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    NewsWeek(NewsWeekReport),
    DatesFixed { page: Page, rewritten: usize },
    Topics,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the weekly news page workflow against a host.
pub struct NewsWeek<H> {
    host: H,
    config: NewsWeekConfig,
    today: Option<NaiveDate>,
    running: AtomicBool,
}

impl<H: DocumentHost> NewsWeek<H> {
    pub fn new(host: H, config: NewsWeekConfig) -> Self {
        Self {
            host,
            config,
            today: None,
            running: AtomicBool::new(false),
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn at(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &NewsWeekConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn week_options(&self) -> Vec<WeekOption> {
        week_options(self.today(), self.config.week_range)
    }

    fn week(&self, offset: i32) -> Result<WeekRange, NewsError> {
        resolve_offset(self.today(), offset).ok_or(NewsError::OffsetOutOfRange(offset))
    }

    /// Runs on one page must not overlap; a second start is refused.
    fn begin(&self) -> Result<RunGuard<'_>, NewsError> {
        self.running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| NewsError::Busy)?;
        Ok(RunGuard(&self.running))
    }

    /// Resolve the week `offset` weeks from today, make sure its page exists
    /// and is templated, then date its headings.
    ///
    /// A page whose headings are already dated is reported as
    /// [`SyncOutcome::AlreadySynchronized`]; all other errors are returned as is.
    pub async fn create_or_update_news_week(
        &self,
        offset: i32,
    ) -> Result<NewsWeekReport, NewsError> {
        let _guard = self.begin()?;
        let range = self.week(offset)?;
        log::info!("News week {} of {} (offset {})", range.week, range.year, offset);

        let page = get_or_create_page(&self.host, &range).await?;
        let template = match &self.config.template_page {
            Some(master) => clone_template(&self.host, &page, master, &self.config.template).await?,
            None => {
                instantiate_template(&self.host, &page, &self.config.template, range.start).await?
            }
        };

        let sync = match synchronize_dates(&self.host, &page, &self.config.sync_rules()).await {
            Ok(count) => SyncOutcome::Rewritten(count),
            Err(NewsError::AlreadySynchronized { uuid, date }) => {
                log::info!("{} already dated (block {} reads {})", page.name, uuid, date);
                SyncOutcome::AlreadySynchronized
            }
            Err(e) => return Err(e),
        };

        Ok(NewsWeekReport {
            page,
            range,
            template,
            sync,
        })
    }

    /// Re-date the headings of an existing week page.
    pub async fn fix_page_dates(&self, offset: i32) -> Result<(Page, usize), NewsError> {
        let _guard = self.begin()?;
        let range = self.week(offset)?;
        let page = find_page(&self.host, &range).await?;
        let count = synchronize_dates(&self.host, &page, &self.config.sync_rules()).await?;
        Ok((page, count))
    }

    /// Topic extraction is not available; this only records the request.
    pub async fn analyze_topics(&self, offset: i32) -> Result<(), NewsError> {
        let range = self.week(offset)?;
        log::info!("Topic analysis requested for {}, not available", range.page_name());
        Ok(())
    }

    /// Run every active option in table order, stopping at the first error.
    pub async fn run_selection(
        &self,
        selection: &SelectionState,
        offset: i32,
    ) -> Result<Vec<ActionOutcome>, NewsError> {
        validate(selection).map_err(|(a, b)| NewsError::IncompatibleOptions(a.id(), b.id()))?;

        let mut outcomes = Vec::with_capacity(selection.active().len());
        for option in selection.active() {
            log::debug!("Running {}", option.id());
            let outcome = match option {
                ToolOption::NewNews => {
                    ActionOutcome::NewsWeek(self.create_or_update_news_week(offset).await?)
                }
                ToolOption::DynamicTemplate => {
                    let (page, rewritten) = self.fix_page_dates(offset).await?;
                    ActionOutcome::DatesFixed { page, rewritten }
                }
                ToolOption::Topics => {
                    self.analyze_topics(offset).await?;
                    ActionOutcome::Topics
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Show `page` in the host after giving it time to re-render.
    pub async fn open_page(&self, page: &Page) -> Result<(), NewsError> {
        tokio::time::sleep(Duration::from_millis(self.config.navigate_delay_ms)).await;
        self.host.push_state("page", &page.name).await?;
        if let Some(first) = self.host.page_blocks_tree(page.uuid).await?.first() {
            self.host.select_block(first.uuid).await?;
        }
        Ok(())
    }
}
