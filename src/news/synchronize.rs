use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::core::block::{Block, Page};
use crate::core::template::HEADING_MARKER;
use crate::core::week::{WeekRange, format_date};
use crate::error::NewsError;
use crate::host::DocumentHost;

/// First page reference of a heading: `[[Sat]]` or `[[Sat, 07.01.2024]]`.
static DAY_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[(?P<day>\w+)(?:,[^\]]*)?\]\]").unwrap()
});

/// Which blocks count as day headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRules {
    /// Blocks containing this text are never dated.
    pub undated_marker: String,
    /// Only blocks containing the `###` heading marker are dated.
    pub require_heading_marker: bool,
}

impl Default for SyncRules {
    fn default() -> Self {
        Self {
            undated_marker: "Good News".to_string(),
            require_heading_marker: true,
        }
    }
}

/// A pending heading update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub uuid: Uuid,
    pub content: String,
    pub date: NaiveDate,
}

/// Replace the first day reference in `content` with one dated `date`.
/// Returns `None` when the content has no day reference.
pub fn rewrite_day_heading(content: &str, date: NaiveDate) -> Option<String> {
    let caps = DAY_TOKEN_RE.captures(content)?;
    let whole = caps.get(0)?;
    let replacement = format!("[[{}, {}]]", &caps["day"], format_date(date));

    let mut out = String::with_capacity(content.len() + 12);
    out.push_str(&content[..whole.start()]);
    out.push_str(&replacement);
    out.push_str(&content[whole.end()..]);
    Some(out)
}

fn day_name(content: &str) -> Option<&str> {
    DAY_TOKEN_RE
        .captures(content)
        .and_then(|caps| caps.name("day"))
        .map(|m| m.as_str())
}

/// The blocks holding the day headings: the root block's children, or the
/// page's top-level blocks when the root has none.
pub fn day_blocks<'a>(tree: &'a [Block], page_name: &str) -> Result<&'a [Block], NewsError> {
    let root = tree
        .first()
        .ok_or_else(|| NewsError::EmptyTree(page_name.to_string()))?;
    if root.children.is_empty() {
        log::debug!("{} has no nested days, scanning top-level blocks", page_name);
        Ok(tree)
    } else {
        Ok(&root.children)
    }
}

/// Work out every heading update for a week ending on `end`.
///
/// Days are listed newest first, so the n-th dated block gets `end - n`.
/// Nothing is written here; any error leaves the page as it was.
pub fn plan_rewrites(
    days: &[Block],
    end: NaiveDate,
    rules: &SyncRules,
) -> Result<Vec<Rewrite>, NewsError> {
    let mut rewrites = Vec::new();
    let mut index: i64 = 0;

    for block in days {
        let content = block.content.as_str();
        if block.is_page_root() {
            continue;
        }
        if content.is_empty() {
            return Err(NewsError::MissingContent(block.uuid));
        }
        if content.contains(rules.undated_marker.as_str()) {
            continue;
        }
        if rules.require_heading_marker && !content.contains(HEADING_MARKER) {
            log::debug!("Skipping non-heading block {}", block.uuid);
            continue;
        }

        let date = end - chrono::Duration::days(index);
        let label = format_date(date);
        if content.contains(&label) {
            return Err(NewsError::AlreadySynchronized {
                uuid: block.uuid,
                date: label,
            });
        }
        let Some(rewritten) = rewrite_day_heading(content, date) else {
            log::debug!("Skipping heading without day reference {}", block.uuid);
            continue;
        };

        let expected_day = date.format("%a").to_string();
        let misnamed = day_name(content)
            .filter(|name| name.len() == 3 && !name.eq_ignore_ascii_case(&expected_day));
        if let Some(name) = misnamed {
            log::warn!(
                "Block {} reads {} but falls on {} ({})",
                block.uuid,
                name,
                expected_day,
                label
            );
        }

        rewrites.push(Rewrite {
            uuid: block.uuid,
            content: rewritten,
            date,
        });
        index += 1;
    }

    Ok(rewrites)
}

/// Write the calendar date of each day heading on `page`.
///
/// The week is read from the page name. Every block is checked before the
/// first write, so `AlreadySynchronized` or `MissingContent` leave the page
/// unchanged. A host failure during the writes is not rolled back.
pub async fn synchronize_dates<H: DocumentHost>(
    host: &H,
    page: &Page,
    rules: &SyncRules,
) -> Result<usize, NewsError> {
    let week = WeekRange::from_page_name(&page.name)
        .ok_or_else(|| NewsError::MalformedPageName(page.name.clone()))?;
    let tree = host.page_blocks_tree(page.uuid).await?;
    let days = day_blocks(&tree, &page.name)?;
    let rewrites = plan_rewrites(days, week.end, rules)?;

    for rewrite in &rewrites {
        log::debug!("Dating block {} as {}", rewrite.uuid, rewrite.date);
        host.update_block(rewrite.uuid, &rewrite.content, None).await?;
    }

    log::info!("Synchronized {} day headings on {}", rewrites.len(), page.name);
    Ok(rewrites.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::TemplateConfig;
    use crate::host::CreatePageOptions;
    use crate::news::instantiate::{get_or_create_page, instantiate_template};
    use crate::workspace::Workspace;

    const WEEK: &str = "07.01.2024 - 13.01.2024";
    const UNDATED: [&str; 8] = [
        "### **[[Good News]]**",
        "### **[[Sat]]**",
        "### **[[Fri]]**",
        "### **[[Thu]]**",
        "### **[[Wed]]**",
        "### **[[Tue]]**",
        "### **[[Mon]]**",
        "### **[[Sun]]**",
    ];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn nested_page(ws: &Workspace, headings: &[&str]) -> Page {
        let page = ws
            .create_page(WEEK, Vec::new(), CreatePageOptions::default())
            .await
            .unwrap()
            .unwrap();
        let root = ws
            .append_block_in_page(page.uuid, "", vec![("page-type".to_string(), "news".to_string())])
            .await
            .unwrap()
            .unwrap();
        for heading in headings {
            ws.insert_child_block(root.uuid, heading, Vec::new()).await.unwrap();
        }
        page
    }

    async fn contents(ws: &Workspace, page: &Page) -> Vec<String> {
        let tree = ws.page_blocks_tree(page.uuid).await.unwrap();
        let days = day_blocks(&tree, &page.name).unwrap();
        days.iter().map(|b| b.content.clone()).collect()
    }

    #[test]
    fn rewrite_replaces_only_first_reference() {
        let d = date(2024, 1, 13);
        assert_eq!(
            rewrite_day_heading("### **[[Sat]]** see [[Fri]]", d).unwrap(),
            "### **[[Sat, 13.01.2024]]** see [[Fri]]"
        );
        assert_eq!(
            rewrite_day_heading("### **[[Sat, 06.01.2024]]**", d).unwrap(),
            "### **[[Sat, 13.01.2024]]**"
        );
        assert!(rewrite_day_heading("### plain heading", d).is_none());
    }

    #[tokio::test]
    async fn dates_run_backwards_from_saturday() {
        let ws = Workspace::new();
        let page = nested_page(&ws, &UNDATED).await;

        let count = synchronize_dates(&ws, &page, &SyncRules::default()).await.unwrap();
        assert_eq!(count, 7);
        assert_eq!(
            contents(&ws, &page).await,
            [
                "### **[[Good News]]**",
                "### **[[Sat, 13.01.2024]]**",
                "### **[[Fri, 12.01.2024]]**",
                "### **[[Thu, 11.01.2024]]**",
                "### **[[Wed, 10.01.2024]]**",
                "### **[[Tue, 09.01.2024]]**",
                "### **[[Mon, 08.01.2024]]**",
                "### **[[Sun, 07.01.2024]]**",
            ]
        );
    }

    #[tokio::test]
    async fn second_run_reports_already_synchronized() {
        let ws = Workspace::new();
        let page = nested_page(&ws, &UNDATED).await;
        synchronize_dates(&ws, &page, &SyncRules::default()).await.unwrap();
        let after_first = contents(&ws, &page).await;

        let err = synchronize_dates(&ws, &page, &SyncRules::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NewsError::AlreadySynchronized { ref date, .. } if date == "13.01.2024"));
        assert_eq!(contents(&ws, &page).await, after_first);
    }

    #[tokio::test]
    async fn stale_dates_are_moved_to_page_week() {
        let ws = Workspace::new();
        let page = nested_page(&ws, &["### **[[Sat, 06.01.2024]]**", "### **[[Fri, 05.01.2024]]**"]).await;
        synchronize_dates(&ws, &page, &SyncRules::default()).await.unwrap();
        assert_eq!(
            contents(&ws, &page).await,
            ["### **[[Sat, 13.01.2024]]**", "### **[[Fri, 12.01.2024]]**"]
        );
    }

    #[tokio::test]
    async fn flat_page_is_scanned_when_root_has_no_children() {
        let ws = Workspace::new();
        let page = get_or_create_page(&ws, &WeekRange::containing(date(2024, 1, 7)))
            .await
            .unwrap();
        // Template written for the previous week so every heading is stale.
        instantiate_template(&ws, &page, &TemplateConfig::default(), date(2023, 12, 31))
            .await
            .unwrap();

        let count = synchronize_dates(&ws, &page, &SyncRules::default()).await.unwrap();
        assert_eq!(count, 7);
        let tree = ws.page_blocks_tree(page.uuid).await.unwrap();
        assert!(tree[0].is_page_root());
        assert_eq!(tree[0].content, "");
        assert_eq!(tree[1].content, "### **[[Good News]]**");
        assert_eq!(tree[2].content, "### **[[Sat, 13.01.2024]]**");
        assert_eq!(tree[8].content, "### **[[Sun, 07.01.2024]]**");
        assert_eq!(tree[2].property("background-color"), Some("yellow"));
    }

    #[tokio::test]
    async fn non_headings_are_skipped_without_consuming_a_day() {
        let ws = Workspace::new();
        let page = nested_page(&ws, &["### **[[Sat]]**", "a loose note", "### **[[Fri]]**"]).await;
        assert_eq!(synchronize_dates(&ws, &page, &SyncRules::default()).await.unwrap(), 2);
        assert_eq!(
            contents(&ws, &page).await,
            ["### **[[Sat, 13.01.2024]]**", "a loose note", "### **[[Fri, 12.01.2024]]**"]
        );

        let lenient = SyncRules {
            require_heading_marker: false,
            ..SyncRules::default()
        };
        let page_days = ws.page_blocks_tree(page.uuid).await.unwrap();
        let plan = plan_rewrites(&page_days[0].children, date(2024, 1, 20), &lenient).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].date, date(2024, 1, 19));
    }

    #[tokio::test]
    async fn empty_day_block_aborts_before_any_write() {
        let ws = Workspace::new();
        let page = nested_page(&ws, &["### **[[Sat]]**", "### **[[Fri]]**"]).await;
        let tree = ws.page_blocks_tree(page.uuid).await.unwrap();
        let root = tree[0].uuid;
        let empty = ws.insert_child_block(root, "", Vec::new()).await.unwrap().unwrap();

        let err = synchronize_dates(&ws, &page, &SyncRules::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NewsError::MissingContent(uuid) if uuid == empty.uuid));
        assert_eq!(contents(&ws, &page).await, ["### **[[Sat]]**", "### **[[Fri]]**", ""]);
    }

    #[tokio::test]
    async fn whitespace_block_is_skipped_not_missing() {
        let ws = Workspace::new();
        let page = nested_page(&ws, &["### **[[Sat]]**", "  ", "### **[[Fri]]**"]).await;
        assert_eq!(synchronize_dates(&ws, &page, &SyncRules::default()).await.unwrap(), 2);
        assert_eq!(
            contents(&ws, &page).await,
            ["### **[[Sat, 13.01.2024]]**", "  ", "### **[[Fri, 12.01.2024]]**"]
        );
    }

    #[tokio::test]
    async fn empty_page_and_bad_names_are_errors() {
        let ws = Workspace::new();
        let page = ws
            .create_page(WEEK, Vec::new(), CreatePageOptions::default())
            .await
            .unwrap()
            .unwrap();
        let err = synchronize_dates(&ws, &page, &SyncRules::default()).await.unwrap_err();
        assert!(matches!(err, NewsError::EmptyTree(_)));

        let inbox = ws
            .create_page("Inbox", Vec::new(), CreatePageOptions::default())
            .await
            .unwrap()
            .unwrap();
        let err = synchronize_dates(&ws, &inbox, &SyncRules::default()).await.unwrap_err();
        assert!(matches!(err, NewsError::MalformedPageName(name) if name == "Inbox"));
    }
}
