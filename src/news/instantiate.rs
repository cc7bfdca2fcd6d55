use chrono::NaiveDate;

use crate::core::block::{Block, Page, Properties, set_property};
use crate::core::template::{TEMPLATE_LINE_WORD, TemplateConfig, strip_template_lines};
use crate::core::week::WeekRange;
use crate::error::NewsError;
use crate::host::{CreatePageOptions, DocumentHost, HostError};

/// What [`instantiate_template`] or [`clone_template`] did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOutcome {
    /// Template written; counts every block created or filled in.
    Applied { blocks: usize },
    /// The page already carries the page-type marker; nothing was written.
    AlreadyTemplated,
}

/// A block to write, with children one level deep.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedBlock {
    content: String,
    properties: Properties,
    children: Vec<(String, Properties)>,
}

/// Look up the week page by name, creating it without a first block and
/// without navigating to it when missing.
pub async fn get_or_create_page<H: DocumentHost>(
    host: &H,
    range: &WeekRange,
) -> Result<Page, NewsError> {
    let name = range.page_name();
    if let Some(page) = host.get_page(&name).await? {
        log::debug!("Found news page {}", name);
        return Ok(page);
    }

    log::info!("Creating news page {}", name);
    host.create_page(&name, Vec::new(), CreatePageOptions::default())
        .await?
        .ok_or(NewsError::PageCreation(name))
}

/// Look up the week page by name without creating it.
pub async fn find_page<H: DocumentHost>(host: &H, range: &WeekRange) -> Result<Page, NewsError> {
    let name = range.page_name();
    host.get_page(&name)
        .await?
        .ok_or(NewsError::PageNotFound(name))
}

fn is_templated(blocks: &[Block]) -> bool {
    blocks.iter().any(Block::is_page_root)
}

/// Root block followed by one heading per descriptor, in declared order.
fn template_plan(template: &TemplateConfig, start: NaiveDate) -> Vec<PlannedBlock> {
    let week = WeekRange::containing(start);
    let root = PlannedBlock {
        content: String::new(),
        properties: template.properties.clone(),
        children: Vec::new(),
    };

    std::iter::once(root)
        .chain(template.days.iter().map(|day| {
            let date = day.day.map(|d| week.day_date(d));
            PlannedBlock {
                content: day.heading(date),
                properties: day.properties(),
                children: Vec::new(),
            }
        }))
        .collect()
}

fn without_template_keys(properties: &Properties) -> Properties {
    properties
        .iter()
        .filter(|(key, _)| !key.to_lowercase().contains(TEMPLATE_LINE_WORD))
        .cloned()
        .collect()
}

/// Copy of the master page's top-level blocks with authoring lines removed.
/// The first block becomes the page root and receives the page properties.
fn clone_plan(master: &[Block], template: &TemplateConfig) -> Vec<PlannedBlock> {
    let mut plan: Vec<PlannedBlock> = master
        .iter()
        .map(|block| PlannedBlock {
            content: strip_template_lines(&block.content),
            properties: without_template_keys(&block.properties),
            children: block
                .children
                .iter()
                .map(|child| (child.content.clone(), child.properties.clone()))
                .collect(),
        })
        .collect();

    if let Some(root) = plan.first_mut() {
        for (key, value) in &template.properties {
            if root.properties.iter().all(|(k, _)| k != key) {
                set_property(&mut root.properties, key, value);
            }
        }
    }
    plan
}

fn rejected(what: &str, page: &Page) -> NewsError {
    HostError::Rejected(format!("{} on page {}", what, page.name)).into()
}

async fn apply_plan<H: DocumentHost>(
    host: &H,
    page: &Page,
    first: Option<&Block>,
    plan: Vec<PlannedBlock>,
) -> Result<TemplateOutcome, NewsError> {
    let mut written = 0;
    let mut entries = plan.into_iter();
    let Some(root) = entries.next() else {
        return Ok(TemplateOutcome::Applied { blocks: 0 });
    };

    // A blank first block is reused as the root instead of leaving it behind.
    let root_uuid = match first.filter(|b| b.is_blank()) {
        Some(blank) => {
            host.update_block(blank.uuid, &root.content, Some(root.properties))
                .await?;
            blank.uuid
        }
        None => {
            host.prepend_block_in_page(page.uuid, &root.content, root.properties)
                .await?
                .ok_or_else(|| rejected("prepend", page))?
                .uuid
        }
    };
    written += 1;
    written += insert_children(host, page, root_uuid, root.children).await?;

    for entry in entries {
        let block = host
            .append_block_in_page(page.uuid, &entry.content, entry.properties)
            .await?
            .ok_or_else(|| rejected("append", page))?;
        written += 1;
        written += insert_children(host, page, block.uuid, entry.children).await?;
    }

    Ok(TemplateOutcome::Applied { blocks: written })
}

async fn insert_children<H: DocumentHost>(
    host: &H,
    page: &Page,
    parent: uuid::Uuid,
    children: Vec<(String, Properties)>,
) -> Result<usize, NewsError> {
    let count = children.len();
    for (content, properties) in children {
        host.insert_child_block(parent, &content, properties)
            .await?
            .ok_or_else(|| rejected("child insert", page))?;
    }
    Ok(count)
}

/// Write the static news template into `page`.
///
/// Day headings get the date of their weekday in the week of `start`. Pages
/// that already carry the page-type marker are left untouched.
pub async fn instantiate_template<H: DocumentHost>(
    host: &H,
    page: &Page,
    template: &TemplateConfig,
    start: NaiveDate,
) -> Result<TemplateOutcome, NewsError> {
    let existing = host.page_blocks_tree(page.uuid).await?;
    if is_templated(&existing) {
        log::warn!("Template already exists on {}", page.name);
        return Ok(TemplateOutcome::AlreadyTemplated);
    }

    let outcome = apply_plan(host, page, existing.first(), template_plan(template, start)).await?;
    log::info!("Applied news template to {}: {:?}", page.name, outcome);
    Ok(outcome)
}

/// Copy the master template page `master` into `page`.
///
/// Top-level blocks lose every line mentioning "template"; their immediate
/// children are copied as they are.
pub async fn clone_template<H: DocumentHost>(
    host: &H,
    page: &Page,
    master: &str,
    template: &TemplateConfig,
) -> Result<TemplateOutcome, NewsError> {
    let existing = host.page_blocks_tree(page.uuid).await?;
    if is_templated(&existing) {
        log::warn!("Template already exists on {}", page.name);
        return Ok(TemplateOutcome::AlreadyTemplated);
    }

    let master_page = host
        .get_page(master)
        .await?
        .ok_or_else(|| NewsError::MissingTemplate(master.to_string()))?;
    let master_blocks = host.page_blocks_tree(master_page.uuid).await?;
    if master_blocks.is_empty() {
        return Err(NewsError::EmptyTree(master.to_string()));
    }

    let plan = clone_plan(&master_blocks, template);
    let outcome = apply_plan(host, page, existing.first(), plan).await?;
    log::info!("Cloned {} into {}: {:?}", master, page.name, outcome);
    Ok(outcome)
}
