//! The note workspace as seen by the news workflow.
//!
//! Every call may suspend; callers await each one before issuing the next,
//! since later steps read what earlier ones wrote.

use uuid::Uuid;

use crate::core::block::{Block, BlockId, Page, Properties};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("block not found: {0}")]
    BlockNotFound(Uuid),

    #[error("page not found: {0}")]
    PageNotFound(Uuid),

    #[error("host rejected {0}")]
    Rejected(String),

    #[error("workspace I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("workspace format: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options for [`DocumentHost::create_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePageOptions {
    pub format: String,
    pub create_first_block: bool,
    pub redirect: bool,
}

impl Default for CreatePageOptions {
    fn default() -> Self {
        Self {
            format: "markdown".to_string(),
            create_first_block: false,
            redirect: false,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait DocumentHost {
    async fn get_page(&self, name: &str) -> Result<Option<Page>, HostError>;

    /// Returns `None` when the host declined to create the page.
    async fn create_page(
        &self,
        name: &str,
        properties: Properties,
        options: CreatePageOptions,
    ) -> Result<Option<Page>, HostError>;

    /// Top-level blocks of a page in document order, children nested.
    async fn page_blocks_tree(&self, page: Uuid) -> Result<Vec<Block>, HostError>;

    /// Replace a block's content; `properties`, when given, replace its properties.
    async fn update_block(
        &self,
        block: Uuid,
        content: &str,
        properties: Option<Properties>,
    ) -> Result<(), HostError>;

    async fn append_block_in_page(
        &self,
        page: Uuid,
        content: &str,
        properties: Properties,
    ) -> Result<Option<Block>, HostError>;

    async fn prepend_block_in_page(
        &self,
        page: Uuid,
        content: &str,
        properties: Properties,
    ) -> Result<Option<Block>, HostError>;

    /// Append `content` as the last child of `parent`.
    async fn insert_child_block(
        &self,
        parent: Uuid,
        content: &str,
        properties: Properties,
    ) -> Result<Option<Block>, HostError>;

    /// Resolve a numeric back-reference (`parent`, `page`, `left`).
    async fn block_by_id(&self, id: BlockId) -> Result<Option<Block>, HostError>;

    async fn select_block(&self, block: Uuid) -> Result<(), HostError>;

    async fn push_state(&self, route: &str, name: &str) -> Result<(), HostError>;
}
