//! A local, single-user workspace stored as one JSON file.
//!
//! This is the host the command-line shell runs against; it keeps the same
//! page and block semantics the news workflow expects from a note app.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::core::block::{Block, BlockId, Page, Properties};
use crate::host::{CreatePageOptions, DocumentHost, HostError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPage {
    page: Page,
    blocks: Vec<Block>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkspaceState {
    next_id: BlockId,
    pages: Vec<StoredPage>,
    #[serde(skip)]
    route: Option<(String, String)>,
    #[serde(skip)]
    selected: Option<Uuid>,
}

impl WorkspaceState {
    fn allocate_id(&mut self) -> BlockId {
        self.next_id += 1;
        self.next_id
    }

    fn page_mut(&mut self, uuid: Uuid) -> Result<(Page, &mut Vec<Block>), HostError> {
        self.pages
            .iter_mut()
            .find(|p| p.page.uuid == uuid)
            .map(|p| (p.page.clone(), &mut p.blocks))
            .ok_or(HostError::PageNotFound(uuid))
    }

    fn new_block(&mut self, page: BlockId, content: &str, properties: Properties) -> Block {
        Block {
            id: self.allocate_id(),
            uuid: Uuid::new_v4(),
            content: content.to_string(),
            properties,
            children: Vec::new(),
            parent: None,
            page,
            left: None,
        }
    }
}

fn find_mut(blocks: &mut [Block], uuid: Uuid) -> Option<&mut Block> {
    blocks.iter_mut().find_map(|block| {
        if block.uuid == uuid {
            Some(block)
        } else {
            find_mut(&mut block.children, uuid)
        }
    })
}

fn find_by_id(blocks: &[Block], id: BlockId) -> Option<&Block> {
    blocks.iter().find_map(|block| {
        if block.id == id {
            Some(block)
        } else {
            find_by_id(&block.children, id)
        }
    })
}

pub struct Workspace {
    state: Mutex<WorkspaceState>,
    path: Option<PathBuf>,
    accept_new_pages: bool,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// An empty workspace that lives only in memory.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WorkspaceState::default()),
            path: None,
            accept_new_pages: true,
        }
    }

    /// Open the workspace file at `path`. A missing file is an empty workspace.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let state = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No workspace at {}, starting empty", path.display());
                WorkspaceState::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            state: Mutex::new(state),
            path: Some(path.to_path_buf()),
            accept_new_pages: true,
        })
    }

    /// Write the workspace back to the file it was loaded from.
    pub fn save(&self) -> Result<(), HostError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&*self.lock())?;
        std::fs::write(path, json)?;
        log::debug!("Saved workspace to {}", path.display());
        Ok(())
    }

    /// Make `create_page` decline every request, as a read-only graph would.
    pub fn refuse_new_pages(mut self) -> Self {
        self.accept_new_pages = false;
        self
    }

    pub fn page_names(&self) -> Vec<String> {
        self.lock()
            .pages
            .iter()
            .map(|p| p.page.name.clone())
            .collect()
    }

    /// Last `(route, name)` passed to `push_state`.
    pub fn route(&self) -> Option<(String, String)> {
        self.lock().route.clone()
    }

    pub fn selected_block(&self) -> Option<Uuid> {
        self.lock().selected
    }

    fn lock(&self) -> MutexGuard<'_, WorkspaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentHost for Workspace {
    async fn get_page(&self, name: &str) -> Result<Option<Page>, HostError> {
        Ok(self
            .lock()
            .pages
            .iter()
            .find(|p| p.page.name == name)
            .map(|p| p.page.clone()))
    }

    async fn create_page(
        &self,
        name: &str,
        properties: Properties,
        options: CreatePageOptions,
    ) -> Result<Option<Page>, HostError> {
        if !self.accept_new_pages {
            log::warn!("Workspace refused to create page {}", name);
            return Ok(None);
        }
        let mut state = self.lock();
        if let Some(existing) = state.pages.iter().find(|p| p.page.name == name) {
            return Ok(Some(existing.page.clone()));
        }

        let page = Page {
            id: state.allocate_id(),
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            properties,
        };
        let mut blocks = Vec::new();
        if options.create_first_block {
            let mut first = state.new_block(page.id, "", Vec::new());
            first.parent = Some(page.id);
            first.left = Some(page.id);
            blocks.push(first);
        }
        log::debug!("Created page {} ({} format)", name, options.format);
        state.pages.push(StoredPage {
            page: page.clone(),
            blocks,
        });
        Ok(Some(page))
    }

    async fn page_blocks_tree(&self, page: Uuid) -> Result<Vec<Block>, HostError> {
        let mut state = self.lock();
        let (_, blocks) = state.page_mut(page)?;
        Ok(blocks.clone())
    }

    async fn update_block(
        &self,
        block: Uuid,
        content: &str,
        properties: Option<Properties>,
    ) -> Result<(), HostError> {
        let mut state = self.lock();
        let target = state
            .pages
            .iter_mut()
            .find_map(|p| find_mut(&mut p.blocks, block))
            .ok_or(HostError::BlockNotFound(block))?;
        target.content = content.to_string();
        if let Some(properties) = properties {
            target.properties = properties;
        }
        Ok(())
    }

    async fn append_block_in_page(
        &self,
        page: Uuid,
        content: &str,
        properties: Properties,
    ) -> Result<Option<Block>, HostError> {
        let mut state = self.lock();
        let page_id = state.page_mut(page)?.0.id;
        let mut block = state.new_block(page_id, content, properties);
        let (_, blocks) = state.page_mut(page)?;
        block.parent = Some(page_id);
        block.left = Some(blocks.last().map_or(page_id, |b| b.id));
        blocks.push(block.clone());
        Ok(Some(block))
    }

    async fn prepend_block_in_page(
        &self,
        page: Uuid,
        content: &str,
        properties: Properties,
    ) -> Result<Option<Block>, HostError> {
        let mut state = self.lock();
        let page_id = state.page_mut(page)?.0.id;
        let mut block = state.new_block(page_id, content, properties);
        let (_, blocks) = state.page_mut(page)?;
        block.parent = Some(page_id);
        block.left = Some(page_id);
        if let Some(first) = blocks.first_mut() {
            first.left = Some(block.id);
        }
        blocks.insert(0, block.clone());
        Ok(Some(block))
    }

    async fn insert_child_block(
        &self,
        parent: Uuid,
        content: &str,
        properties: Properties,
    ) -> Result<Option<Block>, HostError> {
        let mut state = self.lock();
        let id = state.allocate_id();
        let target = state
            .pages
            .iter_mut()
            .find_map(|p| find_mut(&mut p.blocks, parent))
            .ok_or(HostError::BlockNotFound(parent))?;
        let child = Block {
            id,
            uuid: Uuid::new_v4(),
            content: content.to_string(),
            properties,
            children: Vec::new(),
            parent: Some(target.id),
            page: target.page,
            left: Some(target.children.last().map_or(target.id, |b| b.id)),
        };
        target.children.push(child.clone());
        Ok(Some(child))
    }

    async fn block_by_id(&self, id: BlockId) -> Result<Option<Block>, HostError> {
        Ok(self
            .lock()
            .pages
            .iter()
            .find_map(|p| find_by_id(&p.blocks, id))
            .cloned())
    }

    async fn select_block(&self, block: Uuid) -> Result<(), HostError> {
        let mut state = self.lock();
        if !state.pages.iter_mut().any(|p| find_mut(&mut p.blocks, block).is_some()) {
            return Err(HostError::BlockNotFound(block));
        }
        state.selected = Some(block);
        Ok(())
    }

    async fn push_state(&self, route: &str, name: &str) -> Result<(), HostError> {
        self.lock().route = Some((route.to_string(), name.to_string()));
        Ok(())
    }
}
