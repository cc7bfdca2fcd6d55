pub mod instantiate;
pub mod orchestrator;
pub mod synchronize;

pub use instantiate::{TemplateOutcome, clone_template, get_or_create_page, instantiate_template};
pub use orchestrator::{ActionOutcome, NewsWeek, NewsWeekReport, SyncOutcome};
pub use synchronize::{SyncRules, synchronize_dates};
