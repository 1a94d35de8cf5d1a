pub mod capabilities;
pub mod prompts;
pub mod ranking;

pub use capabilities::{
    ChatRole, ChatTurn, Completion, ContentSource, PaperSearch, SearchHit, SearchQuery, SortOrder,
};
pub use prompts::{Guideline, PromptLibrary};
pub use ranking::{collect_scored_papers, format_brief, format_scores, top_papers};
