pub mod analysis_stage;
pub mod content_stage;
pub mod generation;
pub mod post_stage;
pub mod score_stage;
pub mod search_stage;
pub mod stage;

pub use analysis_stage::AnalysisStage;
pub use content_stage::ContentStage;
pub use generation::{cached_or_generate, Generated};
pub use post_stage::PostStage;
pub use score_stage::ScoreStage;
pub use search_stage::{build_query, SearchStage};
pub use stage::{Collaborators, Stage};
