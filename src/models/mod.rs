pub mod paper;
pub mod score;
pub mod state;

pub use paper::{paper_id_from_url, Paper};
pub use score::{parse_score, ParsedScore, ScoreCard, ScoreKey};
pub use state::{BatchState, FetchStats, GenerationStats, StageProgress};
