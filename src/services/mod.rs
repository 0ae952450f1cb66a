pub mod engine;
pub mod recommendations;

pub use recommendations::RecommendationService;
