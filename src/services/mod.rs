pub mod lifecycle;
pub mod matrix;
pub mod ranker;
pub mod recommender;
pub mod similarity;
pub mod top_rated;
