pub mod leaderboard;
pub mod submit;
