pub mod chart;
pub mod dashboard;
pub mod player_list;
pub mod progress_bar;
pub mod quiz_area;
