pub mod axis;
pub mod bar_chart;
