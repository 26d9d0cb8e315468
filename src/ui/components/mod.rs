pub mod dialog;
pub mod exam_panel;
pub mod nav_bar;
pub mod question_panel;
pub mod result_panel;
pub mod text_field;
