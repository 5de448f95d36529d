pub mod hud_message;
pub mod pdf_viewer;
