pub mod popups;
pub mod record_form;
