pub mod scheduled_note;
