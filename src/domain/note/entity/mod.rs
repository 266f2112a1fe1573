pub mod ghostwriter_access;
pub mod note;
pub mod substack_published_note;
