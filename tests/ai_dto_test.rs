use validator::Validate;

use writestack_server::domain::ai::dto::{
    GenerateNotesRequest, IdeasRequest, ImproveNoteRequest, SeoRequest,
};

#[test]
fn improve_note_request_rejects_empty_body() {
    let req = ImproveNoteRequest {
        note_body: String::new(),
    };

    assert!(req.validate().is_err());
}

#[test]
fn improve_note_request_rejects_oversized_body() {
    let req = ImproveNoteRequest {
        note_body: "x".repeat(10_001),
    };

    assert!(req.validate().is_err());
}

#[test]
fn improve_note_request_accepts_normal_body() {
    let req = ImproveNoteRequest {
        note_body: "A short note about writing habits.".to_string(),
    };

    assert!(req.validate().is_ok());
}

#[test]
fn ideas_request_bounds_the_count() {
    let too_many = IdeasRequest {
        topic: "newsletters".to_string(),
        count: Some(11),
    };
    assert!(too_many.validate().is_err());

    let fine = IdeasRequest {
        topic: "newsletters".to_string(),
        count: Some(10),
    };
    assert!(fine.validate().is_ok());

    let default_count = IdeasRequest {
        topic: "newsletters".to_string(),
        count: None,
    };
    assert!(default_count.validate().is_ok());
}

#[test]
fn generate_notes_request_caps_count_at_five() {
    let req = GenerateNotesRequest {
        topic: "growth".to_string(),
        count: Some(6),
    };

    assert!(req.validate().is_err());
}

#[test]
fn seo_request_requires_title_and_body() {
    let req = SeoRequest {
        title: String::new(),
        body: "content".to_string(),
    };

    assert!(req.validate().is_err());
}
