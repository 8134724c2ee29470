//! Behavior tests that need no database: error mapping, payload
//! validation, overdue computation, and wire formats.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use serde_json::json;
use validator::Validate;

use biblioteca_server::error::AppError;
use biblioteca_server::models::book::{CreateBook, UpdateBook};
use biblioteca_server::models::loan::{self, CreateLoan, LoanSummary};
use biblioteca_server::models::member::CreateMember;

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn app_error_status_codes_mapping() {
    assert_eq!(
        status_of(AppError::NotFound("book".into())),
        StatusCode::NOT_FOUND
    );
    // The external contract maps conflicts to 400, not 409
    assert_eq!(
        status_of(AppError::Conflict("unavailable".into())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::Validation("missing".into())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::BadRequest("bad".into())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::Database(sqlx::Error::RowNotFound)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of(AppError::Internal("boom".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn create_book_requires_title_and_author() {
    let book = CreateBook {
        title: String::new(),
        author: "Someone".into(),
        publication_year: None,
        isbn: None,
    };
    assert!(book.validate().is_err(), "empty title must fail");

    let book = CreateBook {
        title: "A Title".into(),
        author: String::new(),
        publication_year: None,
        isbn: None,
    };
    assert!(book.validate().is_err(), "empty author must fail");

    let book = CreateBook {
        title: "A Title".into(),
        author: "Someone".into(),
        publication_year: Some(1984),
        isbn: Some("978-0-00-000000-0".into()),
    };
    assert!(book.validate().is_ok());
}

#[test]
fn update_book_rejects_empty_strings_but_allows_omissions() {
    let update = UpdateBook {
        title: Some(String::new()),
        author: None,
        publication_year: None,
        isbn: None,
        available: None,
    };
    assert!(update.validate().is_err());

    let update: UpdateBook = serde_json::from_value(json!({ "available": false }))
        .expect("partial update must deserialize");
    assert!(update.validate().is_ok());
    assert_eq!(update.available, Some(false));
    assert!(update.title.is_none());
}

#[test]
fn create_member_validates_email() {
    let member = CreateMember {
        name: "Ana".into(),
        email: "not-an-email".into(),
        phone: None,
    };
    assert!(member.validate().is_err(), "malformed email must fail");

    let member = CreateMember {
        name: String::new(),
        email: "ana@example.org".into(),
        phone: None,
    };
    assert!(member.validate().is_err(), "empty name must fail");

    let member = CreateMember {
        name: "Ana".into(),
        email: "ana@example.org".into(),
        phone: Some("555-0100".into()),
    };
    assert!(member.validate().is_ok());
}

#[test]
fn overdue_needs_open_loan_past_due_date() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let yesterday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let tomorrow = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();

    assert!(loan::is_overdue(Some(yesterday), None, today));
    assert!(!loan::is_overdue(Some(tomorrow), None, today));
    assert!(!loan::is_overdue(Some(today), None, today));
    // A returned loan is never overdue, whatever the due date was
    assert!(!loan::is_overdue(Some(yesterday), Some(today), today));
    // No due date means nothing to be late against
    assert!(!loan::is_overdue(None, None, today));
}

#[test]
fn create_loan_due_date_is_optional() {
    let req: CreateLoan = serde_json::from_value(json!({ "member_id": 9, "book_id": 5 }))
        .expect("due_date must be optional");
    assert_eq!(req.member_id, 9);
    assert_eq!(req.book_id, 5);
    assert!(req.due_date.is_none());

    let req: CreateLoan = serde_json::from_value(json!({
        "member_id": 9,
        "book_id": 5,
        "due_date": "2024-07-01"
    }))
    .expect("ISO due_date must parse");
    assert_eq!(
        req.due_date,
        Some(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
    );
}

#[test]
fn loan_summary_wire_format() {
    let summary = LoanSummary {
        id: 12,
        book_id: 5,
        book_title: "Dom Casmurro".into(),
        member_name: "Ana".into(),
        available: false,
    };

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(
        value,
        json!({
            "id": 12,
            "book_id": 5,
            "book_title": "Dom Casmurro",
            "member_name": "Ana",
            "available": false
        })
    );
}
