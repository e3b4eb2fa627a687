mod common;

use common::pages::{profile_page, signup_page};
use form_filler::screen::dom::Document;
use form_filler::screen::screen_model::{FormFieldDescriptor, PageOverview};
use form_filler::screen::snapshot::{build_request, collect_fields, field_identifier, page_overview};
use form_filler::service::client::AnalyzeFormBody;

fn field(identifier: &str, label: &str, kind: &str) -> FormFieldDescriptor {
    FormFieldDescriptor {
        identifier: identifier.into(),
        label: label.into(),
        kind: kind.into(),
    }
}

// ============================================================================
// Field collection
// ============================================================================

#[test]
fn test_signup_snapshot_has_only_email() {
    let (doc, _) = signup_page();
    let fields = collect_fields(&doc);

    assert_eq!(fields, vec![field("email", "Email", "text")]);
}

#[test]
fn test_profile_snapshot_fields_and_kinds() {
    let page = profile_page();
    let fields = collect_fields(&page.doc);

    assert_eq!(
        fields,
        vec![
            field("full_name", "Full name", "text"),
            field("newsletter", "newsletter", "checkbox"),
            field("country", "country", "select-one"),
            field("notes", "notes", "textarea"),
        ]
    );
}

#[test]
fn test_field_order_across_forms() {
    let mut doc = Document::new("https://example.com/two", "Two forms");
    let body = doc.body();
    let first = doc.append_element(body, "form", &[("id", "first")]);
    let second = doc.append_element(body, "form", &[("id", "second")]);

    doc.append_element(first, "input", &[("name", "a1")]);
    doc.append_element(second, "input", &[("name", "b1")]);
    doc.append_element(first, "input", &[("name", "a2")]);
    let fieldset = doc.append_element(second, "fieldset", &[]);
    doc.append_element(fieldset, "input", &[("name", "b2")]);

    let ids: Vec<String> = collect_fields(&doc).into_iter().map(|f| f.identifier).collect();
    assert_eq!(ids, vec!["a1", "a2", "b1", "b2"]);
}

#[test]
fn test_form_attribute_associates_outside_control() {
    let mut doc = Document::new("https://example.com", "Owner");
    let body = doc.body();
    let form = doc.append_element(body, "form", &[("id", "checkout")]);
    doc.append_element(form, "input", &[("name", "inside")]);
    doc.append_element(body, "input", &[("name", "outside"), ("form", "checkout")]);
    doc.append_element(body, "input", &[("name", "orphan")]);

    let ids: Vec<String> = collect_fields(&doc).into_iter().map(|f| f.identifier).collect();
    assert_eq!(ids, vec!["inside", "outside"]);
}

#[test]
fn test_controls_outside_forms_are_ignored() {
    let mut doc = Document::new("https://example.com", "No forms");
    let body = doc.body();
    doc.append_element(body, "input", &[("name", "search")]);

    assert!(collect_fields(&doc).is_empty());
}

#[test]
fn test_id_preferred_over_name() {
    let page = profile_page();
    assert_eq!(field_identifier(&page.doc, page.name), "full_name");
    assert_eq!(field_identifier(&page.doc, page.notes), "notes");
}

#[test]
fn test_duplicate_names_are_kept() {
    let mut doc = Document::new("https://example.com", "Dupes");
    let body = doc.body();
    let form = doc.append_element(body, "form", &[]);
    doc.append_element(form, "input", &[("type", "radio"), ("name", "plan"), ("value", "basic")]);
    doc.append_element(form, "input", &[("type", "radio"), ("name", "plan"), ("value", "pro")]);

    let fields = collect_fields(&doc);
    assert_eq!(fields.len(), 2);
    assert!(fields.iter().all(|f| f.identifier == "plan" && f.kind == "radio"));
}

// ============================================================================
// Overview and request
// ============================================================================

#[test]
fn test_overview_from_title_meta_and_heading() {
    let page = profile_page();
    let overview = page_overview(&page.doc);

    assert_eq!(
        overview,
        PageOverview {
            title: "Edit profile".into(),
            description: "Manage your account".into(),
            headline: "Your profile".into(),
        }
    );
    assert_eq!(
        overview.summary(),
        "Title: Edit profile\nDescription: Manage your account\nMain Heading: Your profile"
    );
}

#[test]
fn test_overview_parts_default_to_empty() {
    let (doc, _) = signup_page();
    let overview = page_overview(&doc);

    assert_eq!(overview.title, "Sign up");
    assert_eq!(overview.description, "");
    assert_eq!(overview.headline, "");
}

#[test]
fn test_build_request_leaves_comment_empty() {
    let (doc, _) = signup_page();
    let request = build_request(&doc);

    assert_eq!(request.url, "https://example.com/signup");
    assert_eq!(request.comment, "");
    assert!(request.has_fields());

    let merged = request.with_comment("use my work address");
    assert_eq!(merged.comment, "use my work address");
}

#[test]
fn test_request_wire_shape() {
    let (doc, _) = signup_page();
    let request = build_request(&doc);

    // bridge payload keeps the structured overview
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["url"], "https://example.com/signup");
    assert_eq!(json["fields"][0]["identifier"], "email");
    assert_eq!(json["overview"]["title"], "Sign up");

    // service body uses the keys the analysis service reads
    let body = serde_json::to_value(AnalyzeFormBody::from(&request)).unwrap();
    assert_eq!(body["url"], "https://example.com/signup");
    assert_eq!(body["formFields"][0]["id"], "email");
    assert_eq!(body["formFields"][0]["name"], "Email");
    assert_eq!(body["formFields"][0]["type"], "text");
    assert_eq!(body["websiteOverview"], "Title: Sign up\nDescription: \nMain Heading: ");
}
