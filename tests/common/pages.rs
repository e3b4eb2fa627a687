use form_filler::screen::dom::{Document, NodeId};

/// Signup page: one visible email input without a label, one hidden csrf input.
pub fn signup_page() -> (Document, NodeId) {
    let mut doc = Document::new("https://example.com/signup", "Sign up");
    let body = doc.body();
    let form = doc.append_element(body, "form", &[("id", "signup")]);
    let email = doc.append_element(form, "input", &[("id", "email"), ("placeholder", "Email")]);
    doc.append_element(form, "input", &[("type", "hidden"), ("id", "csrf_token"), ("name", "csrf_token")]);
    doc.append_element(form, "button", &[("type", "submit")]);
    (doc, email)
}

/// Profile page with one control of every write path.
pub struct ProfilePage {
    pub doc: Document,
    pub form: NodeId,
    pub name: NodeId,
    pub newsletter: NodeId,
    pub country: NodeId,
    pub notes: NodeId,
}

pub fn profile_page() -> ProfilePage {
    let mut doc = Document::new("https://example.com/profile", "Profile");
    let head = doc.head();
    let title = doc.append_element(head, "title", &[]);
    doc.append_text(title, "Edit profile");
    doc.append_element(
        head,
        "meta",
        &[("name", "description"), ("content", "Manage your account")],
    );

    let body = doc.body();
    let h1 = doc.append_element(body, "h1", &[]);
    doc.append_text(h1, "  Your profile ");

    let form = doc.append_element(body, "form", &[("id", "profile")]);

    let name_label = doc.append_element(form, "label", &[("for", "full_name")]);
    doc.append_text(name_label, "Full name");
    let name = doc.append_element(form, "input", &[("id", "full_name"), ("name", "full_name")]);

    let newsletter = doc.append_element(
        form,
        "input",
        &[("type", "checkbox"), ("id", "newsletter"), ("name", "newsletter")],
    );

    let country = doc.append_element(form, "select", &[("id", "country"), ("name", "country")]);
    for (value, text) in [("", "Choose..."), ("de", "Germany"), ("fr", "France")] {
        let option = doc.append_element(country, "option", &[("value", value)]);
        doc.append_text(option, text);
    }

    let notes = doc.append_element(form, "textarea", &[("name", "notes")]);

    ProfilePage {
        doc,
        form,
        name,
        newsletter,
        country,
        notes,
    }
}
