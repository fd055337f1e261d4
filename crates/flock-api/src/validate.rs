//! Field rules applied to request bodies before they reach the store.
//!
//! Each validator normalises its input (trimming, empty → absent) and either
//! returns the store-ready value or every failed rule keyed by field.

use flock_core::{
  person::PersonInput,
  user::{NewUser, UserUpdate},
};
use uuid::Uuid;

use crate::{
  error::{ApiError, FieldErrors},
  users::{CreateUserBody, UpdateUserBody},
};

const MAX_NAME: usize = 255;
const MAX_TESTIMONY: usize = 1000;
const MIN_PASSWORD: usize = 8;

// ─── Collector ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Fields(FieldErrors);

impl Fields {
  fn fail(&mut self, field: &'static str, message: String) {
    self.0.entry(field).or_default().push(message);
  }

  fn required(&mut self, field: &'static str, value: &str) -> bool {
    if value.is_empty() {
      self.fail(field, format!("The {} field is required.", label(field)));
      return false;
    }
    true
  }

  fn max_chars(&mut self, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
      self.fail(
        field,
        format!("The {} field must not be greater than {max} characters.", label(field)),
      );
    }
  }

  fn email(&mut self, field: &'static str, value: &str) {
    if !is_email(value) {
      self.fail(
        field,
        format!("The {} field must be a valid email address.", label(field)),
      );
    }
  }

  fn finish<T>(self, value: T) -> Result<T, ApiError> {
    if self.0.is_empty() {
      Ok(value)
    } else {
      Err(ApiError::Validation(self.0))
    }
  }
}

fn label(field: &str) -> String { field.replace('_', " ") }

/// Loose address check: one `@`, a non-empty local part and a
/// dotted domain, no whitespace.
pub fn is_email(value: &str) -> bool {
  let Some((local, domain)) = value.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && !value.chars().any(char::is_whitespace)
    && domain.split('.').count() >= 2
    && domain.split('.').all(|part| !part.is_empty())
}

fn trim_owned(value: String) -> String { value.trim().to_owned() }

fn trim_opt(value: Option<String>) -> Option<String> {
  value.map(trim_owned).filter(|v| !v.is_empty())
}

// ─── People ───────────────────────────────────────────────────────────────────

/// Validate a person body for create and full-replace update alike.
pub fn person(input: PersonInput) -> Result<PersonInput, ApiError> {
  let mut input = input;
  input.first_name = trim_owned(input.first_name);
  input.last_name = trim_owned(input.last_name);
  input.spiritual.testimony = trim_opt(input.spiritual.testimony);

  let contact = &mut input.contact;
  for slot in [
    &mut contact.email,
    &mut contact.phone,
    &mut contact.alternate_phone,
    &mut contact.address_line_1,
    &mut contact.address_line_2,
    &mut contact.city,
    &mut contact.state,
    &mut contact.postal_code,
    &mut contact.country,
  ] {
    *slot = trim_opt(slot.take());
  }

  let mut fields = Fields::default();

  for (field, value) in [
    ("first_name", &input.first_name),
    ("last_name", &input.last_name),
  ] {
    if fields.required(field, value) {
      fields.max_chars(field, value, MAX_NAME);
    }
  }

  if let Some(testimony) = &input.spiritual.testimony {
    fields.max_chars("testimony", testimony, MAX_TESTIMONY);
  }

  if let Some(email) = &input.contact.email {
    fields.email("email", email);
  }

  for (field, value) in [
    ("phone", &input.contact.phone),
    ("alternate_phone", &input.contact.alternate_phone),
    ("address_line_1", &input.contact.address_line_1),
    ("address_line_2", &input.contact.address_line_2),
    ("city", &input.contact.city),
    ("state", &input.contact.state),
    ("postal_code", &input.contact.postal_code),
    ("country", &input.contact.country),
  ] {
    if let Some(value) = value {
      fields.max_chars(field, value, MAX_NAME);
    }
  }

  fields.finish(input)
}

// ─── Users ────────────────────────────────────────────────────────────────────

fn user_identity(fields: &mut Fields, name: &str, email: &str) {
  if fields.required("name", name) {
    fields.max_chars("name", name, MAX_NAME);
  }

  if fields.required("email", email) {
    if email != email.to_lowercase() {
      fields.fail("email", "The email field must be lowercase.".to_owned());
    }
    fields.email("email", email);
    fields.max_chars("email", email, MAX_NAME);
  }
}

fn password_rules(fields: &mut Fields, password: &str, confirmation: Option<&str>) {
  if password.chars().count() < MIN_PASSWORD {
    fields.fail(
      "password",
      format!("The password field must be at least {MIN_PASSWORD} characters."),
    );
  }
  if confirmation != Some(password) {
    fields.fail(
      "password",
      "The password field confirmation does not match.".to_owned(),
    );
  }
}

fn role_rules(fields: &mut Fields, role_ids: &[Uuid]) {
  if role_ids.is_empty() {
    fields.fail("role_ids", "The role ids field is required.".to_owned());
  }
}

pub fn new_user(body: CreateUserBody) -> Result<NewUser, ApiError> {
  let name = trim_owned(body.name);
  let email = trim_owned(body.email);

  let mut fields = Fields::default();
  user_identity(&mut fields, &name, &email);
  if fields.required("password", &body.password) {
    password_rules(&mut fields, &body.password, body.password_confirmation.as_deref());
  }
  role_rules(&mut fields, &body.role_ids);

  fields.finish(NewUser {
    name,
    email,
    password: body.password,
    role_ids: body.role_ids,
  })
}

/// An absent or empty password keeps the stored hash. Absent `role_ids`
/// keep `current_roles`; the non-empty rule only applies to a changed set.
pub fn user_update(
  body: UpdateUserBody,
  current_roles: &[Uuid],
) -> Result<UserUpdate, ApiError> {
  let name = trim_owned(body.name);
  let email = trim_owned(body.email);
  let password = body.password.filter(|p| !p.is_empty());
  let role_ids = body.role_ids.unwrap_or_else(|| current_roles.to_vec());

  let mut fields = Fields::default();
  user_identity(&mut fields, &name, &email);
  if let Some(password) = &password {
    password_rules(&mut fields, password, body.password_confirmation.as_deref());
  }
  if !same_roles(&role_ids, current_roles) {
    role_rules(&mut fields, &role_ids);
  }

  fields.finish(UserUpdate { name, email, password, role_ids })
}

/// Whether `requested` names exactly the roles in `current`, ignoring order
/// and duplicates.
pub fn same_roles(requested: &[Uuid], current: &[Uuid]) -> bool {
  let normalise = |ids: &[Uuid]| {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
  };
  normalise(requested) == normalise(current)
}

#[cfg(test)]
mod tests {
  use flock_core::person::Gender;

  use super::*;

  fn field_errors(result: Result<impl std::fmt::Debug, ApiError>) -> FieldErrors {
    match result {
      Err(ApiError::Validation(fields)) => fields,
      other => panic!("expected validation failure, got {other:?}"),
    }
  }

  fn create_body() -> CreateUserBody {
    CreateUserBody {
      name:                  "Ana".into(),
      email:                 "ana@example.com".into(),
      password:              "password123".into(),
      password_confirmation: Some("password123".into()),
      role_ids:              vec![Uuid::new_v4()],
    }
  }

  #[test]
  fn email_shapes() {
    assert!(is_email("ana@example.com"));
    assert!(is_email("a.b+c@mail.example.org"));
    assert!(!is_email("ana"));
    assert!(!is_email("@example.com"));
    assert!(!is_email("ana@example"));
    assert!(!is_email("ana@@example.com"));
    assert!(!is_email("ana @example.com"));
    assert!(!is_email("ana@example..com"));
  }

  #[test]
  fn person_is_trimmed_and_blank_optionals_dropped() {
    let mut input = PersonInput::new("  Ana ", " Silva", Gender::Female);
    input.contact.city = Some("   ".into());
    input.contact.phone = Some(" 555-0100 ".into());

    let input = person(input).unwrap();
    assert_eq!(input.first_name, "Ana");
    assert_eq!(input.last_name, "Silva");
    assert_eq!(input.contact.city, None);
    assert_eq!(input.contact.phone.as_deref(), Some("555-0100"));
  }

  #[test]
  fn person_names_are_required_and_bounded() {
    let input = PersonInput::new(" ", "x".repeat(256), Gender::Male);
    let fields = field_errors(person(input));
    assert_eq!(fields["first_name"], vec!["The first name field is required."]);
    assert_eq!(
      fields["last_name"],
      vec!["The last name field must not be greater than 255 characters."]
    );
  }

  #[test]
  fn person_testimony_and_email_rules() {
    let mut input = PersonInput::new("Ana", "Silva", Gender::Female);
    input.spiritual.testimony = Some("a".repeat(1001));
    input.contact.email = Some("not-an-email".into());

    let fields = field_errors(person(input));
    assert!(fields.contains_key("testimony"));
    assert!(fields.contains_key("email"));
    assert!(!fields.contains_key("first_name"));
  }

  #[test]
  fn new_user_accepts_a_complete_body() {
    let user = new_user(create_body()).unwrap();
    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.role_ids.len(), 1);
  }

  #[test]
  fn new_user_collects_every_failure() {
    let body = CreateUserBody {
      name:                  "".into(),
      email:                 "Ana@Example.com".into(),
      password:              "short".into(),
      password_confirmation: Some("different".into()),
      role_ids:              vec![],
    };
    let fields = field_errors(new_user(body));

    assert_eq!(fields["name"], vec!["The name field is required."]);
    assert_eq!(fields["email"], vec!["The email field must be lowercase."]);
    assert_eq!(fields["password"].len(), 2);
    assert_eq!(fields["role_ids"], vec!["The role ids field is required."]);
  }

  #[test]
  fn new_user_requires_a_password() {
    let body = CreateUserBody { password: String::new(), ..create_body() };
    let fields = field_errors(new_user(body));
    assert_eq!(fields["password"], vec!["The password field is required."]);
  }

  fn update_body(role_ids: Option<Vec<Uuid>>) -> UpdateUserBody {
    UpdateUserBody {
      name: "Ana".into(),
      email: "ana@example.com".into(),
      password: None,
      password_confirmation: None,
      role_ids,
    }
  }

  #[test]
  fn update_without_password_keeps_it_absent() {
    let body = UpdateUserBody {
      password: Some(String::new()),
      ..update_body(Some(vec![Uuid::new_v4()]))
    };
    assert_eq!(user_update(body, &[]).unwrap().password, None);
  }

  #[test]
  fn update_without_role_ids_keeps_current_roles() {
    let current = vec![Uuid::new_v4()];
    let update = user_update(update_body(None), &current).unwrap();
    assert_eq!(update.role_ids, current);
  }

  #[test]
  fn unchanged_empty_role_set_is_accepted() {
    assert!(user_update(update_body(Some(vec![])), &[]).is_ok());
    assert!(user_update(update_body(None), &[]).is_ok());
  }

  #[test]
  fn clearing_roles_is_rejected() {
    let current = [Uuid::new_v4()];
    let fields = field_errors(user_update(update_body(Some(vec![])), &current));
    assert_eq!(fields["role_ids"], vec!["The role ids field is required."]);
  }

  #[test]
  fn role_sets_compare_ignoring_order_and_duplicates() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert!(same_roles(&[b, a, a], &[a, b]));
    assert!(!same_roles(&[a], &[a, b]));
    assert!(same_roles(&[], &[]));
  }

  #[test]
  fn update_with_password_requires_confirmation() {
    let body = UpdateUserBody {
      password: Some("password123".into()),
      ..update_body(Some(vec![Uuid::new_v4()]))
    };
    let fields = field_errors(user_update(body, &[]));
    assert_eq!(
      fields["password"],
      vec!["The password field confirmation does not match."]
    );
  }
}
