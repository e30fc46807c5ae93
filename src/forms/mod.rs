//! Bound HTML forms for the dashboard.
//!
//! A form keeps the raw submitted strings so it can be re-rendered as typed,
//! and collects field and non-field errors while cleaning. Checks that need
//! the database (uniqueness, foreign keys) are added by the owning service
//! through [`FormErrors::add`].

use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::core::shared::models::{Service, User};
use crate::security::validation::{
    normalize_email, validate_decimal, validate_email, validate_length, validate_non_negative_int,
    validate_required, ValidationError,
};

pub type FormData = HashMap<String, String>;

pub const CATEGORY_NAME_MAX: usize = 100;
pub const SERVICE_NAME_MAX: usize = 100;
pub const NAME_MAX: usize = 150;
pub const PHONE_MAX: usize = 30;
pub const EMAIL_MAX: usize = 254;

fn field(data: &FormData, key: &str) -> String {
    data.get(key).cloned().unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_validation(&mut self, field: &str, error: &ValidationError) {
        self.add(field, error.to_string());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.fields.iter()
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryForm {
    pub name: String,
    pub errors: FormErrors,
}

impl CategoryForm {
    pub fn bind(data: &FormData) -> Self {
        Self {
            name: field(data, "name"),
            errors: FormErrors::new(),
        }
    }

    /// Returns the trimmed name when valid.
    pub fn clean(&mut self) -> Option<String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            self.errors
                .add("name", "Veuillez saisir un nom de catégorie.");
            return None;
        }
        if let Err(e) = validate_length(&name, "name", CATEGORY_NAME_MAX) {
            self.errors.add_validation("name", &e);
            return None;
        }
        Some(name)
    }
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInput {
    pub name: String,
    pub category_id: Uuid,
    pub price: Option<BigDecimal>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceForm {
    /// Set when the form edits an existing service.
    pub service_id: Option<Uuid>,
    pub name: String,
    pub category: String,
    pub price: String,
    pub duration_minutes: String,
    pub errors: FormErrors,
}

impl ServiceForm {
    pub fn bind(data: &FormData) -> Self {
        Self {
            service_id: None,
            name: field(data, "name"),
            category: field(data, "category"),
            price: field(data, "price"),
            duration_minutes: field(data, "duration_minutes"),
            errors: FormErrors::new(),
        }
    }

    /// Unbound form showing the values of an existing service.
    pub fn from_service(service: &Service) -> Self {
        Self {
            service_id: Some(service.id),
            name: service.name.clone(),
            category: service.category_id.to_string(),
            price: service
                .price
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            duration_minutes: service
                .duration_minutes
                .map(|d| d.to_string())
                .unwrap_or_default(),
            errors: FormErrors::new(),
        }
    }

    pub fn with_initial_category(category_id: Uuid) -> Self {
        Self {
            category: category_id.to_string(),
            ..Self::default()
        }
    }

    /// Parses and validates the submitted values. Category existence is
    /// checked by the catalog service.
    pub fn clean(&mut self) -> Option<ServiceInput> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            self.errors
                .add("name", "Veuillez saisir le nom de la prestation.");
        } else if name.chars().count() > SERVICE_NAME_MAX {
            self.errors
                .add("name", "Le nom ne peut pas dépasser 100 caractères.");
        }

        let category_id = match validate_required(Some(self.category.as_str()), "category") {
            Ok(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    self.errors.add_validation(
                        "category",
                        &ValidationError::InvalidChoice(raw.to_string()),
                    );
                    None
                }
            },
            Err(e) => {
                self.errors.add_validation("category", &e);
                None
            }
        };

        let price = if self.price.trim().is_empty() {
            None
        } else {
            match validate_decimal(&self.price, "price", 8, 2) {
                Ok(price) => Some(price),
                Err(ValidationError::InvalidRange { .. }) => {
                    self.errors.add("price", "Le prix doit être positif.");
                    None
                }
                Err(e) => {
                    self.errors.add_validation("price", &e);
                    None
                }
            }
        };

        let duration_minutes = if self.duration_minutes.trim().is_empty() {
            None
        } else {
            match validate_non_negative_int(&self.duration_minutes, "duration_minutes") {
                Ok(duration) => Some(duration),
                Err(ValidationError::InvalidRange { .. }) => {
                    self.errors
                        .add("duration_minutes", "La durée doit être positive.");
                    None
                }
                Err(e) => {
                    self.errors.add_validation("duration_minutes", &e);
                    None
                }
            }
        };

        if !self.errors.is_empty() {
            return None;
        }

        Some(ServiceInput {
            name,
            category_id: category_id?,
            price,
            duration_minutes,
        })
    }
}

// ============================================================================
// CLIENT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClientInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub linked_professional_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    /// Hidden field, forced to the acting professional on creation.
    pub linked_professional: String,
    pub errors: FormErrors,
}

impl ClientForm {
    pub fn bind(data: &FormData) -> Self {
        Self {
            first_name: field(data, "first_name"),
            last_name: field(data, "last_name"),
            email: field(data, "email"),
            phone_number: field(data, "phone_number"),
            linked_professional: field(data, "linked_professional"),
            errors: FormErrors::new(),
        }
    }

    /// Empty form whose hidden link points at `professional`.
    pub fn initial_for(professional: &User) -> Self {
        Self {
            linked_professional: professional.id.to_string(),
            ..Self::default()
        }
    }

    /// Unbound form showing the values of an existing client.
    pub fn from_user(client: &User) -> Self {
        Self {
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: client.email.clone(),
            phone_number: client.phone_number.clone(),
            linked_professional: client
                .linked_professional_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            errors: FormErrors::new(),
        }
    }

    /// Validates field formats. Email uniqueness and the linked user's type
    /// are checked by the contacts service.
    pub fn clean(&mut self) -> Option<ClientInput> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let phone_number = self.phone_number.trim().to_string();

        for (name, value, max) in [
            ("first_name", &first_name, NAME_MAX),
            ("last_name", &last_name, NAME_MAX),
            ("phone_number", &phone_number, PHONE_MAX),
        ] {
            if let Err(e) = validate_length(value, name, max) {
                self.errors.add_validation(name, &e);
            }
        }

        let email = match validate_required(Some(self.email.as_str()), "email") {
            Ok(raw) => {
                let email = normalize_email(raw);
                match validate_length(&email, "email", EMAIL_MAX).and_then(|_| validate_email(&email))
                {
                    Ok(()) => Some(email),
                    Err(e) => {
                        self.errors.add_validation("email", &e);
                        None
                    }
                }
            }
            Err(e) => {
                self.errors.add_validation("email", &e);
                None
            }
        };

        let raw_link = self.linked_professional.trim();
        let linked_professional_id = if raw_link.is_empty() {
            None
        } else {
            match Uuid::parse_str(raw_link) {
                Ok(id) => Some(id),
                Err(_) => {
                    self.errors.add_validation(
                        "linked_professional",
                        &ValidationError::InvalidChoice(raw_link.to_string()),
                    );
                    None
                }
            }
        };

        if !self.errors.is_empty() {
            return None;
        }

        Some(ClientInput {
            first_name,
            last_name,
            email: email?,
            phone_number,
            linked_professional_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_category_name_trimmed() {
        let mut form = CategoryForm::bind(&data(&[("name", "  Retouches  ")]));
        assert_eq!(form.clean().as_deref(), Some("Retouches"));
        assert!(form.errors.is_empty());
    }

    #[test]
    fn test_category_blank_name_rejected() {
        let mut form = CategoryForm::bind(&data(&[("name", "   ")]));
        assert!(form.clean().is_none());
        assert_eq!(
            form.errors.field("name"),
            ["Veuillez saisir un nom de catégorie.".to_string()]
        );
    }

    #[test]
    fn test_service_form_valid() {
        let category = Uuid::new_v4();
        let mut form = ServiceForm::bind(&data(&[
            ("name", " Pose de bouton "),
            ("category", &category.to_string()),
            ("price", "45"),
            ("duration_minutes", "60"),
        ]));
        let input = form.clean().expect("form should be valid");
        assert_eq!(input.name, "Pose de bouton");
        assert_eq!(input.category_id, category);
        assert_eq!(input.duration_minutes, Some(60));
        assert!(input.price.is_some());
    }

    #[test]
    fn test_service_form_optional_numbers() {
        let mut form = ServiceForm::bind(&data(&[
            ("name", "Ourlet"),
            ("category", &Uuid::new_v4().to_string()),
        ]));
        let input = form.clean().expect("form should be valid");
        assert_eq!(input.price, None);
        assert_eq!(input.duration_minutes, None);
    }

    #[test]
    fn test_service_form_errors() {
        let mut form = ServiceForm::bind(&data(&[
            ("name", &"x".repeat(101)),
            ("category", "not-a-uuid"),
            ("price", "-3"),
            ("duration_minutes", "-10"),
        ]));
        assert!(form.clean().is_none());
        assert_eq!(
            form.errors.field("name"),
            ["Le nom ne peut pas dépasser 100 caractères.".to_string()]
        );
        assert!(form.errors.has("category"));
        assert_eq!(
            form.errors.field("price"),
            ["Le prix doit être positif.".to_string()]
        );
        assert_eq!(
            form.errors.field("duration_minutes"),
            ["La durée doit être positive.".to_string()]
        );
    }

    #[test]
    fn test_service_form_missing_name_and_category() {
        let mut form = ServiceForm::bind(&data(&[("name", "  ")]));
        assert!(form.clean().is_none());
        assert_eq!(
            form.errors.field("name"),
            ["Veuillez saisir le nom de la prestation.".to_string()]
        );
        assert_eq!(
            form.errors.field("category"),
            ["Ce champ est obligatoire.".to_string()]
        );
    }

    #[test]
    fn test_client_form_valid() {
        let professional = Uuid::new_v4();
        let mut form = ClientForm::bind(&data(&[
            ("first_name", "Alice"),
            ("last_name", "Martin"),
            ("email", "Alice@Example.COM"),
            ("phone_number", "0601020304"),
            ("linked_professional", &professional.to_string()),
        ]));
        let input = form.clean().expect("form should be valid");
        assert_eq!(input.email, "Alice@example.com");
        assert_eq!(input.linked_professional_id, Some(professional));
    }

    #[test]
    fn test_client_form_errors() {
        let mut form = ClientForm::bind(&data(&[
            ("first_name", &"a".repeat(151)),
            ("email", "not-an-email"),
            ("phone_number", &"1".repeat(31)),
        ]));
        assert!(form.clean().is_none());
        assert!(form.errors.has("first_name"));
        assert!(form.errors.has("phone_number"));
        assert_eq!(
            form.errors.field("email"),
            ["Saisissez une adresse e-mail valide.".to_string()]
        );
    }

    #[test]
    fn test_client_form_requires_email() {
        let mut form = ClientForm::bind(&data(&[("first_name", "Bob")]));
        assert!(form.clean().is_none());
        assert_eq!(
            form.errors.field("email"),
            ["Ce champ est obligatoire.".to_string()]
        );
    }

    #[test]
    fn test_non_field_errors() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());
        errors.add_non_field("Vous devez être un professionnel pour ajouter un client.");
        assert!(!errors.is_empty());
        assert_eq!(errors.non_field().len(), 1);
        assert!(errors.field("email").is_empty());
    }
}
