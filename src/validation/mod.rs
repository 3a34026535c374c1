//! Rule-chain form validation.
//!
//! A [`FormValidator`] maps field names to ordered rule chains. Validation runs
//! each chain in order and keeps the first failure per field.

pub mod rules;

use std::collections::{BTreeMap, HashMap};

use crate::error::PortalError;

/// A single check: `None` when the value passes, otherwise the message to show.
pub type Rule = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Submitted form fields by name.
pub type FormData = HashMap<String, String>;

#[derive(Default)]
pub struct FormValidator {
    chains: Vec<(String, Vec<Rule>)>,
    errors: BTreeMap<String, String>,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rules to `field`'s chain, creating the chain on first use.
    pub fn add_rules(&mut self, field: impl Into<String>, rules: Vec<Rule>) -> &mut Self {
        let field = field.into();
        match self.chains.iter_mut().find(|(name, _)| *name == field) {
            Some((_, chain)) => chain.extend(rules),
            None => self.chains.push((field, rules)),
        }
        self
    }

    pub fn field(mut self, field: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.add_rules(field, rules);
        self
    }

    /// Run every chain against `data`. Returns `false` iff any field failed.
    ///
    /// Errors from a previous call are discarded. Missing fields are checked as `""`.
    pub fn validate(&mut self, data: &FormData) -> bool {
        self.errors.clear();
        for (field, chain) in &self.chains {
            let value = data.get(field).map(String::as_str).unwrap_or("");
            if let Some(message) = chain.iter().find_map(|rule| rule(value)) {
                self.errors.insert(field.clone(), message);
            }
        }
        self.errors.is_empty()
    }

    /// Like [`validate`](Self::validate) but yields the error map as a [`PortalError`].
    pub fn check(&mut self, data: &FormData) -> Result<(), PortalError> {
        if self.validate(data) {
            Ok(())
        } else {
            Err(PortalError::Validation(self.errors.clone()))
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

/// Sign-up form. `password` is the value typed into the first password box.
pub fn registration_validator(password: &str) -> FormValidator {
    FormValidator::new()
        .field(
            "name",
            vec![rules::required(), rules::min_length(2), rules::max_length(120)],
        )
        .field("email", vec![rules::required(), rules::email()])
        .field("password", vec![rules::password()])
        .field(
            "confirmPassword",
            vec![rules::required(), rules::confirm_password(password)],
        )
        .field(
            "role",
            vec![rules::required(), rules::one_of(&["job_seeker", "employer"])],
        )
        .field("phone", vec![rules::phone()])
}

pub fn login_validator() -> FormValidator {
    FormValidator::new()
        .field("email", vec![rules::required(), rules::email()])
        .field("password", vec![rules::required()])
}

pub fn job_posting_validator() -> FormValidator {
    FormValidator::new()
        .field(
            "title",
            vec![rules::required(), rules::min_length(5), rules::max_length(200)],
        )
        .field("description", vec![rules::required(), rules::min_length(30)])
        .field("location", vec![rules::required()])
        .field(
            "jobType",
            vec![
                rules::required(),
                rules::one_of(&["full_time", "part_time", "contract", "internship", "temporary"]),
            ],
        )
        .field("salaryMin", vec![rules::numeric()])
        .field("salaryMax", vec![rules::numeric()])
        .field("applicationUrl", vec![rules::url()])
}
