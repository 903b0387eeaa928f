use super::validation::{ValidationErrors, MAX_FIELD_LEN};
use serde::{Deserialize, Serialize};

pub type StarshipId = i64;

/// A persisted starship record.
///
/// The six descriptive fields are never absent: missing values are stored
/// as empty strings. `source_url` is only set for records that came from
/// the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Starship {
    pub id: StarshipId,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub starship_class: String,
    pub crew: String,
    pub passengers: String,
    pub source_url: Option<String>,
}

impl Starship {
    /// Builds an unsaved record. The id is assigned by the store on insert.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        manufacturer: impl Into<String>,
        starship_class: impl Into<String>,
        crew: impl Into<String>,
        passengers: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            model: model.into(),
            manufacturer: manufacturer.into(),
            starship_class: starship_class.into(),
            crew: crew.into(),
            passengers: passengers.into(),
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// The origin reference, if it is safe to render as a link.
    pub fn source_link(&self) -> Option<&str> {
        self.source_url.as_deref().filter(|url| is_web_url(url))
    }
}

/// True for absolute `http://` or `https://` URLs.
pub fn is_web_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.len() > scheme.len() && lower.starts_with(scheme))
}

/// Client payload for create and update requests.
///
/// `id` is whatever the client sent (a hidden form field on edit); the
/// gateway compares it against the routed id and never trusts it on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarshipDraft {
    pub id: Option<StarshipId>,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub starship_class: String,
    pub crew: String,
    pub passengers: String,
}

impl StarshipDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.name.trim().is_empty() {
            errors.add("name", "Name is required.");
        }

        for (field, value) in self.text_fields() {
            if value.chars().count() > MAX_FIELD_LEN {
                errors.add(
                    field,
                    format!("{field} must be at most {MAX_FIELD_LEN} characters."),
                );
            }
        }

        errors.into_result()
    }

    /// Copies the six text fields onto an already-loaded record. The id and
    /// the origin reference are left untouched.
    pub fn apply_to(&self, target: &mut Starship) {
        target.name.clone_from(&self.name);
        target.model.clone_from(&self.model);
        target.manufacturer.clone_from(&self.manufacturer);
        target.starship_class.clone_from(&self.starship_class);
        target.crew.clone_from(&self.crew);
        target.passengers.clone_from(&self.passengers);
    }

    /// Converts into an unsaved record; any client-supplied id is dropped.
    pub fn into_new_record(self) -> Starship {
        Starship {
            id: 0,
            name: self.name,
            model: self.model,
            manufacturer: self.manufacturer,
            starship_class: self.starship_class,
            crew: self.crew,
            passengers: self.passengers,
            source_url: None,
        }
    }

    fn text_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("name", &self.name),
            ("model", &self.model),
            ("manufacturer", &self.manufacturer),
            ("starship_class", &self.starship_class),
            ("crew", &self.crew),
            ("passengers", &self.passengers),
        ]
    }
}

impl From<&Starship> for StarshipDraft {
    fn from(record: &Starship) -> Self {
        Self {
            id: Some(record.id),
            name: record.name.clone(),
            model: record.model.clone(),
            manufacturer: record.manufacturer.clone(),
            starship_class: record.starship_class.clone(),
            crew: record.crew.clone(),
            passengers: record.passengers.clone(),
        }
    }
}
