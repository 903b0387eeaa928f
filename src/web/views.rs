//! Server-rendered pages

use crate::core::{Starship, StarshipDraft, ValidationErrors};
use minijinja::{Environment, context};
use serde::Serialize;

pub struct Views {
    env: Environment<'static>,
}

#[derive(Debug, Serialize)]
struct FormField<'a> {
    name: &'static str,
    label: &'static str,
    value: &'a str,
}

/// Which form is being rendered.
#[derive(Debug, Clone, Copy)]
pub enum FormMode {
    Create,
    Edit(i64),
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("layout.html", include_str!("../../templates/layout.html"))?;
        env.add_template("_fields.html", include_str!("../../templates/_fields.html"))?;
        env.add_template("index.html", include_str!("../../templates/index.html"))?;
        env.add_template("details.html", include_str!("../../templates/details.html"))?;
        env.add_template("delete.html", include_str!("../../templates/delete.html"))?;
        env.add_template("form.html", include_str!("../../templates/form.html"))?;
        env.add_template("error.html", include_str!("../../templates/error.html"))?;
        Ok(Self { env })
    }

    pub fn list(&self, starships: &[Starship]) -> Result<String, minijinja::Error> {
        self.env
            .get_template("index.html")?
            .render(context! { starships })
    }

    pub fn details(&self, ship: &Starship) -> Result<String, minijinja::Error> {
        self.env
            .get_template("details.html")?
            .render(context! { ship, source_link => ship.source_link() })
    }

    pub fn confirm_delete(&self, ship: &Starship) -> Result<String, minijinja::Error> {
        self.env
            .get_template("delete.html")?
            .render(context! { ship, source_link => ship.source_link() })
    }

    pub fn form(
        &self,
        mode: FormMode,
        draft: &StarshipDraft,
        errors: &ValidationErrors,
    ) -> Result<String, minijinja::Error> {
        let (heading, edit_id) = match mode {
            FormMode::Create => ("Create Starship", None),
            FormMode::Edit(id) => ("Edit Starship", Some(id)),
        };
        let fields = [
            FormField { name: "name", label: "Name", value: &draft.name },
            FormField { name: "model", label: "Model", value: &draft.model },
            FormField { name: "manufacturer", label: "Manufacturer", value: &draft.manufacturer },
            FormField { name: "starship_class", label: "Class", value: &draft.starship_class },
            FormField { name: "crew", label: "Crew", value: &draft.crew },
            FormField { name: "passengers", label: "Passengers", value: &draft.passengers },
        ];

        self.env.get_template("form.html")?.render(context! {
            heading,
            edit_id,
            draft,
            fields,
            errors,
        })
    }

    pub fn error(&self, title: &str, message: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template("error.html")?
            .render(context! { title, message })
    }
}
