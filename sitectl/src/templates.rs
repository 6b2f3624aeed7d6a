//! HTML templates for the public site and the admin screens.
//!
//! Templates are compiled into the binary and loaded once into a shared [`Environment`]. Fields
//! holding editor-authored HTML are marked `|safe` in the templates; everything else is escaped.

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::errors::{Error, Result};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("landing.html", include_str!("../templates/landing.html")),
    ("service.html", include_str!("../templates/service.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("accept_invitation.html", include_str!("../templates/accept_invitation.html")),
    ("admin/base.html", include_str!("../templates/admin/base.html")),
    ("admin/dashboard.html", include_str!("../templates/admin/dashboard.html")),
    ("admin/screen.html", include_str!("../templates/admin/screen.html")),
    ("admin/users.html", include_str!("../templates/admin/users.html")),
];

pub fn environment() -> anyhow::Result<Environment<'static>> {
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

/// Render `name` with `context`.
pub fn render(env: &Environment<'_>, name: &str, context: impl Serialize) -> Result<Html<String>> {
    env.get_template(name)
        .and_then(|template| template.render(context))
        .map(Html)
        .map_err(|e| Error::Internal {
            operation: format!("render {name}: {e:#}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn every_template_compiles() {
        let env = environment().unwrap();
        for (name, _) in TEMPLATES {
            assert!(env.get_template(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn plain_fields_are_escaped() {
        let env = environment().unwrap();
        let html = render(
            &env,
            "not_found.html",
            context! { site => context! { title => "<b>Acme</b>" }, message => "gone" },
        )
        .unwrap();
        assert!(html.0.contains("&lt;b&gt;Acme&lt;/b&gt;"));
    }
}
