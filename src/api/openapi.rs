use super::handlers::{health, login, register, verify};
use utoipa::openapi::{
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Components, Contact, InfoBuilder, License, OpenApi, OpenApiBuilder, Tag,
};
use utoipa_axum::{router::OpenApiRouter, routes};

/// The `OpenAPI` document for every routed endpoint.
#[must_use]
pub fn openapi() -> OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Routes registered here are both served and documented.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(package_openapi())
        .routes(routes!(health::health))
        .routes(routes!(register::register, register::register_query))
        .routes(routes!(login::login, login::login_query))
        .routes(routes!(verify::verify))
}

/// Base document: package metadata, tags and the bearer scheme used by `/verify`.
fn package_openapi() -> OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(non_empty(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = package_contact(env!("CARGO_PKG_AUTHORS"));
    info.license = non_empty(env!("CARGO_PKG_LICENSE")).map(|spdx| {
        let mut license = License::new(spdx);
        license.identifier = Some(spdx.to_string());
        license
    });

    let mut service_tag = Tag::new("passgate");
    service_tag.description = Some("Service status".to_string());
    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Registration, login and token verification".to_string());

    let mut components = Components::new();
    components.add_security_scheme(
        "bearer",
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build(),
        ),
    );

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(vec![service_tag, auth_tag]))
        .components(Some(components))
        .build()
}

/// First entry of a `;` separated Cargo authors list, as `Name <email>`.
fn package_contact(authors: &str) -> Option<Contact> {
    let first = authors.split(';').map(str::trim).find(|a| !a.is_empty())?;
    let (name, email) = match first.split_once('<') {
        Some((name, rest)) => (name.trim(), rest.trim_end_matches('>').trim()),
        None => (first, ""),
    };

    let mut contact = Contact::new();
    contact.name = non_empty(name).map(str::to_string);
    contact.email = non_empty(email).map(str::to_string);
    (contact.name.is_some() || contact.email.is_some()).then_some(contact)
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_comes_from_the_package() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));

        let contact = doc.info.contact.unwrap_or_default();
        assert_eq!(contact.name.as_deref(), Some("Team Passgate"));
        assert_eq!(contact.email.as_deref(), Some("team@passgate.dev"));

        let license = doc.info.license.map(|l| l.name);
        assert_eq!(license.as_deref(), Some("BSD-3-Clause"));
    }

    #[test]
    fn every_endpoint_is_documented() {
        let doc = openapi();
        for path in ["/health", "/register", "/login", "/verify"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let register = &doc.paths.paths["/register"];
        assert!(register.get.is_some());
        assert!(register.post.is_some());

        let tags = doc.tags.unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "passgate"));
        // Merging the routes must not drop the base document's security scheme.
        assert!(doc
            .components
            .is_some_and(|c| c.security_schemes.contains_key("bearer")));
    }

    #[test]
    fn contact_parsing() {
        let contact = package_contact("Jane Doe <jane@example.com>; Other <o@example.com>");
        assert_eq!(contact.as_ref().and_then(|c| c.name.as_deref()), Some("Jane Doe"));
        assert_eq!(
            contact.as_ref().and_then(|c| c.email.as_deref()),
            Some("jane@example.com")
        );

        let name_only = package_contact("Jane Doe");
        assert_eq!(name_only.as_ref().and_then(|c| c.email.as_deref()), None);

        assert!(package_contact("").is_none());
        assert!(package_contact(" ; ").is_none());
    }
}
