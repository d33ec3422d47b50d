//! Field locator for `check`/`sanitize` without an explicit section.

use crate::context::{Location, Sections};
use crate::path::FieldPath;
use fieldguard_predicates::is_truthy;

/// Pick the section a field is read from.
///
/// Path params win when the value there is truthy; otherwise the query
/// string when the path exists there at all, then the body. `None` means the
/// field is absent everywhere.
pub fn locate(sections: &Sections, path: &FieldPath) -> Option<Location> {
    if is_truthy(sections.params().get(path).as_ref()) {
        return Some(Location::Params);
    }
    [Location::Query, Location::Body]
        .into_iter()
        .find(|&location| sections.section(location).exists(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use serde_json::json;

    #[test]
    fn truthy_params_win() {
        let ctx = RequestContext::new()
            .with_params(json!({"id": "7"}))
            .with_query(json!({"id": "8"}));
        assert_eq!(
            locate(ctx.sections(), &FieldPath::from("id")),
            Some(Location::Params)
        );
    }

    #[test]
    fn falsy_params_fall_through_to_query() {
        let ctx = RequestContext::new()
            .with_params(json!({"id": ""}))
            .with_query(json!({"id": null}))
            .with_body(json!({"id": "9"}));
        assert_eq!(
            locate(ctx.sections(), &FieldPath::from("id")),
            Some(Location::Query)
        );
    }

    #[test]
    fn body_then_nothing() {
        let ctx = RequestContext::new().with_body(json!({"user": {"email": ""}}));
        assert_eq!(
            locate(ctx.sections(), &FieldPath::from("user.email")),
            Some(Location::Body)
        );
        assert_eq!(locate(ctx.sections(), &FieldPath::from("missing")), None);
    }
}
