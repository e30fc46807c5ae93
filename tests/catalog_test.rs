mod common;

use kitlast::catalog::{
    delete_service, list_user_categories, save_category, save_service, CatalogError,
    MSG_CATEGORY_EXISTS,
};
use kitlast::forms::{CategoryForm, FormData, ServiceForm};

fn form(pairs: &[(&str, &str)]) -> FormData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_duplicate_category_name_rejected() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let existing = common::category(&mut conn, "Massages");

    let padded = format!("  {}  ", existing.name);
    let err = save_category(&mut conn, CategoryForm::bind(&form(&[("name", padded.as_str())])))
        .unwrap_err();

    match err {
        CatalogError::InvalidCategory(form) => {
            assert_eq!(form.errors.field("name"), [MSG_CATEGORY_EXISTS.to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_service_created_for_requester() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let pro = common::professional(&mut conn, "Alice");
    let category = common::category(&mut conn, "Soins");
    let category_id = category.id.to_string();

    let service = save_service(
        &mut conn,
        ServiceForm::bind(&form(&[
            ("name", "Kobido"),
            ("category", category_id.as_str()),
            ("price", "59.90"),
            ("duration_minutes", "75"),
        ])),
        &pro,
    )
    .unwrap();

    assert_eq!(service.created_by, pro.id);
    assert_eq!(service.duration_minutes, Some(75));

    let grouped = list_user_categories(&mut conn, pro.id).unwrap();
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0].category.id, category.id);
    let ids: Vec<_> = grouped[0].services.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![service.id]);
}

#[test]
fn test_unknown_category_rejected() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let pro = common::professional(&mut conn, "Alice");
    let unknown_category = uuid::Uuid::new_v4().to_string();

    let err = save_service(
        &mut conn,
        ServiceForm::bind(&form(&[
            ("name", "Kobido"),
            ("category", unknown_category.as_str()),
        ])),
        &pro,
    )
    .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidService(ref f) if f.errors.has("category")));
}

#[test]
fn test_non_owner_cannot_delete_service() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let alice = common::professional(&mut conn, "Alice");
    let bob = common::professional(&mut conn, "Bob");
    let category = common::category(&mut conn, "Soins");
    let service = common::service(&mut conn, &alice, &category, "Kobido", Some(60));

    assert!(matches!(
        delete_service(&mut conn, &bob, service.id),
        Err(CatalogError::NotFound)
    ));
    assert_eq!(list_user_categories(&mut conn, alice.id).unwrap().len(), 1);

    let deleted = delete_service(&mut conn, &alice, service.id).unwrap();
    assert_eq!(deleted.id, service.id);
    assert!(list_user_categories(&mut conn, alice.id).unwrap().is_empty());
}
