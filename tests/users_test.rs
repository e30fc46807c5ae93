mod common;

use kitlast::core::shared::enums::UserType;
use kitlast::users::{
    create_user, get_user, save_user, NewUser, UserError, MSG_EMAIL_TAKEN,
    MSG_INDIVIDUAL_NEEDS_PROFESSIONAL, MSG_LINK_MUST_BE_PROFESSIONAL,
};

fn validation_message(err: UserError) -> (String, String) {
    match err {
        UserError::Validation { field, message } => (field, message),
        other => panic!("expected a validation error, got {other}"),
    }
}

#[test]
fn test_individual_requires_professional() {
    let Some(mut conn) = common::connection() else {
        return;
    };

    let err = create_user(
        &mut conn,
        NewUser {
            email: "orphan@example.com".into(),
            user_type: UserType::Individual,
            ..NewUser::default()
        },
    )
    .unwrap_err();

    let (field, message) = validation_message(err);
    assert_eq!(field, "linked_professional");
    assert_eq!(message, MSG_INDIVIDUAL_NEEDS_PROFESSIONAL);
}

#[test]
fn test_individual_cannot_link_to_individual() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let pro = common::professional(&mut conn, "Alice");
    let client = common::individual(&mut conn, &pro, "Bruno");

    let err = create_user(
        &mut conn,
        NewUser {
            email: "nested@example.com".into(),
            user_type: UserType::Individual,
            linked_professional_id: Some(client.id),
            ..NewUser::default()
        },
    )
    .unwrap_err();

    let (_, message) = validation_message(err);
    assert_eq!(message, MSG_LINK_MUST_BE_PROFESSIONAL);
}

#[test]
fn test_professional_may_stand_alone() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let pro = common::professional(&mut conn, "Alice");

    assert!(pro.is_professional());
    assert_eq!(pro.linked_professional_id, None);
    assert!(pro.password_hash.starts_with("$argon2"));
}

#[test]
fn test_email_unique_case_insensitive() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let pro = common::professional(&mut conn, "Alice");

    let err = create_user(
        &mut conn,
        NewUser {
            email: pro.email.to_uppercase(),
            user_type: UserType::Professional,
            ..NewUser::default()
        },
    )
    .unwrap_err();

    let (field, message) = validation_message(err);
    assert_eq!(field, "email");
    assert_eq!(message, MSG_EMAIL_TAKEN);
}

#[test]
fn test_unlinking_an_individual_is_rejected() {
    let Some(mut conn) = common::connection() else {
        return;
    };
    let pro = common::professional(&mut conn, "Alice");
    let mut client = common::individual(&mut conn, &pro, "Bruno");

    client.linked_professional_id = None;
    assert!(save_user(&mut conn, &client).is_err());

    let stored = get_user(&mut conn, client.id).unwrap().unwrap();
    assert_eq!(stored.linked_professional_id, Some(pro.id));
}
