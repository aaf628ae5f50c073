//! Tests for the principal identity model.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn principal() -> Principal {
    Principal::new(
        UserId::new(VALID_ID).expect("valid id"),
        Role::Admin,
        DisplayName::new("Somchai Jaidee").expect("valid name"),
        EmailAddress::new("Somchai@Example.org").expect("valid email"),
        None,
    )
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw), Err(expected));
}

#[rstest]
fn user_id_from_uuid_round_trips_display() {
    let uuid = Uuid::parse_str(VALID_ID).expect("uuid");
    let id = UserId::from_uuid(uuid);
    assert_eq!(id.to_string(), VALID_ID);
    assert_eq!(id.as_uuid(), &uuid);
}

#[rstest]
#[case("Ada Lovelace")]
#[case("สมชาย ใจดี")]
#[case("O'Neil-Smith")]
fn display_name_accepts_multilingual_names(#[case] raw: &str) {
    let name = DisplayName::new(raw).expect("valid display name");
    assert_eq!(name.as_ref(), raw);
}

#[rstest]
#[case("   ", UserValidationError::EmptyDisplayName)]
#[case("a", UserValidationError::DisplayNameTooShort { min: DISPLAY_NAME_MIN })]
#[case("bad$char", UserValidationError::DisplayNameInvalidCharacters)]
fn display_name_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(DisplayName::new(raw), Err(expected));
}

#[rstest]
fn display_name_rejects_overlong_input() {
    let raw = "a".repeat(DISPLAY_NAME_MAX + 1);
    assert_eq!(
        DisplayName::new(raw),
        Err(UserValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX
        })
    );
}

#[rstest]
fn email_is_trimmed_and_lowercased() {
    let email = EmailAddress::new("  Reporter@City.GO.th ").expect("valid email");
    assert_eq!(email.as_ref(), "reporter@city.go.th");
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("no-at-sign", UserValidationError::InvalidEmail)]
#[case("two@@example.org", UserValidationError::InvalidEmail)]
fn email_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(EmailAddress::new(raw), Err(expected));
}

#[rstest]
#[case("reporter", Role::Reporter)]
#[case("admin", Role::Admin)]
fn role_parses_known_values(#[case] raw: &str, #[case] expected: Role) {
    assert_eq!(raw.parse::<Role>(), Ok(expected));
    assert_eq!(expected.to_string(), raw);
}

#[rstest]
fn role_rejects_unknown_values() {
    assert_eq!("superuser".parse::<Role>(), Err(UserValidationError::UnknownRole));
}

#[rstest]
fn principal_serialises_camel_case(principal: Principal) {
    let value = serde_json::to_value(&principal).expect("serialises");
    assert_eq!(
        value,
        json!({
            "id": VALID_ID,
            "role": "admin",
            "displayName": "Somchai Jaidee",
            "email": "somchai@example.org",
        })
    );
    assert!(principal.is_admin());
}

#[rstest]
#[case("+66 2 123 4567")]
#[case("081-234-5678")]
#[case("02 (123) 4567")]
fn phone_accepts_common_formats(#[case] raw: &str) {
    assert_eq!(PhoneNumber::new(raw).expect("valid phone").as_ref(), raw);
}

#[rstest]
#[case("12345")]
#[case("call me")]
#[case("+66 2 123 4567 ext 9")]
#[case("1234567890123456")]
fn phone_rejects_malformed_input(#[case] raw: &str) {
    assert_eq!(PhoneNumber::new(raw), Err(UserValidationError::InvalidPhone));
}

#[rstest]
fn address_is_trimmed_and_bounded() {
    let address = PostalAddress::new("  12 Sukhumvit Rd, Bangkok ").expect("valid address");
    assert_eq!(address.as_ref(), "12 Sukhumvit Rd, Bangkok");
    assert_eq!(PostalAddress::new("  "), Err(UserValidationError::EmptyAddress));
    assert_eq!(
        PostalAddress::new("x".repeat(ADDRESS_MAX + 1)),
        Err(UserValidationError::AddressTooLong { max: ADDRESS_MAX })
    );
}

#[rstest]
fn principal_serialises_contact_details_when_present(principal: Principal) {
    let principal = principal.with_contact(ContactDetails {
        phone: Some(PhoneNumber::new("081-234-5678").expect("phone")),
        address: None,
    });
    let value = serde_json::to_value(&principal).expect("serialises");
    assert_eq!(value["phone"], "081-234-5678");
    assert!(value.get("address").is_none());
}
