//! Session configuration strictness by build mode.

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use std::collections::HashMap;
use tempfile::NamedTempFile;

struct KeyFile {
    file: NamedTempFile,
}

impl KeyFile {
    fn with_len(len: usize) -> Self {
        let file = NamedTempFile::new().expect("create key file");
        std::fs::write(file.path(), vec![b'k'; len]).expect("write key file");
        Self { file }
    }

    fn path(&self) -> String {
        self.file.path().to_string_lossy().into_owned()
    }
}

#[fixture]
fn key_file() -> KeyFile {
    KeyFile::with_len(SESSION_KEY_MIN_LEN)
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key_path: String) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_path),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn release_error(vars: HashMap<&'static str, String>) -> SessionConfigError {
    match session_settings_from_env(&mock_env(vars), BuildMode::Release) {
        Ok(_) => panic!("release configuration should have been rejected"),
        Err(error) => error,
    }
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(key_file: KeyFile, #[case] missing: &'static str) {
    let mut vars = release_vars(key_file.path());
    vars.remove(missing);

    let err = release_error(vars);
    assert!(
        matches!(err, SessionConfigError::MissingEnv { name } if name == missing),
        "unexpected error: {err}"
    );
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(ALLOW_EPHEMERAL_ENV, "")]
#[case(SAMESITE_ENV, "sometimes")]
fn release_rejects_unparseable_toggles(
    key_file: KeyFile,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(key_file.path());
    vars.insert(name, value.to_owned());

    let err = release_error(vars);
    assert!(
        matches!(err, SessionConfigError::InvalidEnv { name: got, .. } if got == name),
        "unexpected error: {err}"
    );
}

#[rstest]
fn release_rejects_ephemeral_keys(key_file: KeyFile) {
    let mut vars = release_vars(key_file.path());
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());
    assert!(matches!(
        release_error(vars),
        SessionConfigError::EphemeralNotAllowed
    ));
}

#[rstest]
fn release_rejects_missing_key_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let absent = dir.path().join("absent").to_string_lossy().into_owned();
    assert!(matches!(
        release_error(release_vars(absent)),
        SessionConfigError::KeyRead { .. }
    ));
}

#[rstest]
fn release_rejects_short_key() {
    let short = KeyFile::with_len(SESSION_KEY_MIN_LEN - 1);
    let err = release_error(release_vars(short.path()));
    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort { length, .. } if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn release_rejects_insecure_same_site_none(key_file: KeyFile) {
    let mut vars = release_vars(key_file.path());
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    assert!(matches!(
        release_error(vars),
        SessionConfigError::InsecureSameSiteNone
    ));
}

#[rstest]
fn release_accepts_complete_configuration(key_file: KeyFile) {
    let settings = session_settings_from_env(&mock_env(release_vars(key_file.path())), BuildMode::Release)
        .expect("valid release settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
fn same_key_file_yields_same_key(key_file: KeyFile) {
    let env = mock_env(release_vars(key_file.path()));
    let first = session_settings_from_env(&env, BuildMode::Release).expect("settings");
    let second = session_settings_from_env(&env, BuildMode::Release).expect("settings");
    assert_eq!(
        fingerprint::key_fingerprint(&first.key),
        fingerprint::key_fingerprint(&second.key)
    );
}

#[rstest]
fn debug_falls_back_to_lenient_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let absent = dir.path().join("absent").to_string_lossy().into_owned();
    let env = mock_env(HashMap::from([(KEY_FILE_ENV, absent)]));

    let settings =
        session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults succeed");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_invalid_same_site_uses_default(key_file: KeyFile) {
    let mut vars = release_vars(key_file.path());
    vars.insert(SAMESITE_ENV, "unexpected".to_owned());

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug fallback");
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[actix_web::test]
async fn middleware_sets_named_http_only_cookie() {
    use actix_session::SessionExt;
    use actix_web::{App, HttpRequest, HttpResponse, test as actix_test, web};

    let settings = SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    };
    let app = actix_test::init_service(
        App::new()
            .wrap(settings.middleware(chrono::TimeDelta::minutes(30)))
            .route(
                "/",
                web::get().to(|req: HttpRequest| async move {
                    req.get_session()
                        .insert("visited", 1)
                        .map_err(actix_web::error::ErrorInternalServerError)?;
                    Ok::<_, actix_web::Error>(HttpResponse::Ok().finish())
                }),
            ),
    )
    .await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().to_request()).await;
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("session cookie set");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert!(cookie.max_age().is_some());
}
