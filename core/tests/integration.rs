//! Client operations and the full scenario suite against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port in a background
//! thread, then drives it over real HTTP through `PetFriends` and the
//! default ureq transport.

use std::future::Future;
use std::io::{Read, Write};
use std::path::PathBuf;

use petfriends_core::scenarios::{self, own_pet, Provision};
use petfriends_core::suite::select;
use petfriends_core::{
    run_suite, ApiResponse, Credentials, Fixtures, Outcome, PetFilter, PetFriends, ResponseBody, ScenarioError,
};
use petfriends_mock::{AppState, Quirks};

const EMAIL: &str = "kuzya@example.com";
const PASSWORD: &str = "meow";
const OTHER_EMAIL: &str = "neighbour@example.com";

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

struct Mock {
    base_url: String,
    state: AppState,
}

/// Start a mock with the test account and one pet owned by a neighbour.
fn start_mock(quirks: Quirks) -> Mock {
    let state = AppState::new(quirks);
    block_on(async {
        state.add_account(EMAIL, PASSWORD).await;
        state.add_account(OTHER_EMAIL, "woof").await;
        state.seed_pet(OTHER_EMAIL, "Шарик", "Пёс", "4").await.unwrap();
    });

    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let server_state = state.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            petfriends_mock::run(listener, server_state).await
        })
        .unwrap();
    });

    Mock {
        base_url: format!("http://{addr}"),
        state,
    }
}

fn fixtures() -> Fixtures {
    Fixtures {
        valid: Credentials::new(EMAIL, PASSWORD),
        invalid: Credentials::new("nobody@example.com", "wrong"),
        invalid_auth_key: "invalid-auth-key".to_string(),
        images_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../images")),
    }
}

fn own_pet_count(api: &PetFriends, key: &str) -> usize {
    api.get_list_of_pets(key, PetFilter::MyPets).unwrap().pets().unwrap().len()
}

#[test]
fn operations_lifecycle() {
    let mock = start_mock(Quirks::default());
    let api = PetFriends::new(&mock.base_url);
    let fx = fixtures();

    // Step 1: authenticate.
    let resp = api.get_api_key(EMAIL, PASSWORD).unwrap();
    assert_eq!(resp.status, 200);
    let key = resp.api_key().unwrap().to_string();

    // Step 2: wrong credentials are a status, not an error.
    let resp = api.get_api_key(EMAIL, "wrong").unwrap();
    assert_eq!(resp.status, 403);
    assert!(matches!(resp.body, ResponseBody::Raw(_)));

    // Step 3: list everything; only the neighbour's pet so far.
    let resp = api.get_list_of_pets(&key, PetFilter::All).unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.pets().unwrap().len(), 1);
    assert_eq!(own_pet_count(&api, &key), 0);

    // Step 4: create with a photo.
    let resp = api
        .add_new_pet(&key, "Кузя", "Котяра", "10", &fx.image("kot2.jpeg"))
        .unwrap();
    assert_eq!(resp.status, 200);
    let with_photo = resp.pet().unwrap();
    assert_eq!(with_photo.name, "Кузя");
    assert!(with_photo.pet_photo.starts_with("data:image/jpeg;base64,"));

    // Step 5: a non-image photo is rejected by the strict mock.
    let resp = api
        .add_new_pet(&key, "Кузя", "Котяра", "10", &fx.image("file.xml"))
        .unwrap();
    assert_eq!(resp.status, 400);

    // Step 6: create without a photo.
    let resp = api.add_new_pet_no_photo(&key, "Барсик", "Кот", "2").unwrap();
    assert_eq!(resp.status, 200);
    let plain = resp.pet().unwrap();
    assert_eq!(plain.pet_photo, "");
    assert_eq!(own_pet_count(&api, &key), 2);

    // Step 7: attach a photo to the plain pet.
    let resp = api.add_photo_pet(&key, &plain.id, &fx.image("kot.jpg")).unwrap();
    assert_eq!(resp.status, 200);
    assert!(!resp.str_field("pet_photo").unwrap().is_empty());

    // Step 8: update it.
    let resp = api
        .update_pet_info(&key, &plain.id, "Рыжий серьёзен", "Кот", "9")
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.str_field("name"), Some("Рыжий серьёзен"));
    assert_eq!(resp.pet().unwrap().age, "9");

    // Step 9: delete it.
    let resp = api.delete_pet(&key, &plain.id).unwrap();
    assert_eq!(resp.status, 200);
    let mine = api
        .get_list_of_pets(&key, PetFilter::MyPets)
        .unwrap()
        .pets()
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, with_photo.id);

    // Step 10: an invalid key cannot list pets.
    let resp = api.get_list_of_pets("invalid-auth-key", PetFilter::All).unwrap();
    assert_eq!(resp.status, 403);

    // Step 11: the neighbour's pet is untouched.
    assert_eq!(block_on(mock.state.pets()).len(), 2);
}

#[test]
fn suite_against_strict_service() {
    let mock = start_mock(Quirks::default());
    let api = PetFriends::new(&mock.base_url);
    let report = run_suite(&api, &fixtures(), scenarios::ALL);

    assert!(report.is_success(), "{report}");
    assert_eq!(report.passed(), 8);
    assert!(matches!(
        report.outcome("get_all_pets_with_invalid_key"),
        Some(Outcome::ExpectedFailure(ScenarioError::Assertion(_)))
    ));
    assert!(matches!(
        report.outcome("add_new_pet_with_invalid_data"),
        Some(Outcome::UnexpectedPass)
    ));
}

#[test]
fn suite_against_quirky_service() {
    let mock = start_mock(Quirks::all());
    let api = PetFriends::new(&mock.base_url);
    let report = run_suite(&api, &fixtures(), scenarios::ALL);

    assert!(report.is_success(), "{report}");
    assert_eq!(report.passed(), 8);
    assert!(matches!(
        report.outcome("get_all_pets_with_invalid_key"),
        Some(Outcome::UnexpectedPass)
    ));
    assert!(matches!(
        report.outcome("add_new_pet_with_invalid_data"),
        Some(Outcome::ExpectedFailure(_))
    ));
}

#[test]
fn delete_provisions_a_pet_when_none_owned() {
    let mock = start_mock(Quirks::default());
    let api = PetFriends::new(&mock.base_url);
    let only_delete = select(scenarios::ALL, &["delete_own_pet".to_string()]).unwrap();
    let report = run_suite(&api, &fixtures(), &only_delete);

    assert!(matches!(report.outcome("delete_own_pet"), Some(Outcome::Passed)), "{report}");
    // The provisioned pet is gone again; only the neighbour's remains.
    let pets = block_on(mock.state.pets());
    assert_eq!(pets.len(), 1);
    assert_eq!(pets[0].name, "Шарик");
}

#[test]
fn update_and_photo_fail_without_owned_pets() {
    let mock = start_mock(Quirks::default());
    let api = PetFriends::new(&mock.base_url);
    let picked = select(
        scenarios::ALL,
        &["update_own_pet_info".to_string(), "add_photo_to_own_pet".to_string()],
    )
    .unwrap();
    let report = run_suite(&api, &fixtures(), &picked);

    assert_eq!(report.failed(), 2);
    assert!(matches!(
        report.outcome("update_own_pet_info"),
        Some(Outcome::Failed(ScenarioError::NoOwnPets))
    ));
    assert!(matches!(
        report.outcome("add_photo_to_own_pet"),
        Some(Outcome::Failed(ScenarioError::NoOwnPets))
    ));
}

#[test]
fn own_pet_reuses_existing_pet() {
    let mock = start_mock(Quirks::default());
    let api = PetFriends::new(&mock.base_url);
    let fx = fixtures();
    let key = scenarios::auth_key(&api, &fx).unwrap();

    let first = own_pet(&api, &fx, &key, Provision::IfEmpty).unwrap();
    assert!(first.provisioned);
    let second = own_pet(&api, &fx, &key, Provision::Never).unwrap();
    assert!(!second.provisioned);
    assert_eq!(second.id(), first.id());
}

#[test]
fn unreachable_service_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let api = PetFriends::new(&format!("http://{addr}"));
    let err = api.get_api_key(EMAIL, PASSWORD).unwrap_err();
    assert!(matches!(err, petfriends_core::ApiError::Transport(_)));
}

/// Answer every connection with the same raw HTTP response bytes.
fn serve_raw(response: Vec<u8>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(&response);
        }
    });
    format!("http://{addr}")
}

/// A 403 page in a single-byte Cyrillic charset, which is not valid UTF-8.
fn cp1251_forbidden() -> Vec<u8> {
    let body: &[u8] = &[0xC0, 0xFF, 0xFE, b'!'];
    let mut response = format!(
        "HTTP/1.1 403 Forbidden\r\nContent-Type: text/html; charset=windows-1251\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

#[test]
fn non_utf8_failure_body_keeps_its_status() {
    let api = PetFriends::new(&serve_raw(cp1251_forbidden()));

    let resp: ApiResponse = api.get_api_key("nobody@example.com", "wrong").unwrap();
    assert_eq!(resp.status, 403);
    match &resp.body {
        ResponseBody::Raw(text) => {
            assert!(text.ends_with('!'));
            assert!(text.contains('\u{FFFD}'));
        }
        other => panic!("expected raw body, got {other:?}"),
    }
}

#[test]
fn invalid_user_scenario_passes_on_non_utf8_forbidden_page() {
    let api = PetFriends::new(&serve_raw(cp1251_forbidden()));
    let picked = select(scenarios::ALL, &["get_api_key_for_invalid_user".to_string()]).unwrap();
    let report = run_suite(&api, &fixtures(), &picked);

    assert!(
        matches!(report.outcome("get_api_key_for_invalid_user"), Some(Outcome::Passed)),
        "{report}"
    );
}
