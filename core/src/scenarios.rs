//! The PetFriends scenario suite.
//!
//! Each scenario obtains its own auth key, performs one or more calls and
//! checks statuses and body fields. `ALL` lists them in run order; deletion
//! runs last so earlier scenarios still find an owned pet.

use tracing::debug;

use crate::api::PetFriends;
use crate::config::Fixtures;
use crate::error::ScenarioError;
use crate::response::ApiResponse;
use crate::suite::{Expectation, Scenario};
use crate::types::{Pet, PetFilter};

const NAME: &str = "Кузя";
const ANIMAL_TYPE: &str = "Котяра";
const AGE: &str = "10";

pub const VALID_PHOTO: &str = "kot2.jpeg";
pub const EXTRA_PHOTO: &str = "kot.jpg";
pub const NOT_A_PHOTO: &str = "file.xml";

pub const ALL: &[Scenario] = &[
    Scenario {
        name: "get_api_key_for_valid_user",
        expectation: Expectation::Pass,
        run: get_api_key_for_valid_user,
    },
    Scenario {
        name: "get_api_key_for_invalid_user",
        expectation: Expectation::Pass,
        run: get_api_key_for_invalid_user,
    },
    Scenario {
        name: "get_all_pets_with_valid_key",
        expectation: Expectation::Pass,
        run: get_all_pets_with_valid_key,
    },
    Scenario {
        name: "get_all_pets_with_invalid_key",
        expectation: Expectation::Fail {
            reason: "asserts that an invalid key still lists pets",
        },
        run: get_all_pets_with_invalid_key,
    },
    Scenario {
        name: "add_new_pet_with_valid_data",
        expectation: Expectation::Pass,
        run: add_new_pet_with_valid_data,
    },
    Scenario {
        name: "add_new_pet_with_invalid_data",
        expectation: Expectation::Fail {
            reason: "the service is known to accept non-image photos",
        },
        run: add_new_pet_with_invalid_data,
    },
    Scenario {
        name: "add_new_pet_without_photo",
        expectation: Expectation::Pass,
        run: add_new_pet_without_photo,
    },
    Scenario {
        name: "add_photo_to_own_pet",
        expectation: Expectation::Pass,
        run: add_photo_to_own_pet,
    },
    Scenario {
        name: "update_own_pet_info",
        expectation: Expectation::Pass,
        run: update_own_pet_info,
    },
    Scenario {
        name: "delete_own_pet",
        expectation: Expectation::Pass,
        run: delete_own_pet,
    },
];

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// What `own_pet` does when the account owns no pets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
    /// Create a pet with a photo, then list again.
    IfEmpty,
    /// Fail with `ScenarioError::NoOwnPets`.
    Never,
}

/// A pet the authenticated account is known to own.
#[derive(Debug, Clone)]
pub struct OwnedPet {
    pub pet: Pet,
    /// True when `own_pet` had to create it.
    pub provisioned: bool,
}

impl OwnedPet {
    pub fn id(&self) -> &str {
        &self.pet.id
    }
}

/// Authenticate with the valid credentials and return the key.
pub fn auth_key(api: &PetFriends, fixtures: &Fixtures) -> Result<String, ScenarioError> {
    let resp = api.get_api_key(&fixtures.valid.email, &fixtures.valid.password)?;
    expect_status(&resp, 200)?;
    Ok(resp.api_key()?.to_string())
}

/// First pet in `my_pets`, created first when the list is empty and
/// `provision` allows it.
pub fn own_pet(
    api: &PetFriends,
    fixtures: &Fixtures,
    auth_key: &str,
    provision: Provision,
) -> Result<OwnedPet, ScenarioError> {
    if let Some(pet) = my_pets(api, auth_key)?.into_iter().next() {
        return Ok(OwnedPet {
            pet,
            provisioned: false,
        });
    }
    if provision == Provision::Never {
        return Err(ScenarioError::NoOwnPets);
    }

    debug!("no own pets, creating one");
    let created = api.add_new_pet(auth_key, NAME, "Кот", AGE, &fixtures.image(VALID_PHOTO))?;
    expect_status(&created, 200)?;
    let pet = my_pets(api, auth_key)?
        .into_iter()
        .next()
        .ok_or(ScenarioError::NoOwnPets)?;
    Ok(OwnedPet {
        pet,
        provisioned: true,
    })
}

fn my_pets(api: &PetFriends, auth_key: &str) -> Result<Vec<Pet>, ScenarioError> {
    let resp = api.get_list_of_pets(auth_key, PetFilter::MyPets)?;
    expect_status(&resp, 200)?;
    Ok(resp.pets()?)
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn expect_status(resp: &ApiResponse, expected: u16) -> Result<(), ScenarioError> {
    if resp.status == expected {
        return Ok(());
    }
    Err(ScenarioError::Assertion(format!(
        "expected status {expected}, got {}",
        resp.status
    )))
}

fn expect_name(resp: &ApiResponse, expected: &str) -> Result<(), ScenarioError> {
    match resp.str_field("name") {
        Some(name) if name == expected => Ok(()),
        other => Err(ScenarioError::Assertion(format!(
            "expected name {expected:?}, got {other:?}"
        ))),
    }
}

fn expect(condition: bool, message: &str) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(message.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

fn get_api_key_for_valid_user(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let resp = api.get_api_key(&fixtures.valid.email, &fixtures.valid.password)?;
    expect_status(&resp, 200)?;
    expect(
        resp.str_field("key").is_some_and(|key| !key.is_empty()),
        "response has no non-empty `key`",
    )
}

fn get_api_key_for_invalid_user(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let resp = api.get_api_key(&fixtures.invalid.email, &fixtures.invalid.password)?;
    expect_status(&resp, 403)
}

fn get_all_pets_with_valid_key(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let key = auth_key(api, fixtures)?;
    let resp = api.get_list_of_pets(&key, PetFilter::All)?;
    expect_status(&resp, 200)?;
    expect(!resp.pets()?.is_empty(), "pet list is empty")
}

// Kept to document that the service has been seen to list pets for an
// invalid key; a service that rejects the key fails this as expected.
fn get_all_pets_with_invalid_key(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let resp = api.get_list_of_pets(&fixtures.invalid_auth_key, PetFilter::All)?;
    expect_status(&resp, 200)?;
    expect(!resp.pets()?.is_empty(), "pet list is empty")
}

fn add_new_pet_with_valid_data(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let key = auth_key(api, fixtures)?;
    let resp = api.add_new_pet(&key, NAME, ANIMAL_TYPE, AGE, &fixtures.image(VALID_PHOTO))?;
    expect_status(&resp, 200)?;
    expect_name(&resp, NAME)
}

fn add_new_pet_with_invalid_data(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let key = auth_key(api, fixtures)?;
    let resp = api.add_new_pet(&key, NAME, ANIMAL_TYPE, AGE, &fixtures.image(NOT_A_PHOTO))?;
    expect_status(&resp, 400)
}

fn add_new_pet_without_photo(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let key = auth_key(api, fixtures)?;
    let resp = api.add_new_pet_no_photo(&key, NAME, "Кот", AGE)?;
    expect_status(&resp, 200)?;
    expect_name(&resp, NAME)
}

fn add_photo_to_own_pet(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let key = auth_key(api, fixtures)?;
    let target = own_pet(api, fixtures, &key, Provision::Never)?;
    let resp = api.add_photo_pet(&key, target.id(), &fixtures.image(EXTRA_PHOTO))?;
    expect_status(&resp, 200)?;
    expect(
        resp.str_field("pet_photo").is_some_and(|photo| !photo.is_empty()),
        "response has no populated `pet_photo`",
    )
}

fn update_own_pet_info(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let name = "Рыжий серьёзен";
    let key = auth_key(api, fixtures)?;
    let target = own_pet(api, fixtures, &key, Provision::Never)?;
    let resp = api.update_pet_info(&key, target.id(), name, "Кот", "9")?;
    expect_status(&resp, 200)?;
    expect_name(&resp, name)
}

fn delete_own_pet(api: &PetFriends, fixtures: &Fixtures) -> Result<(), ScenarioError> {
    let key = auth_key(api, fixtures)?;
    let target = own_pet(api, fixtures, &key, Provision::IfEmpty)?;
    let resp = api.delete_pet(&key, target.id())?;
    let remaining = my_pets(api, &key)?;

    expect_status(&resp, 200)?;
    expect(
        remaining.iter().all(|pet| pet.id != target.id()),
        "deleted pet is still listed in my_pets",
    )
}
