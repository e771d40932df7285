//! `PetFriends`: the blocking API wrapper scenarios call.
//!
//! Each operation builds a request with `PetFriendsClient`, runs it through
//! a `Transport` and parses whatever came back. Non-2xx statuses are
//! returned in the `ApiResponse`; only transport and file errors are `Err`.

use std::path::Path;
use std::time::Instant;

use tracing::debug;

use crate::client::PetFriendsClient;
use crate::config::Settings;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::response::ApiResponse;
use crate::transport::{Transport, UreqTransport};
use crate::types::{PetFields, PetFilter, PhotoUpload};

pub struct PetFriends {
    client: PetFriendsClient,
    transport: Box<dyn Transport>,
}

impl PetFriends {
    /// Wrapper over the default blocking transport.
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(base_url, UreqTransport::default())
    }

    /// Wrapper configured with the base URL, timeout and body limit of `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_transport(
            &settings.base_url,
            UreqTransport::new(settings.timeout, settings.max_body_bytes),
        )
    }

    pub fn with_transport(base_url: &str, transport: impl Transport + 'static) -> Self {
        Self {
            client: PetFriendsClient::new(base_url),
            transport: Box::new(transport),
        }
    }

    pub fn client(&self) -> &PetFriendsClient {
        &self.client
    }

    /// Exchange credentials for an auth key (`key` field on success, 403 otherwise).
    pub fn get_api_key(&self, email: &str, password: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_get_api_key(email, password))
    }

    pub fn get_list_of_pets(&self, auth_key: &str, filter: PetFilter) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_get_list_of_pets(auth_key, filter))
    }

    /// Create a pet with a photo read from `photo_path`.
    pub fn add_new_pet(
        &self,
        auth_key: &str,
        name: &str,
        animal_type: &str,
        age: &str,
        photo_path: &Path,
    ) -> Result<ApiResponse, ApiError> {
        let photo = PhotoUpload::from_path(photo_path)?;
        let fields = PetFields::new(name, animal_type, age);
        self.send(self.client.build_add_new_pet(auth_key, &fields, &photo))
    }

    pub fn add_new_pet_no_photo(
        &self,
        auth_key: &str,
        name: &str,
        animal_type: &str,
        age: &str,
    ) -> Result<ApiResponse, ApiError> {
        let fields = PetFields::new(name, animal_type, age);
        self.send(self.client.build_add_new_pet_no_photo(auth_key, &fields))
    }

    /// Attach or replace the photo of a pet the caller owns.
    pub fn add_photo_pet(&self, auth_key: &str, pet_id: &str, photo_path: &Path) -> Result<ApiResponse, ApiError> {
        let photo = PhotoUpload::from_path(photo_path)?;
        self.send(self.client.build_add_photo_pet(auth_key, pet_id, &photo))
    }

    /// Overwrite name, type and age of a pet the caller owns.
    pub fn update_pet_info(
        &self,
        auth_key: &str,
        pet_id: &str,
        name: &str,
        animal_type: &str,
        age: &str,
    ) -> Result<ApiResponse, ApiError> {
        let fields = PetFields::new(name, animal_type, age);
        self.send(self.client.build_update_pet_info(auth_key, pet_id, &fields))
    }

    pub fn delete_pet(&self, auth_key: &str, pet_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_delete_pet(auth_key, pet_id))
    }

    fn send(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method;
        let url = request.url.clone();
        let started = Instant::now();
        debug!(%method, %url, "sending request");

        let response = self.transport.execute(request)?;
        debug!(
            %method,
            %url,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );
        Ok(self.client.parse_response(response))
    }
}
