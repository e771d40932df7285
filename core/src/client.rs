//! Stateless HTTP request builder and response parser for the PetFriends API.
//!
//! # Design
//! `PetFriendsClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint has a `build_*` method that produces an
//! `HttpRequest`; every response goes through the single `parse_response`,
//! which never fails: a 4xx is returned as data for the caller to assert on.

use url::{form_urlencoded, Url};

use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
use crate::response::{ApiResponse, ResponseBody};
use crate::types::{PetFields, PetFilter, PhotoUpload};

/// Header carrying the auth key on every authenticated call.
pub const AUTH_HEADER: &str = "auth_key";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous, stateless request builder for the PetFriends API.
#[derive(Debug, Clone)]
pub struct PetFriendsClient {
    base_url: String,
}

impl PetFriendsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/key` with the credentials passed as headers.
    pub fn build_get_api_key(&self, email: &str, password: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/api/key", self.base_url),
            headers: vec![
                ("email".to_string(), email.to_string()),
                ("password".to_string(), password.to_string()),
            ],
            body: None,
        }
    }

    pub fn build_get_list_of_pets(&self, auth_key: &str, filter: PetFilter) -> HttpRequest {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("filter", filter.as_str())
            .finish();
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/api/pets?{query}", self.base_url),
            headers: vec![auth(auth_key)],
            body: None,
        }
    }

    /// `POST /api/pets` as multipart with the photo attached.
    pub fn build_add_new_pet(
        &self,
        auth_key: &str,
        fields: &PetFields,
        photo: &PhotoUpload,
    ) -> HttpRequest {
        let form = fields
            .pairs()
            .into_iter()
            .fold(MultipartForm::default(), |form, (name, value)| form.text(name, value))
            .file("pet_photo", photo.clone());
        self.multipart(HttpMethod::Post, format!("{}/api/pets", self.base_url), auth_key, form)
    }

    pub fn build_add_new_pet_no_photo(&self, auth_key: &str, fields: &PetFields) -> HttpRequest {
        self.form(
            HttpMethod::Post,
            format!("{}/api/create_pet_simple", self.base_url),
            auth_key,
            fields,
        )
    }

    pub fn build_add_photo_pet(&self, auth_key: &str, pet_id: &str, photo: &PhotoUpload) -> HttpRequest {
        let form = MultipartForm::default().file("pet_photo", photo.clone());
        self.multipart(
            HttpMethod::Post,
            self.pet_url(&["api", "pets", "set_photo"], pet_id),
            auth_key,
            form,
        )
    }

    pub fn build_update_pet_info(&self, auth_key: &str, pet_id: &str, fields: &PetFields) -> HttpRequest {
        self.form(
            HttpMethod::Put,
            self.pet_url(&["api", "pets"], pet_id),
            auth_key,
            fields,
        )
    }

    pub fn build_delete_pet(&self, auth_key: &str, pet_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.pet_url(&["api", "pets"], pet_id),
            headers: vec![auth(auth_key)],
            body: None,
        }
    }

    /// Turn any response into an `ApiResponse`, parsing the body as JSON
    /// when it is JSON and keeping it raw otherwise.
    pub fn parse_response(&self, response: HttpResponse) -> ApiResponse {
        let body = match serde_json::from_str(&response.body) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(response.body),
        };
        ApiResponse {
            status: response.status,
            body,
        }
    }

    fn form(&self, method: HttpMethod, url: String, auth_key: &str, fields: &PetFields) -> HttpRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.pairs())
            .finish();
        HttpRequest {
            method,
            url,
            headers: vec![
                auth(auth_key),
                ("content-type".to_string(), FORM_CONTENT_TYPE.to_string()),
            ],
            body: Some(RequestBody::Bytes(body.into_bytes())),
        }
    }

    /// The transport sets `content-type` when it encodes the form.
    fn multipart(&self, method: HttpMethod, url: String, auth_key: &str, form: MultipartForm) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![auth(auth_key)],
            body: Some(RequestBody::Multipart(form)),
        }
    }

    /// `base_url` followed by `segments` and the percent-encoded `pet_id`.
    fn pet_url(&self, segments: &[&str], pet_id: &str) -> String {
        let Ok(mut url) = Url::parse(&self.base_url) else {
            // Unusable base; the transport reports it when sending.
            return format!("{}/{}/{pet_id}", self.base_url, segments.join("/"));
        };
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments).push(pet_id);
        }
        url.into()
    }
}

fn auth(auth_key: &str) -> (String, String) {
    (AUTH_HEADER.to_string(), auth_key.to_string())
}
